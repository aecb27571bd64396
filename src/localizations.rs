use anyhow::{anyhow, bail, Result};
use clap::{Args, Subcommand};
use serde_json::{json, Map, Value};

use crate::{
    asc::Session,
    pagination::{self, PageArgs},
    util::spinner,
};

const CMD_BETA_APP_LIST: &str = "beta-app-localizations list";
const CMD_BETA_APP_CREATE: &str = "beta-app-localizations create";
const CMD_BETA_BUILD_LIST: &str = "beta-build-localizations list";
const CMD_BETA_BUILD_CREATE: &str = "beta-build-localizations create";
const CMD_BUILD_LOC_LIST: &str = "build-localizations list";

#[derive(Debug, Subcommand)]
pub enum BetaAppLocalizationsCommand {
    /// List beta app localizations
    List(BetaAppListArgs),
    /// Show one beta app localization
    Get(IdArgs),
    /// Create a beta app localization for an app
    Create(BetaAppCreateArgs),
    /// Update a beta app localization
    Update(BetaAppUpdateArgs),
    /// Delete a beta app localization
    Delete(IdArgs),
}

#[derive(Debug, Subcommand)]
pub enum BetaBuildLocalizationsCommand {
    /// List beta build localizations
    List(BetaBuildListArgs),
    /// Create a beta build localization for a build
    Create(BetaBuildCreateArgs),
    /// Update the what-to-test notes of a beta build localization
    Update(BetaBuildUpdateArgs),
    /// Delete a beta build localization
    Delete(IdArgs),
}

#[derive(Debug, Subcommand)]
pub enum BuildLocalizationsCommand {
    /// List the App Store version localizations behind a build
    List(BuildLocalizationsListArgs),
}

#[derive(Debug, Args)]
pub struct IdArgs {
    /// Localization ID
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct BetaAppListArgs {
    /// App ID to filter by
    #[arg(long)]
    pub app: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct BetaAppCreateArgs {
    /// App ID
    #[arg(long)]
    pub app: String,

    /// Locale, e.g. en-US
    #[arg(long)]
    pub locale: String,

    /// Beta app description shown to testers
    #[arg(long)]
    pub description: Option<String>,

    /// Feedback email address
    #[arg(long = "feedback-email")]
    pub feedback_email: Option<String>,

    /// Marketing URL
    #[arg(long = "marketing-url")]
    pub marketing_url: Option<String>,

    /// Privacy policy URL
    #[arg(long = "privacy-policy-url")]
    pub privacy_policy_url: Option<String>,
}

#[derive(Debug, Args)]
pub struct BetaAppUpdateArgs {
    /// Beta app localization ID
    #[arg(long)]
    pub id: String,

    /// Beta app description shown to testers
    #[arg(long)]
    pub description: Option<String>,

    /// Feedback email address
    #[arg(long = "feedback-email")]
    pub feedback_email: Option<String>,

    /// Marketing URL
    #[arg(long = "marketing-url")]
    pub marketing_url: Option<String>,

    /// Privacy policy URL
    #[arg(long = "privacy-policy-url")]
    pub privacy_policy_url: Option<String>,
}

#[derive(Debug, Args)]
pub struct BetaBuildListArgs {
    /// Build ID to scope the listing
    #[arg(long)]
    pub build: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct BetaBuildCreateArgs {
    /// Build ID
    #[arg(long)]
    pub build: String,

    /// Locale, e.g. en-US
    #[arg(long)]
    pub locale: String,

    /// What-to-test notes for this build
    #[arg(long = "whats-new")]
    pub whats_new: Option<String>,
}

#[derive(Debug, Args)]
pub struct BetaBuildUpdateArgs {
    /// Beta build localization ID
    #[arg(long)]
    pub id: String,

    /// What-to-test notes for this build
    #[arg(long = "whats-new")]
    pub whats_new: String,
}

#[derive(Debug, Args)]
pub struct BuildLocalizationsListArgs {
    /// Build ID whose App Store version is resolved first
    #[arg(long)]
    pub build: String,

    #[command(flatten)]
    pub page: PageArgs,
}

/// Locales travel verbatim into API attributes, so reject anything that is
/// not a plausible language tag before issuing a request.
pub fn validate_locale(locale: &str, command_path: &str) -> Result<()> {
    let mut segments = locale.split('-');
    let primary = segments.next().unwrap_or("");
    let primary_ok = (2..=3).contains(&primary.len())
        && primary.chars().all(|c| c.is_ascii_alphabetic());
    let rest_ok = segments.all(|s| {
        (2..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric())
    });
    if !primary_ok || !rest_ok {
        bail!("{command_path}: --locale must be a language tag such as en-US, got {locale:?}");
    }
    Ok(())
}

fn string_attrs(pairs: &[(&str, &Option<String>)]) -> Map<String, Value> {
    let mut attrs = Map::new();
    for (key, value) in pairs {
        if let Some(v) = value {
            attrs.insert((*key).to_string(), Value::String(v.clone()));
        }
    }
    attrs
}

pub async fn run_beta_app(
    session: &Session,
    command: BetaAppLocalizationsCommand,
) -> Result<()> {
    match command {
        BetaAppLocalizationsCommand::List(args) => {
            let default = match &args.app {
                Some(app) => format!("v1/betaAppLocalizations?filter[app]={app}"),
                None => "v1/betaAppLocalizations".to_string(),
            };
            pagination::run_list(session, CMD_BETA_APP_LIST, Some(default), &args.page).await
        }
        BetaAppLocalizationsCommand::Get(args) => {
            let v = session
                .client()
                .await?
                .get(&format!("v1/betaAppLocalizations/{}", args.id))
                .await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
        BetaAppLocalizationsCommand::Create(args) => {
            validate_locale(&args.locale, CMD_BETA_APP_CREATE)?;
            let mut attrs = string_attrs(&[
                ("description", &args.description),
                ("feedbackEmail", &args.feedback_email),
                ("marketingUrl", &args.marketing_url),
                ("privacyPolicyUrl", &args.privacy_policy_url),
            ]);
            attrs.insert("locale".to_string(), Value::String(args.locale.clone()));
            let body = json!({
                "data": {
                    "type": "betaAppLocalizations",
                    "attributes": attrs,
                    "relationships": {
                        "app": {"data": {"type": "apps", "id": args.app}}
                    }
                }
            });
            let v = session
                .client()
                .await?
                .post("v1/betaAppLocalizations", body)
                .await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
        BetaAppLocalizationsCommand::Update(args) => {
            let attrs = string_attrs(&[
                ("description", &args.description),
                ("feedbackEmail", &args.feedback_email),
                ("marketingUrl", &args.marketing_url),
                ("privacyPolicyUrl", &args.privacy_policy_url),
            ]);
            let body = json!({
                "data": {
                    "type": "betaAppLocalizations",
                    "id": args.id,
                    "attributes": attrs
                }
            });
            let v = session
                .client()
                .await?
                .patch(&format!("v1/betaAppLocalizations/{}", args.id), body)
                .await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
        BetaAppLocalizationsCommand::Delete(args) => {
            session
                .client()
                .await?
                .delete(&format!("v1/betaAppLocalizations/{}", args.id), None)
                .await?;
            println!("Deleted beta app localization {}", args.id);
            Ok(())
        }
    }
}

pub async fn run_beta_build(
    session: &Session,
    command: BetaBuildLocalizationsCommand,
) -> Result<()> {
    match command {
        BetaBuildLocalizationsCommand::List(args) => {
            let default = match &args.build {
                Some(build) => format!("v1/builds/{build}/betaBuildLocalizations"),
                None => "v1/betaBuildLocalizations".to_string(),
            };
            pagination::run_list(session, CMD_BETA_BUILD_LIST, Some(default), &args.page).await
        }
        BetaBuildLocalizationsCommand::Create(args) => {
            validate_locale(&args.locale, CMD_BETA_BUILD_CREATE)?;
            let mut attrs = string_attrs(&[("whatsNew", &args.whats_new)]);
            attrs.insert("locale".to_string(), Value::String(args.locale.clone()));
            let body = json!({
                "data": {
                    "type": "betaBuildLocalizations",
                    "attributes": attrs,
                    "relationships": {
                        "build": {"data": {"type": "builds", "id": args.build}}
                    }
                }
            });
            let v = session
                .client()
                .await?
                .post("v1/betaBuildLocalizations", body)
                .await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
        BetaBuildLocalizationsCommand::Update(args) => {
            let body = json!({
                "data": {
                    "type": "betaBuildLocalizations",
                    "id": args.id,
                    "attributes": {"whatsNew": args.whats_new}
                }
            });
            let v = session
                .client()
                .await?
                .patch(&format!("v1/betaBuildLocalizations/{}", args.id), body)
                .await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
        BetaBuildLocalizationsCommand::Delete(args) => {
            session
                .client()
                .await?
                .delete(&format!("v1/betaBuildLocalizations/{}", args.id), None)
                .await?;
            println!("Deleted beta build localization {}", args.id);
            Ok(())
        }
    }
}

pub async fn run_build_localizations(
    session: &Session,
    command: BuildLocalizationsCommand,
) -> Result<()> {
    match command {
        BuildLocalizationsCommand::List(args) => {
            // Reject a bad cursor before any request goes out.
            if let Some(next) = &args.page.next {
                pagination::validate_next_url(next, CMD_BUILD_LOC_LIST)?;
            }
            let client = session.client().await?;
            let pb = spinner("Resolving App Store version...");
            let resolved = client
                .get(&format!("v1/builds/{}/appStoreVersion", args.build))
                .await;
            pb.finish_and_clear();
            let version_id = resolved?
                .get("data")
                .and_then(|d| d.get("id"))
                .and_then(|s| s.as_str())
                .map(|s| s.to_string())
                .ok_or_else(|| {
                    anyhow!(
                        "{CMD_BUILD_LOC_LIST}: build {} has no App Store version",
                        args.build
                    )
                })?;
            pagination::run_list(
                session,
                CMD_BUILD_LOC_LIST,
                Some(format!(
                    "v1/appStoreVersions/{version_id}/appStoreVersionLocalizations"
                )),
                &args.page,
            )
            .await
        }
    }
}
