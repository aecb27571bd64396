use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{
    asc::Session,
    pagination::{self, PageArgs},
};

const CMD_GROUPS_LIST: &str = "testflight groups list";
const CMD_GROUPS_CREATE: &str = "testflight groups create";
const CMD_GROUPS_RELATIONSHIPS_LIST: &str = "testflight groups relationships list";
const CMD_GROUP_TESTERS_LIST: &str = "testflight groups testers list";
const CMD_RECRUITMENT_SET: &str = "testflight recruitment-criteria set";
const CMD_RECRUITMENT_OPTIONS_LIST: &str = "testflight recruitment-criteria options list";
const CMD_TESTER_USAGES: &str = "testflight tester-usages";

/// Device families accepted in recruitment criteria filters.
pub const DEVICE_FAMILIES: &[&str] = &[
    "IPHONE",
    "IPAD",
    "MAC",
    "APPLE_TV",
    "VISION",
    "APPLE_WATCH",
];

/// Sparse-field names accepted by the recruitment criterion options endpoint.
pub const RECRUITMENT_CRITERION_OPTION_FIELDS: &[&str] = &["deviceFamilyOsVersions"];

/// Reporting periods accepted by the beta tester usage metrics endpoint.
pub const TESTER_USAGE_PERIODS: &[&str] = &["P7D", "P30D", "P90D", "P365D"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    Single,
    List,
}

/// Relationships reachable under `v1/betaGroups/<id>/<name>`.
pub const GROUP_RELATIONSHIPS: &[(&str, RelationshipKind)] = &[
    ("app", RelationshipKind::Single),
    ("betaTesters", RelationshipKind::List),
    ("builds", RelationshipKind::List),
];

/// Relationship names sorted for help and error text.
pub fn relationship_names(kinds: &[(&str, RelationshipKind)]) -> Vec<String> {
    let mut names: Vec<String> = kinds.iter().map(|(name, _)| name.to_string()).collect();
    names.sort();
    names
}

fn group_relationship_kind(name: &str) -> Option<RelationshipKind> {
    GROUP_RELATIONSHIPS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, kind)| *kind)
}

#[derive(Debug, Subcommand)]
pub enum TestflightCommand {
    /// Beta groups and their testers
    Groups {
        #[command(subcommand)]
        command: GroupsCommand,
    },
    /// Beta recruitment criteria for public links
    RecruitmentCriteria {
        #[command(subcommand)]
        command: RecruitmentCriteriaCommand,
    },
    /// Beta tester usage metrics for a group
    TesterUsages(TesterUsagesArgs),
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List beta groups
    List(GroupsListArgs),
    /// Create a beta group
    Create(GroupCreateArgs),
    /// Update a beta group
    Update(GroupUpdateArgs),
    /// Delete a beta group
    Delete(GroupIdArgs),
    /// Testers of a beta group
    Testers {
        #[command(subcommand)]
        command: TestersCommand,
    },
    /// Related resources of a beta group
    Relationships {
        #[command(subcommand)]
        command: RelationshipsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum TestersCommand {
    /// List the testers of a group
    List(GroupScopedListArgs),
    /// Add a tester to a group
    Add(TesterArgs),
    /// Remove a tester from a group
    Remove(TesterArgs),
}

#[derive(Debug, Subcommand)]
pub enum RelationshipsCommand {
    /// List a named relationship of a group
    List(RelationshipListArgs),
}

#[derive(Debug, Subcommand)]
pub enum RecruitmentCriteriaCommand {
    /// Replace the device/OS recruitment criteria of a group
    Set(RecruitmentSetArgs),
    /// Available recruitment criterion options
    Options {
        #[command(subcommand)]
        command: RecruitmentOptionsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum RecruitmentOptionsCommand {
    /// List recruitment criterion options
    List(RecruitmentOptionsListArgs),
}

#[derive(Debug, Args)]
pub struct GroupsListArgs {
    /// App ID to filter by
    #[arg(long)]
    pub app: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct GroupIdArgs {
    /// Beta group ID
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct GroupCreateArgs {
    /// App ID
    #[arg(long)]
    pub app: String,

    /// Group name
    #[arg(long)]
    pub name: String,

    /// Enable the public invite link
    #[arg(long = "public-link-enabled")]
    pub public_link_enabled: bool,

    /// Cap on public link signups
    #[arg(long = "public-link-limit")]
    pub public_link_limit: Option<u32>,
}

#[derive(Debug, Args)]
pub struct GroupUpdateArgs {
    /// Beta group ID
    #[arg(long)]
    pub id: String,

    /// Group name
    #[arg(long)]
    pub name: Option<String>,

    /// Enable or disable the public invite link
    #[arg(long = "public-link-enabled")]
    pub public_link_enabled: Option<bool>,

    /// Cap on public link signups
    #[arg(long = "public-link-limit")]
    pub public_link_limit: Option<u32>,
}

#[derive(Debug, Args)]
pub struct GroupScopedListArgs {
    /// Beta group ID
    #[arg(long)]
    pub id: String,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct TesterArgs {
    /// Beta group ID
    #[arg(long)]
    pub id: String,

    /// Beta tester ID
    #[arg(long)]
    pub tester: String,
}

#[derive(Debug, Args)]
pub struct RelationshipListArgs {
    /// Beta group ID
    #[arg(long)]
    pub id: String,

    /// Relationship name, e.g. builds
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct RecruitmentSetArgs {
    /// Beta group ID
    #[arg(long)]
    pub group: String,

    /// Comma-separated FAMILY=version filters, e.g. IPHONE=26,IPAD=17..18
    #[arg(long = "device-family-os-versions")]
    pub device_family_os_versions: String,
}

#[derive(Debug, Args)]
pub struct RecruitmentOptionsListArgs {
    /// Comma-separated sparse fields to request
    #[arg(long)]
    pub fields: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct TesterUsagesArgs {
    /// Beta group ID
    #[arg(long)]
    pub group: String,

    /// Reporting period
    #[arg(long, default_value = "P30D")]
    pub period: String,

    #[command(flatten)]
    pub page: PageArgs,
}

/// One device family with a single OS version or an inclusive range.
#[derive(Debug, PartialEq)]
pub struct DeviceFamilyOsVersionFilter {
    pub family: String,
    pub minimum: String,
    pub maximum: Option<String>,
}

/// Parses `FAMILY=version[,...]` where version is `N` or `N..M`.
pub fn parse_device_family_os_version_filters(
    input: &str,
) -> Result<Vec<DeviceFamilyOsVersionFilter>> {
    let input = input.trim();
    if input.is_empty() {
        bail!("must not be empty");
    }
    let mut filters = Vec::new();
    for part in input.split(',') {
        let (family_raw, versions) = part
            .split_once('=')
            .ok_or_else(|| anyhow!("entry {part:?} must look like IPHONE=26 or IPAD=17..18"))?;
        let family = normalize_device_family(family_raw)?;
        if versions.is_empty() {
            bail!("entry {part:?} is missing an OS version");
        }
        let (minimum, maximum) = match versions.split_once("..") {
            Some((low, high)) => {
                if low.is_empty() || high.is_empty() {
                    bail!("entry {part:?} has an incomplete version range");
                }
                (low.to_string(), Some(high.to_string()))
            }
            None => (versions.to_string(), None),
        };
        validate_os_version(&minimum, part)?;
        if let Some(max) = &maximum {
            validate_os_version(max, part)?;
        }
        filters.push(DeviceFamilyOsVersionFilter {
            family,
            minimum,
            maximum,
        });
    }
    Ok(filters)
}

fn validate_os_version(version: &str, entry: &str) -> Result<()> {
    let ok = !version.starts_with('.')
        && !version.ends_with('.')
        && !version.contains("..")
        && version.chars().all(|c| c.is_ascii_digit() || c == '.');
    if !ok {
        bail!("entry {entry:?} has an invalid OS version {version:?}");
    }
    Ok(())
}

/// Uppercases and validates a device family name.
pub fn normalize_device_family(input: &str) -> Result<String> {
    let family = input.trim().to_ascii_uppercase();
    if !DEVICE_FAMILIES.contains(&family.as_str()) {
        bail!(
            "unknown device family {input:?} (expected one of {})",
            DEVICE_FAMILIES.join(", ")
        );
    }
    Ok(family)
}

/// Validates a comma list of recruitment criterion option fields,
/// de-duplicating while preserving order. Field names are case-sensitive.
pub fn normalize_recruitment_criterion_options_fields(input: &str) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for raw in input.split(',') {
        let field = raw.trim();
        if !RECRUITMENT_CRITERION_OPTION_FIELDS.contains(&field) {
            bail!(
                "unknown field {raw:?} (expected one of {})",
                RECRUITMENT_CRITERION_OPTION_FIELDS.join(", ")
            );
        }
        if !out.iter().any(|f| f == field) {
            out.push(field.to_string());
        }
    }
    Ok(out)
}

/// Validates a tester usage reporting period, uppercasing the input.
pub fn normalize_tester_usage_period(input: &str) -> Result<String> {
    let period = input.trim().to_ascii_uppercase();
    if !TESTER_USAGE_PERIODS.contains(&period.as_str()) {
        bail!(
            "must be one of {}",
            TESTER_USAGE_PERIODS.join(", ")
        );
    }
    Ok(period)
}

#[derive(Debug, Default, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub next: String,
}

/// One page of the beta tester usage metrics endpoint.
#[derive(Debug, Deserialize)]
pub struct TesterUsagesPage {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub links: PageLinks,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

pub fn parse_tester_usages_page(raw: &[u8]) -> Result<TesterUsagesPage> {
    if raw.is_empty() {
        bail!("empty metrics payload");
    }
    serde_json::from_slice(raw).context("invalid metrics payload")
}

pub async fn run(session: &Session, command: TestflightCommand) -> Result<()> {
    match command {
        TestflightCommand::Groups { command } => run_groups(session, command).await,
        TestflightCommand::RecruitmentCriteria { command } => {
            run_recruitment(session, command).await
        }
        TestflightCommand::TesterUsages(args) => tester_usages(session, args).await,
    }
}

async fn run_groups(session: &Session, command: GroupsCommand) -> Result<()> {
    match command {
        GroupsCommand::List(args) => {
            let default = match &args.app {
                Some(app) => format!("v1/betaGroups?filter[app]={app}"),
                None => "v1/betaGroups".to_string(),
            };
            pagination::run_list(session, CMD_GROUPS_LIST, Some(default), &args.page).await
        }
        GroupsCommand::Create(args) => {
            if args.name.trim().is_empty() {
                bail!("{CMD_GROUPS_CREATE}: --name must not be empty");
            }
            let mut attrs = Map::new();
            attrs.insert("name".to_string(), Value::String(args.name.clone()));
            attrs.insert(
                "publicLinkEnabled".to_string(),
                Value::Bool(args.public_link_enabled),
            );
            if let Some(limit) = args.public_link_limit {
                attrs.insert("publicLinkLimit".to_string(), json!(limit));
                attrs.insert("publicLinkLimitEnabled".to_string(), Value::Bool(true));
            }
            let body = json!({
                "data": {
                    "type": "betaGroups",
                    "attributes": attrs,
                    "relationships": {
                        "app": {"data": {"type": "apps", "id": args.app}}
                    }
                }
            });
            let v = session.client().await?.post("v1/betaGroups", body).await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
        GroupsCommand::Update(args) => {
            let mut attrs = Map::new();
            if let Some(name) = &args.name {
                attrs.insert("name".to_string(), Value::String(name.clone()));
            }
            if let Some(enabled) = args.public_link_enabled {
                attrs.insert("publicLinkEnabled".to_string(), Value::Bool(enabled));
            }
            if let Some(limit) = args.public_link_limit {
                attrs.insert("publicLinkLimit".to_string(), json!(limit));
                attrs.insert("publicLinkLimitEnabled".to_string(), Value::Bool(true));
            }
            let body = json!({
                "data": {
                    "type": "betaGroups",
                    "id": args.id,
                    "attributes": attrs
                }
            });
            let v = session
                .client()
                .await?
                .patch(&format!("v1/betaGroups/{}", args.id), body)
                .await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
        GroupsCommand::Delete(args) => {
            session
                .client()
                .await?
                .delete(&format!("v1/betaGroups/{}", args.id), None)
                .await?;
            println!("Deleted beta group {}", args.id);
            Ok(())
        }
        GroupsCommand::Testers { command } => run_testers(session, command).await,
        GroupsCommand::Relationships {
            command: RelationshipsCommand::List(args),
        } => {
            let Some(kind) = group_relationship_kind(&args.name) else {
                bail!(
                    "{CMD_GROUPS_RELATIONSHIPS_LIST}: --name must be one of {}",
                    relationship_names(GROUP_RELATIONSHIPS).join(", ")
                );
            };
            let path = format!("v1/betaGroups/{}/{}", args.id, args.name);
            match kind {
                RelationshipKind::List => {
                    pagination::run_list(
                        session,
                        CMD_GROUPS_RELATIONSHIPS_LIST,
                        Some(path),
                        &args.page,
                    )
                    .await
                }
                RelationshipKind::Single => {
                    let v = session.client().await?.get(&path).await?;
                    println!("{}", serde_json::to_string_pretty(&v)?);
                    Ok(())
                }
            }
        }
    }
}

async fn run_testers(session: &Session, command: TestersCommand) -> Result<()> {
    match command {
        TestersCommand::List(args) => {
            pagination::run_list(
                session,
                CMD_GROUP_TESTERS_LIST,
                Some(format!("v1/betaGroups/{}/betaTesters", args.id)),
                &args.page,
            )
            .await
        }
        TestersCommand::Add(args) => {
            let body = json!({"data": [{"type": "betaTesters", "id": args.tester}]});
            session
                .client()
                .await?
                .post(
                    &format!("v1/betaGroups/{}/relationships/betaTesters", args.id),
                    body,
                )
                .await?;
            println!("Added tester {} to group {}", args.tester, args.id);
            Ok(())
        }
        TestersCommand::Remove(args) => {
            let body = json!({"data": [{"type": "betaTesters", "id": args.tester}]});
            session
                .client()
                .await?
                .delete(
                    &format!("v1/betaGroups/{}/relationships/betaTesters", args.id),
                    Some(body),
                )
                .await?;
            println!("Removed tester {} from group {}", args.tester, args.id);
            Ok(())
        }
    }
}

async fn run_recruitment(session: &Session, command: RecruitmentCriteriaCommand) -> Result<()> {
    match command {
        RecruitmentCriteriaCommand::Set(args) => {
            let filters = parse_device_family_os_version_filters(&args.device_family_os_versions)
                .map_err(|e| anyhow!("{CMD_RECRUITMENT_SET}: --device-family-os-versions {e}"))?;
            let filter_values: Vec<Value> = filters
                .iter()
                .map(|f| {
                    json!({
                        "deviceFamily": f.family,
                        "minimumOsInclusive": f.minimum,
                        "maximumOsInclusive": f.maximum
                    })
                })
                .collect();
            let body = json!({
                "data": {
                    "type": "betaRecruitmentCriteria",
                    "attributes": {"deviceFamilyOsVersionFilters": filter_values},
                    "relationships": {
                        "betaGroup": {"data": {"type": "betaGroups", "id": args.group}}
                    }
                }
            });
            let v = session
                .client()
                .await?
                .post("v1/betaRecruitmentCriteria", body)
                .await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
        RecruitmentCriteriaCommand::Options {
            command: RecruitmentOptionsCommand::List(args),
        } => {
            let default = match &args.fields {
                Some(fields) => {
                    let fields = normalize_recruitment_criterion_options_fields(fields)
                        .map_err(|e| anyhow!("{CMD_RECRUITMENT_OPTIONS_LIST}: --fields {e}"))?;
                    format!(
                        "v1/betaRecruitmentCriterionOptions?fields[betaRecruitmentCriterionOptions]={}",
                        fields.join(",")
                    )
                }
                None => "v1/betaRecruitmentCriterionOptions".to_string(),
            };
            pagination::run_list(session, CMD_RECRUITMENT_OPTIONS_LIST, Some(default), &args.page)
                .await
        }
    }
}

async fn tester_usages(session: &Session, args: TesterUsagesArgs) -> Result<()> {
    let period = normalize_tester_usage_period(&args.period)
        .map_err(|e| anyhow!("{CMD_TESTER_USAGES}: --period {e}"))?;
    let mut url = match &args.page.next {
        Some(next) => pagination::validate_next_url(next, CMD_TESTER_USAGES)?.to_string(),
        None => pagination::with_limit(&format!(
            "v1/betaGroups/{}/metrics/betaTesterUsages?period={period}",
            args.group
        )),
    };
    let client = session.client().await?;
    loop {
        let text = client.get_text(&url).await?;
        let page = parse_tester_usages_page(text.as_bytes())
            .map_err(|e| anyhow!("{CMD_TESTER_USAGES}: {e}"))?;
        println!("{}", text.trim());
        if !args.page.paginate || page.links.next.is_empty() {
            break;
        }
        url = page.links.next;
    }
    Ok(())
}
