use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    asc::Session,
    pagination::{self, PageArgs},
    util::{resource_attr_str, resource_id, spinner},
};

const CMD_LIST: &str = "builds list";
const CMD_EXPIRE: &str = "builds expire";
const CMD_EXPIRE_ALL: &str = "builds expire-all";

#[derive(Debug, Subcommand)]
pub enum BuildsCommand {
    /// List builds, optionally scoped to one app
    List(ListArgs),
    /// Expire a single build
    Expire(ExpireArgs),
    /// Expire every build uploaded before a threshold
    ExpireAll(ExpireAllArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// App ID to scope the listing
    #[arg(long)]
    pub app: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct ExpireArgs {
    /// Build ID
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ExpireAllArgs {
    /// App ID whose builds are considered
    #[arg(long)]
    pub app: String,

    /// Age threshold: a duration (90d, 2w, 3m), a date (2026-01-01),
    /// or an RFC 3339 timestamp
    #[arg(long = "older-than")]
    pub older_than: String,

    /// Only print the builds that would be expired
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(session: &Session, command: BuildsCommand) -> Result<()> {
    match command {
        BuildsCommand::List(args) => list(session, args).await,
        BuildsCommand::Expire(args) => expire(session, args).await,
        BuildsCommand::ExpireAll(args) => expire_all(session, args).await,
    }
}

async fn list(session: &Session, args: ListArgs) -> Result<()> {
    let default = match &args.app {
        Some(app) => format!("v1/apps/{app}/builds"),
        None => "v1/builds".to_string(),
    };
    pagination::run_list(session, CMD_LIST, Some(default), &args.page).await
}

async fn expire(session: &Session, args: ExpireArgs) -> Result<()> {
    let body = json!({
        "data": {
            "type": "builds",
            "id": args.id,
            "attributes": {"expired": true}
        }
    });
    session
        .client()
        .await?
        .patch(&format!("v1/builds/{}", args.id), body)
        .await
        .with_context(|| format!("{CMD_EXPIRE}: --id {}", args.id))?;
    println!("Expired build {}", args.id);
    Ok(())
}

async fn expire_all(session: &Session, args: ExpireAllArgs) -> Result<()> {
    let now = Utc::now();
    let threshold = parse_older_than_threshold(&args.older_than, now)
        .map_err(|e| anyhow!("{CMD_EXPIRE_ALL}: --older-than {e}"))?;

    let client = session.client().await?;
    let pb = spinner("Loading builds...");
    let builds = client
        .collect_all(&pagination::with_limit(&format!(
            "v1/apps/{}/builds",
            args.app
        )))
        .await;
    pb.finish_and_clear();
    let builds = builds?;

    let mut expired = 0usize;
    for build in &builds {
        let Some(item) = expire_candidate(build, threshold, now) else {
            continue;
        };
        if !args.dry_run {
            let body = json!({
                "data": {
                    "type": "builds",
                    "id": item.id,
                    "attributes": {"expired": true}
                }
            });
            client
                .patch(&format!("v1/builds/{}", item.id), body)
                .await?;
        }
        println!("{}", serde_json::to_string(&item)?);
        expired += 1;
    }
    println!(
        "{}",
        serde_json::to_string(&json!({"expired": expired, "dryRun": args.dry_run}))?
    );
    Ok(())
}

/// One line of `builds expire-all` output.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireAllItem {
    pub id: String,
    pub version: String,
    pub uploaded_date: String,
    pub age_days: i64,
}

/// Selects a build uploaded strictly before `threshold`. Builds without a
/// parseable `uploadedDate` are skipped.
pub fn expire_candidate(
    build: &Value,
    threshold: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<ExpireAllItem> {
    let uploaded_raw = resource_attr_str(build, "uploadedDate")?;
    let uploaded = parse_build_timestamp(&uploaded_raw).ok()?;
    if uploaded >= threshold {
        return None;
    }
    Some(ExpireAllItem {
        id: resource_id(build),
        version: resource_attr_str(build, "version").unwrap_or_default(),
        uploaded_date: uploaded_raw,
        age_days: (now - uploaded).num_days(),
    })
}

/// Parses a relative age like `90d`, `2w`, or `3m` (months count 30 days).
pub fn parse_older_than_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    let mut chars = input.chars();
    let Some(unit) = chars.next_back() else {
        bail!("must not be empty");
    };
    let number = chars.as_str();
    if number.is_empty() {
        bail!("must look like 90d, 2w, or 3m");
    }
    let n: i64 = number
        .parse()
        .map_err(|_| anyhow!("has an invalid number {number:?}"))?;
    if n <= 0 {
        bail!("must be greater than zero");
    }
    let days = match unit.to_ascii_lowercase() {
        'd' => Some(n),
        'w' => n.checked_mul(7),
        'm' => n.checked_mul(30),
        other => bail!("has unknown unit {other:?} (expected d, w, or m)"),
    };
    days.and_then(Duration::try_days)
        .ok_or_else(|| anyhow!("is out of range"))
}

/// Accepts a relative duration, a `YYYY-MM-DD` date (midnight UTC), or an
/// RFC 3339 timestamp, and returns the absolute cutoff instant.
pub fn parse_older_than_threshold(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(duration) = parse_older_than_duration(input) {
        return now
            .checked_sub_signed(duration)
            .ok_or_else(|| anyhow!("is out of range"));
    }
    bail!("must be a duration (90d), a date (2026-01-01), or an RFC 3339 timestamp")
}

/// Parses the `uploadedDate` the API reports on builds. Fractional seconds
/// are accepted.
pub fn parse_build_timestamp(input: &str) -> Result<DateTime<Utc>> {
    if input.trim().is_empty() {
        bail!("build timestamp is empty");
    }
    DateTime::parse_from_rfc3339(input)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("invalid build timestamp {input:?}"))
}
