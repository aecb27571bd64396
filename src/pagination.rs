use anyhow::{anyhow, Result};
use clap::Args;
use reqwest::Url;
use serde_json::Value;

use crate::asc::Session;

/// Page size appended to every constructed listing URL.
pub const PAGE_LIMIT: u32 = 200;

/// Host that `--next` cursor URLs must point at.
pub const API_HOST: &str = "api.appstoreconnect.apple.com";

/// Cursor flags shared by every list command.
#[derive(Debug, Args)]
pub struct PageArgs {
    /// Resume from a links.next URL returned by a previous page
    #[arg(long, value_name = "URL")]
    pub next: Option<String>,

    /// Follow links.next until the last page
    #[arg(long)]
    pub paginate: bool,
}

pub fn with_limit(path: &str) -> String {
    if path.contains('?') {
        format!("{path}&limit={PAGE_LIMIT}")
    } else {
        format!("{path}?limit={PAGE_LIMIT}")
    }
}

/// A `--next` URL must parse and must point at the App Store Connect API
/// over https; anything else would leak the bearer token to a foreign host.
pub fn validate_next_url(next: &str, command_path: &str) -> Result<Url> {
    let url = Url::parse(next)
        .map_err(|e| anyhow!("{command_path}: --next must be a valid URL: {e}"))?;
    if url.scheme() != "https" || url.host_str() != Some(API_HOST) {
        return Err(anyhow!(
            "{command_path}: --next must be an App Store Connect URL"
        ));
    }
    Ok(url)
}

/// Extracts a non-empty `links.next` cursor URL from a page envelope.
pub fn next_link(page: &Value) -> Option<String> {
    page.get("links")
        .and_then(|l| l.get("next"))
        .and_then(|n| n.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Fetches one page (or, with `--paginate`, every page) and prints each
/// page's raw envelope as one JSON line on stdout.
pub async fn run_list(
    session: &Session,
    command_path: &str,
    default_path: Option<String>,
    page: &PageArgs,
) -> Result<()> {
    let mut url = match &page.next {
        Some(next) => validate_next_url(next, command_path)?.to_string(),
        None => with_limit(
            &default_path.ok_or_else(|| anyhow!("{command_path}: missing listing path"))?,
        ),
    };
    let client = session.client().await?;
    loop {
        let envelope = client.get(&url).await?;
        println!("{}", serde_json::to_string(&envelope)?);
        if !page.paginate {
            break;
        }
        match next_link(&envelope) {
            Some(next) => url = next,
            None => break,
        }
    }
    Ok(())
}
