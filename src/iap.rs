use std::{fs, path::PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use serde_json::{json, Value};

use crate::{
    asc::{AppStoreConnectClient, Session},
    pagination::{self, PageArgs},
    util::spinner,
};

const CMD_OFFER_CODES_LIST: &str = "iap offer-codes list";
const CMD_OFFER_CODES_CREATE: &str = "iap offer-codes create";
const CMD_PRICE_SCHEDULES_SET: &str = "iap price-schedules set";
const CMD_SCREENSHOT_UPLOAD: &str = "iap review-screenshots upload";

/// Customer eligibility values accepted on offer codes.
pub const OFFER_CODE_ELIGIBILITIES: &[&str] = &[
    "NEW_SUBSCRIBER",
    "EXISTING_SUBSCRIBER",
    "EXPIRED_SUBSCRIBER",
    "NON_SPENDER",
    "ACTIVE_SPENDER",
    "LAPSED_SPENDER",
];

#[derive(Debug, Subcommand)]
pub enum IapCommand {
    /// Subscription offer codes
    OfferCodes {
        #[command(subcommand)]
        command: OfferCodesCommand,
    },
    /// In-app purchase price schedules
    PriceSchedules {
        #[command(subcommand)]
        command: PriceSchedulesCommand,
    },
    /// App Store review screenshots for in-app purchases
    ReviewScreenshots {
        #[command(subcommand)]
        command: ReviewScreenshotsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum OfferCodesCommand {
    /// List offer codes of a subscription
    List(OfferCodesListArgs),
    /// Create an offer code for a subscription
    Create(OfferCodeCreateArgs),
}

#[derive(Debug, Subcommand)]
pub enum PriceSchedulesCommand {
    /// Show the price schedule of an in-app purchase
    Get(PriceScheduleGetArgs),
    /// Replace the manual price schedule of an in-app purchase
    Set(PriceScheduleSetArgs),
}

#[derive(Debug, Subcommand)]
pub enum ReviewScreenshotsCommand {
    /// Upload a review screenshot for an in-app purchase
    Upload(ScreenshotUploadArgs),
}

#[derive(Debug, Args)]
pub struct OfferCodesListArgs {
    /// Subscription ID
    #[arg(long)]
    pub subscription: String,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct OfferCodeCreateArgs {
    /// Subscription ID
    #[arg(long)]
    pub subscription: String,

    /// Offer code campaign name
    #[arg(long)]
    pub name: String,

    /// Comma-separated customer eligibilities, e.g. NON_SPENDER,ACTIVE_SPENDER
    #[arg(long)]
    pub eligibilities: String,

    /// Comma-separated territory:pricePointId pairs, e.g. USA:pp-1,JPN:pp-2
    #[arg(long)]
    pub prices: String,

    /// Last redemption date, YYYY-MM-DD
    #[arg(long = "expiration-date")]
    pub expiration_date: Option<String>,
}

#[derive(Debug, Args)]
pub struct PriceScheduleGetArgs {
    /// In-app purchase ID
    #[arg(long)]
    pub purchase: String,
}

#[derive(Debug, Args)]
pub struct PriceScheduleSetArgs {
    /// In-app purchase ID
    #[arg(long)]
    pub purchase: String,

    /// Territory the schedule is priced from, e.g. USA
    #[arg(long = "base-territory")]
    pub base_territory: String,

    /// Comma-separated pricePointId:startDate:endDate entries; dates are
    /// YYYY-MM-DD and may be empty, e.g. pp1:2026-01-01:2026-02-01,pp2::
    #[arg(long)]
    pub prices: String,
}

#[derive(Debug, Args)]
pub struct ScreenshotUploadArgs {
    /// In-app purchase ID
    #[arg(long)]
    pub purchase: String,

    /// Path to the screenshot file
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Debug, PartialEq)]
pub struct OfferCodePrice {
    pub territory_id: String,
    pub price_point_id: String,
}

#[derive(Debug, PartialEq)]
pub struct PriceScheduleEntry {
    pub price_point_id: String,
    pub start_date: String,
    pub end_date: String,
}

/// Parses a comma list of eligibilities, uppercasing and de-duplicating
/// while preserving first occurrence order.
pub fn parse_offer_code_eligibilities(input: &str) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for raw in input.split(',') {
        let eligibility = raw.trim().to_ascii_uppercase();
        if !OFFER_CODE_ELIGIBILITIES.contains(&eligibility.as_str()) {
            bail!(
                "unknown eligibility {raw:?} (expected one of {})",
                OFFER_CODE_ELIGIBILITIES.join(", ")
            );
        }
        if !out.contains(&eligibility) {
            out.push(eligibility);
        }
    }
    Ok(out)
}

/// Parses `territory:pricePointId` pairs. Territory codes are uppercased.
pub fn parse_offer_code_prices(input: &str) -> Result<Vec<OfferCodePrice>> {
    let mut out = Vec::new();
    for part in input.split(',') {
        let (territory, price_point) = part
            .split_once(':')
            .ok_or_else(|| anyhow!("entry {part:?} must look like USA:pp-1"))?;
        let territory = territory.trim();
        let price_point = price_point.trim();
        if territory.is_empty() || price_point.is_empty() {
            bail!("entry {part:?} must look like USA:pp-1");
        }
        out.push(OfferCodePrice {
            territory_id: territory.to_ascii_uppercase(),
            price_point_id: price_point.to_string(),
        });
    }
    Ok(out)
}

/// Parses `pricePointId:startDate:endDate` entries; either date may be empty
/// for an open-ended schedule row.
pub fn parse_price_schedule_prices(input: &str) -> Result<Vec<PriceScheduleEntry>> {
    let mut out = Vec::new();
    for part in input.split(',') {
        let mut fields = part.splitn(3, ':');
        let price_point_id = fields.next().unwrap_or("").trim();
        let start_date = fields.next().unwrap_or("").trim();
        let end_date = fields.next().unwrap_or("").trim();
        if price_point_id.is_empty() {
            bail!("entry {part:?} is missing a price point ID");
        }
        for date in [start_date, end_date] {
            if !date.is_empty() && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                bail!("entry {part:?} has an invalid date {date:?} (expected YYYY-MM-DD)");
            }
        }
        out.push(PriceScheduleEntry {
            price_point_id: price_point_id.to_string(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
        });
    }
    Ok(out)
}

/// Validates a `YYYY-MM-DD` date flag and returns it trimmed.
pub fn normalize_iap_date(input: &str, flag: &str) -> Result<String> {
    let date = input.trim();
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| anyhow!("{flag} must be a YYYY-MM-DD date, got {input:?}"))?;
    Ok(date.to_string())
}

fn date_value(date: &str) -> Value {
    if date.is_empty() {
        Value::Null
    } else {
        Value::String(date.to_string())
    }
}

pub async fn run(session: &Session, command: IapCommand) -> Result<()> {
    match command {
        IapCommand::OfferCodes { command } => run_offer_codes(session, command).await,
        IapCommand::PriceSchedules { command } => run_price_schedules(session, command).await,
        IapCommand::ReviewScreenshots {
            command: ReviewScreenshotsCommand::Upload(args),
        } => upload_screenshot(session, args).await,
    }
}

async fn run_offer_codes(session: &Session, command: OfferCodesCommand) -> Result<()> {
    match command {
        OfferCodesCommand::List(args) => {
            pagination::run_list(
                session,
                CMD_OFFER_CODES_LIST,
                Some(format!("v1/subscriptions/{}/offerCodes", args.subscription)),
                &args.page,
            )
            .await
        }
        OfferCodesCommand::Create(args) => {
            let eligibilities = parse_offer_code_eligibilities(&args.eligibilities)
                .map_err(|e| anyhow!("{CMD_OFFER_CODES_CREATE}: --eligibilities {e}"))?;
            let prices = parse_offer_code_prices(&args.prices)
                .map_err(|e| anyhow!("{CMD_OFFER_CODES_CREATE}: --prices {e}"))?;
            let mut attrs = json!({
                "name": args.name,
                "customerEligibilities": eligibilities,
            });
            if let Some(date) = &args.expiration_date {
                let date = normalize_iap_date(date, "--expiration-date")
                    .map_err(|e| anyhow!("{CMD_OFFER_CODES_CREATE}: {e}"))?;
                attrs["expirationDate"] = Value::String(date);
            }

            // Prices ride along as included resources under temporary IDs.
            let price_refs: Vec<Value> = (0..prices.len())
                .map(|i| json!({"type": "subscriptionOfferCodePrices", "id": format!("${{price-{i}}}")}))
                .collect();
            let included: Vec<Value> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    json!({
                        "type": "subscriptionOfferCodePrices",
                        "id": format!("${{price-{i}}}"),
                        "relationships": {
                            "territory": {
                                "data": {"type": "territories", "id": p.territory_id}
                            },
                            "subscriptionPricePoint": {
                                "data": {"type": "subscriptionPricePoints", "id": p.price_point_id}
                            }
                        }
                    })
                })
                .collect();

            let body = json!({
                "data": {
                    "type": "subscriptionOfferCodes",
                    "attributes": attrs,
                    "relationships": {
                        "subscription": {
                            "data": {"type": "subscriptions", "id": args.subscription}
                        },
                        "prices": {"data": price_refs}
                    }
                },
                "included": included
            });
            let v = session
                .client()
                .await?
                .post("v1/subscriptionOfferCodes", body)
                .await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
    }
}

async fn run_price_schedules(session: &Session, command: PriceSchedulesCommand) -> Result<()> {
    match command {
        PriceSchedulesCommand::Get(args) => {
            let v = session
                .client()
                .await?
                .get(&format!("v2/inAppPurchases/{}/iapPriceSchedule", args.purchase))
                .await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
        PriceSchedulesCommand::Set(args) => {
            let entries = parse_price_schedule_prices(&args.prices)
                .map_err(|e| anyhow!("{CMD_PRICE_SCHEDULES_SET}: --prices {e}"))?;
            let base_territory = args.base_territory.trim().to_ascii_uppercase();
            if base_territory.is_empty() {
                bail!("{CMD_PRICE_SCHEDULES_SET}: --base-territory must not be empty");
            }

            let price_refs: Vec<Value> = (0..entries.len())
                .map(|i| json!({"type": "inAppPurchasePrices", "id": format!("${{price-{i}}}")}))
                .collect();
            let included: Vec<Value> = entries
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    json!({
                        "type": "inAppPurchasePrices",
                        "id": format!("${{price-{i}}}"),
                        "attributes": {
                            "startDate": date_value(&entry.start_date),
                            "endDate": date_value(&entry.end_date)
                        },
                        "relationships": {
                            "inAppPurchasePricePoint": {
                                "data": {
                                    "type": "inAppPurchasePricePoints",
                                    "id": entry.price_point_id
                                }
                            },
                            "inAppPurchaseV2": {
                                "data": {"type": "inAppPurchases", "id": args.purchase}
                            }
                        }
                    })
                })
                .collect();

            let body = json!({
                "data": {
                    "type": "inAppPurchasePriceSchedules",
                    "relationships": {
                        "inAppPurchase": {
                            "data": {"type": "inAppPurchases", "id": args.purchase}
                        },
                        "baseTerritory": {
                            "data": {"type": "territories", "id": base_territory}
                        },
                        "manualPrices": {"data": price_refs}
                    }
                },
                "included": included
            });
            let v = session
                .client()
                .await?
                .post("v1/inAppPurchasePriceSchedules", body)
                .await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
    }
}

async fn upload_screenshot(session: &Session, args: ScreenshotUploadArgs) -> Result<()> {
    let bytes = fs::read(&args.file).with_context(|| {
        format!(
            "{CMD_SCREENSHOT_UPLOAD}: --file cannot read {}",
            args.file.display()
        )
    })?;
    let file_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("{CMD_SCREENSHOT_UPLOAD}: --file must point at a file"))?;

    let reserve_body = json!({
        "data": {
            "type": "inAppPurchaseAppStoreReviewScreenshots",
            "attributes": {"fileName": file_name, "fileSize": bytes.len()},
            "relationships": {
                "inAppPurchaseV2": {
                    "data": {"type": "inAppPurchases", "id": args.purchase}
                }
            }
        }
    });
    let client = session.client().await?;
    let pb = spinner("Reserving screenshot...");
    let reserved = client
        .post("v1/inAppPurchaseAppStoreReviewScreenshots", reserve_body)
        .await;
    pb.finish_and_clear();
    let reserved = reserved?;

    let screenshot_id = reserved
        .get("data")
        .and_then(|d| d.get("id"))
        .and_then(|s| s.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("{CMD_SCREENSHOT_UPLOAD}: reservation returned no ID"))?;
    let operations = reserved
        .get("data")
        .and_then(|d| d.get("attributes"))
        .and_then(|a| a.get("uploadOperations"))
        .and_then(|ops| ops.as_array())
        .cloned()
        .unwrap_or_default();
    if operations.is_empty() {
        bail!("{CMD_SCREENSHOT_UPLOAD}: reservation returned no upload operations");
    }

    let pb = spinner("Uploading screenshot...");
    let result = upload_operations(client, &operations, &bytes).await;
    pb.finish_and_clear();
    result?;

    let commit_body = json!({
        "data": {
            "type": "inAppPurchaseAppStoreReviewScreenshots",
            "id": screenshot_id,
            "attributes": {"uploaded": true}
        }
    });
    client
        .patch(
            &format!("v1/inAppPurchaseAppStoreReviewScreenshots/{screenshot_id}"),
            commit_body,
        )
        .await?;
    println!("Uploaded review screenshot {screenshot_id}");
    Ok(())
}

async fn upload_operations(
    client: &AppStoreConnectClient,
    operations: &[Value],
    bytes: &[u8],
) -> Result<()> {
    for op in operations {
        let url = op
            .get("url")
            .and_then(|u| u.as_str())
            .ok_or_else(|| anyhow!("upload operation has no URL"))?;
        let offset = op.get("offset").and_then(|o| o.as_u64()).unwrap_or(0) as usize;
        let length = op
            .get("length")
            .and_then(|l| l.as_u64())
            .map(|l| l as usize)
            .unwrap_or(bytes.len());
        let end = (offset + length).min(bytes.len());
        if offset >= end {
            bail!("upload operation range {offset}..{end} is out of bounds");
        }
        let headers: Vec<(String, String)> = op
            .get("requestHeaders")
            .and_then(|h| h.as_array())
            .map(|h| {
                h.iter()
                    .filter_map(|e| {
                        let name = e.get("name")?.as_str()?;
                        let value = e.get("value")?.as_str()?;
                        Some((name.to_string(), value.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        client.upload(url, &headers, bytes[offset..end].to_vec()).await?;
    }
    Ok(())
}
