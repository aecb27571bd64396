pub mod asc;
pub mod build_bundles;
pub mod builds;
pub mod cli;
pub mod game_center;
pub mod iap;
pub mod localizations;
pub mod pagination;
pub mod testflight;
pub mod util;

pub use asc::{AppStoreConnectClient, Config, Session};
pub use pagination::{next_link, validate_next_url, with_limit};
pub use util::{resource_attr_str, resource_id};
