use serde_json::json;

use asc_cli::game_center::anchored_default;
use asc_cli::localizations::validate_locale;
use asc_cli::{next_link, validate_next_url, with_limit};

#[test]
fn with_limit_appends_page_size() {
    assert_eq!(with_limit("v1/builds"), "v1/builds?limit=200");
    assert_eq!(
        with_limit("v1/betaGroups?filter[app]=app-1"),
        "v1/betaGroups?filter[app]=app-1&limit=200"
    );
}

#[test]
fn next_url_must_be_app_store_connect() {
    let ok = validate_next_url(
        "https://api.appstoreconnect.apple.com/v1/builds?cursor=AQ&limit=200",
        "builds list",
    )
    .unwrap();
    assert_eq!(ok.host_str(), Some("api.appstoreconnect.apple.com"));

    let err = validate_next_url(
        "http://api.appstoreconnect.apple.com/v1/builds?cursor=AQ",
        "builds list",
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "builds list: --next must be an App Store Connect URL"
    );

    let err = validate_next_url("https://example.com/v1/builds", "builds list").unwrap_err();
    assert!(err.to_string().contains("App Store Connect URL"));
}

#[test]
fn next_url_parse_errors_name_the_flag() {
    let err = validate_next_url("not a url", "build-bundles file-sizes list").unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.starts_with("build-bundles file-sizes list: --next must be a valid URL:"),
        "unexpected message {msg:?}"
    );
}

#[test]
fn next_link_ignores_empty_cursors() {
    let page = json!({"data": [], "links": {"next": "https://api.appstoreconnect.apple.com/v1/builds?cursor=BQ"}});
    assert_eq!(
        next_link(&page).as_deref(),
        Some("https://api.appstoreconnect.apple.com/v1/builds?cursor=BQ")
    );

    let last = json!({"data": [], "links": {"next": ""}});
    assert_eq!(next_link(&last), None);

    let missing = json!({"data": []});
    assert_eq!(next_link(&missing), None);
}

#[test]
fn anchors_are_optional_only_with_next() {
    let path = anchored_default(
        "game-center leaderboard-sets members list",
        "--set",
        Some("set-1"),
        false,
        |s| format!("v1/gameCenterLeaderboardSets/{s}/gameCenterLeaderboards"),
    )
    .unwrap();
    assert_eq!(
        path.as_deref(),
        Some("v1/gameCenterLeaderboardSets/set-1/gameCenterLeaderboards")
    );

    let resumed = anchored_default(
        "game-center leaderboard-sets members list",
        "--set",
        None,
        true,
        |s| format!("v1/gameCenterLeaderboardSets/{s}/gameCenterLeaderboards"),
    )
    .unwrap();
    assert_eq!(resumed, None);

    let err = anchored_default(
        "game-center leaderboard-sets members list",
        "--set",
        None,
        false,
        |s| format!("v1/gameCenterLeaderboardSets/{s}/gameCenterLeaderboards"),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "game-center leaderboard-sets members list: --set is required unless --next is provided"
    );
}

#[test]
fn locales_are_sanity_checked() {
    assert!(validate_locale("en", "beta-app-localizations create").is_ok());
    assert!(validate_locale("en-US", "beta-app-localizations create").is_ok());
    assert!(validate_locale("zh-Hans", "beta-app-localizations create").is_ok());
    assert!(validate_locale("", "beta-app-localizations create").is_err());
    assert!(validate_locale("english_us", "beta-app-localizations create").is_err());
}
