use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

use asc_cli::builds::{
    expire_candidate, parse_build_timestamp, parse_older_than_duration,
    parse_older_than_threshold,
};

#[test]
fn parse_older_than_duration_units() {
    let cases = [
        ("90d", Duration::days(90)),
        ("2w", Duration::days(14)),
        ("3m", Duration::days(90)),
        ("10D", Duration::days(10)),
    ];
    for (input, want) in cases {
        assert_eq!(parse_older_than_duration(input).unwrap(), want, "{input}");
    }
}

#[test]
fn parse_older_than_duration_rejects_bad_input() {
    for input in ["", "10", "0d", "10y", "xd", "-3d"] {
        assert!(
            parse_older_than_duration(input).is_err(),
            "expected error for {input:?}"
        );
    }
}

#[test]
fn parse_older_than_rejects_out_of_range_values() {
    for input in ["999999999999999999w", "9223372036854775807m", "106751991167300d"] {
        assert!(
            parse_older_than_duration(input).is_err(),
            "expected error for {input:?}"
        );
    }

    // Within chrono's duration bounds but further back than any representable
    // date, so the subtraction itself must error rather than panic.
    let now = Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap();
    assert!(parse_older_than_threshold("100000000d", now).is_err());
    assert!(parse_older_than_threshold("106751991167300d", now).is_err());
}

#[test]
fn parse_older_than_threshold_forms() {
    let now = Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap();

    assert_eq!(
        parse_older_than_threshold("2026-01-01", now).unwrap(),
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(
        parse_older_than_threshold("2026-01-01T08:30:00Z", now).unwrap(),
        Utc.with_ymd_and_hms(2026, 1, 1, 8, 30, 0).unwrap()
    );
    assert_eq!(
        parse_older_than_threshold("7d", now).unwrap(),
        now - Duration::days(7)
    );
    assert!(parse_older_than_threshold("not-a-threshold", now).is_err());
}

#[test]
fn parse_build_timestamp_accepts_rfc3339() {
    assert!(parse_build_timestamp("2026-02-10T08:00:00Z").is_ok());
    assert!(parse_build_timestamp("2026-02-10T08:00:00.123456789Z").is_ok());
    assert!(parse_build_timestamp("").is_err());
    assert!(parse_build_timestamp("2026/02/10").is_err());
}

#[test]
fn expire_candidate_selects_old_builds() {
    let now = Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap();
    let threshold = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    let build = json!({
        "id": "build-1",
        "attributes": {"version": "1.2.3", "uploadedDate": "2026-01-01T00:00:00Z"}
    });

    let item = expire_candidate(&build, threshold, now).unwrap();
    assert_eq!(item.id, "build-1");
    assert_eq!(item.version, "1.2.3");
    assert_eq!(item.uploaded_date, "2026-01-01T00:00:00Z");
    assert_eq!(item.age_days, 40);
}

#[test]
fn expire_candidate_skips_recent_and_undated_builds() {
    let now = Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap();
    let threshold = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();

    let recent = json!({
        "id": "build-2",
        "attributes": {"version": "1.2.4", "uploadedDate": "2026-02-05T00:00:00Z"}
    });
    assert!(expire_candidate(&recent, threshold, now).is_none());

    let undated = json!({"id": "build-3", "attributes": {"version": "1.2.5"}});
    assert!(expire_candidate(&undated, threshold, now).is_none());
}
