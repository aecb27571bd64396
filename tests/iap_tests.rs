use asc_cli::iap::{
    normalize_iap_date, parse_offer_code_eligibilities, parse_offer_code_prices,
    parse_price_schedule_prices,
};

#[test]
fn eligibilities_are_uppercased_and_deduplicated() {
    let got = parse_offer_code_eligibilities("non_spender,ACTIVE_SPENDER,non_spender").unwrap();
    assert_eq!(got, vec!["NON_SPENDER", "ACTIVE_SPENDER"]);
}

#[test]
fn eligibilities_reject_unknown_values() {
    assert!(parse_offer_code_eligibilities("INVALID").is_err());
    assert!(parse_offer_code_eligibilities("").is_err());
}

#[test]
fn offer_code_prices_parse_territory_pairs() {
    let prices = parse_offer_code_prices("usa:pp-1,jpn:pp-2").unwrap();
    assert_eq!(prices.len(), 2);
    assert_eq!(prices[0].territory_id, "USA");
    assert_eq!(prices[0].price_point_id, "pp-1");
    assert_eq!(prices[1].territory_id, "JPN");
    assert_eq!(prices[1].price_point_id, "pp-2");
}

#[test]
fn offer_code_prices_reject_malformed_entries() {
    assert!(parse_offer_code_prices("usa-pp-1").is_err());
    assert!(parse_offer_code_prices(":pp-1").is_err());
    assert!(parse_offer_code_prices("usa:").is_err());
    assert!(parse_offer_code_prices(" :pp-1").is_err());
    assert!(parse_offer_code_prices("usa: ").is_err());
}

#[test]
fn offer_code_prices_tolerate_surrounding_whitespace() {
    let prices = parse_offer_code_prices(" usa : pp-1 ").unwrap();
    assert_eq!(prices[0].territory_id, "USA");
    assert_eq!(prices[0].price_point_id, "pp-1");
}

#[test]
fn price_schedule_entries_allow_open_ended_dates() {
    let entries = parse_price_schedule_prices("pp1:2026-01-01:2026-02-01,pp2::").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].price_point_id, "pp1");
    assert_eq!(entries[0].start_date, "2026-01-01");
    assert_eq!(entries[0].end_date, "2026-02-01");
    assert_eq!(entries[1].price_point_id, "pp2");
    assert_eq!(entries[1].start_date, "");
    assert_eq!(entries[1].end_date, "");
}

#[test]
fn price_schedule_entries_reject_bad_rows() {
    assert!(parse_price_schedule_prices(":2026-01-01").is_err());
    assert!(parse_price_schedule_prices("pp1:01-01-2026").is_err());
}

#[test]
fn iap_dates_must_be_ymd() {
    assert_eq!(
        normalize_iap_date("2026-02-10", "--date").unwrap(),
        "2026-02-10"
    );
    let err = normalize_iap_date("10-02-2026", "--date").unwrap_err();
    assert!(err.to_string().contains("--date"));
}
