#![cfg(feature = "http-mock")]

use httpmock::{Method::GET, Method::PATCH, MockServer};
use serde_json::json;

use asc_cli::{AppStoreConnectClient, Config};

fn test_client(server: &MockServer) -> AppStoreConnectClient {
    let cfg = Config {
        issuer_id: "ignored".into(),
        key_id: "ignored".into(),
        p8_private_key_pem: "ignored".into(),
    };
    AppStoreConnectClient::new(cfg, true)
        .unwrap()
        .with_static_token("test")
        .with_base_url(reqwest::Url::parse(&server.base_url()).unwrap())
}

#[tokio::test]
async fn collect_all_follows_next_links_in_order() {
    let server = MockServer::start();

    let second_url = format!("{}/v1/betaGroups?cursor=BQ&limit=200", server.base_url());
    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/betaGroups")
            .query_param("cursor", "AQ")
            .query_param("limit", "200");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "data": [{"type": "betaGroups", "id": "group-1"}],
                "links": {"next": second_url}
            }));
    });
    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/betaGroups")
            .query_param("cursor", "BQ")
            .query_param("limit", "200");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "data": [{"type": "betaGroups", "id": "group-2"}],
                "links": {"next": ""}
            }));
    });

    let client = test_client(&server);
    let items = client
        .collect_all("v1/betaGroups?cursor=AQ&limit=200")
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], "group-1");
    assert_eq!(items[1]["id"], "group-2");
    first.assert_hits(1);
    second.assert_hits(1);
}

#[tokio::test]
async fn collect_all_stops_without_next_link() {
    let server = MockServer::start();

    let only = server.mock(|when, then| {
        when.method(GET).path("/v1/builds");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"data": [{"type": "builds", "id": "build-1"}]}));
    });

    let client = test_client(&server);
    let items = client.collect_all("v1/builds?limit=200").await.unwrap();

    assert_eq!(items.len(), 1);
    only.assert_hits(1);
}

#[tokio::test]
async fn requests_carry_the_bearer_token() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/apps")
            .header("authorization", "Bearer test");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"data": []}));
    });

    let client = test_client(&server);
    client.get("v1/apps").await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn non_2xx_responses_propagate_status_and_body() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/v1/builds/build-404");
        then.status(404)
            .header("content-type", "application/json")
            .body(r#"{"errors":[{"status":"404"}]}"#);
    });

    let client = test_client(&server);
    let err = client.get("v1/builds/build-404").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("404"), "unexpected message {msg:?}");
    assert!(msg.contains("GET failed"), "unexpected message {msg:?}");
}

#[tokio::test]
async fn patch_sends_json_body() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/v1/builds/build-1")
            .json_body(json!({
                "data": {"type": "builds", "id": "build-1", "attributes": {"expired": true}}
            }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"data": {"type": "builds", "id": "build-1"}}));
    });

    let client = test_client(&server);
    let body = json!({
        "data": {"type": "builds", "id": "build-1", "attributes": {"expired": true}}
    });
    client.patch("v1/builds/build-1", body).await.unwrap();
    mock.assert();
}
