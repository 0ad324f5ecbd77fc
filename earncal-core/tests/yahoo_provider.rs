//! Yahoo provider against a local mock server.

use chrono::{TimeZone, Utc};
use earncal_core::data::{EarningsProvider, ProviderError, YahooProvider};
use earncal_core::resolver::resolve_ticker_at;
use earncal_core::ProviderConfig;
use httpmock::prelude::*;

const CRUMB: &str = "Xk3mCrumb.9";

const BODY: &str = r#"{"finance":{"result":[{"documents":[{
    "columns":[
        {"label":"Symbol","id":"ticker"},
        {"label":"Event Start Date","id":"startdatetime"},
        {"label":"When","id":"when"}
    ],
    "rows":[
        ["NVDA","2025-05-28T20:20:00.000Z","AMC"],
        ["NVDA","2025-02-26T21:20:00.000Z","AMC"],
        ["NVDA","2024-11-20T21:20:00.000Z","AMC"]
    ]}]}],"error":null}}"#;

fn config_for(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        base_url: server.base_url(),
        cookie_url: server.url("/cookie"),
        timeout_secs: 5,
        ..ProviderConfig::default()
    }
}

fn mock_session(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/cookie");
        then.status(404).header("set-cookie", "A3=d=abc; Path=/");
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/test/getcrumb");
        then.status(200).body(CRUMB);
    })
}

#[test]
fn fetches_and_parses_earnings_table() {
    let server = MockServer::start();
    let crumb = mock_session(&server);
    let viz = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/finance/visualization")
            .query_param("crumb", CRUMB);
        then.status(200)
            .header("content-type", "application/json")
            .body(BODY);
    });

    let provider = YahooProvider::new(config_for(&server)).unwrap();
    let table = provider.earnings_dates("NVDA", 16).unwrap();

    crumb.assert();
    viz.assert();
    assert_eq!(table.columns, vec!["Symbol", "When"]);
    assert_eq!(table.len(), 3);
}

#[test]
fn crumb_is_fetched_once_per_provider() {
    let server = MockServer::start();
    let crumb = mock_session(&server);
    server.mock(|when, then| {
        when.method(POST).path("/v1/finance/visualization");
        then.status(200).body(BODY);
    });

    let provider = YahooProvider::new(config_for(&server)).unwrap();
    provider.earnings_dates("NVDA", 16).unwrap();
    provider.earnings_dates("NVDA", 16).unwrap();

    crumb.assert();
}

#[test]
fn resolves_upcoming_through_http() {
    let server = MockServer::start();
    mock_session(&server);
    server.mock(|when, then| {
        when.method(POST).path("/v1/finance/visualization");
        then.status(200).body(BODY);
    });

    let provider = YahooProvider::new(config_for(&server)).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
    let record = resolve_ticker_at(&provider, "NVDA", 16, now);

    assert!(record.got_upcoming);
    assert_eq!(
        record.next_earnings_date_iso().as_deref(),
        Some("2025-02-26T21:20:00+00:00")
    );
    assert_eq!(record.when.as_deref(), Some("AMC"));
    assert_eq!(record.source, "yahoo:earnings_dates");
}

#[test]
fn forbidden_query_refreshes_crumb_for_next_symbol() {
    let server = MockServer::start();
    let crumb = mock_session(&server);
    let viz = server.mock(|when, then| {
        when.method(POST).path("/v1/finance/visualization");
        then.status(403).body("Forbidden");
    });

    let provider = YahooProvider::new(config_for(&server)).unwrap();
    let first = provider.earnings_dates("NVDA", 16).unwrap_err();
    let second = provider.earnings_dates("AAPL", 16).unwrap_err();

    assert!(matches!(first, ProviderError::AuthenticationRequired(_)));
    assert!(matches!(second, ProviderError::AuthenticationRequired(_)));
    viz.assert_calls(2);
    crumb.assert_calls(2);
}

#[test]
fn crumb_rejection_is_authentication_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/cookie");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/test/getcrumb");
        then.status(401).body("Unauthorized");
    });

    let provider = YahooProvider::new(config_for(&server)).unwrap();
    let err = provider.earnings_dates("NVDA", 16).unwrap_err();
    assert!(matches!(err, ProviderError::AuthenticationRequired(_)));
}

#[test]
fn server_error_becomes_failure_record() {
    let server = MockServer::start();
    mock_session(&server);
    server.mock(|when, then| {
        when.method(POST).path("/v1/finance/visualization");
        then.status(500);
    });

    let provider = YahooProvider::new(config_for(&server)).unwrap();
    let record = resolve_ticker_at(&provider, "BADSYM", 16, Utc::now());

    assert_eq!(record.next_earnings_date, None);
    assert!(!record.got_upcoming);
    assert_eq!(record.source, "error:HttpStatus:HTTP 500 for BADSYM");
}

#[test]
fn unreachable_host_is_network_error() {
    let config = ProviderConfig {
        base_url: "http://127.0.0.1:1".into(),
        cookie_url: "http://127.0.0.1:1/cookie".into(),
        timeout_secs: 2,
        ..ProviderConfig::default()
    };
    let provider = YahooProvider::new(config).unwrap();
    let err = provider.earnings_dates("AAPL", 16).unwrap_err();
    assert_eq!(err.kind(), "Network");
}
