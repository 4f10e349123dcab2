//! Router-level tests against an in-memory provider.

use std::sync::Arc;
use std::time::Duration;

use analytics_api::{build_router, AppState, QuoteTick};
use analytics_config::AppConfig;
use analytics_core::types::{Bar, SymbolMatch};
use analytics_data::testing::StaticProvider;
use analytics_data::{Fetcher, Throttle, TtlCache};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

const DAY_MS: i64 = 86_400_000;

fn daily_bars(n: usize, base: f64) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let close = base + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1;
            Bar::new(i as i64 * DAY_MS, close - 0.5, close + 1.0, close - 1.0, close, 1_000.0 + i as f64)
        })
        .collect()
}

fn state_with(provider: Arc<StaticProvider>, config: &AppConfig) -> AppState {
    let fetcher = Fetcher::new(
        provider,
        Arc::new(Throttle::new(Duration::ZERO)),
        Arc::new(TtlCache::new(config.cache.max_entries)),
        config.fetcher_settings(),
    );
    AppState::new(Arc::new(fetcher), config)
}

fn provider() -> Arc<StaticProvider> {
    Arc::new(
        StaticProvider::new()
            .with_bars("AAPL", daily_bars(60, 150.0))
            .with_bars("MSFT", daily_bars(60, 400.0))
            .with_matches(vec![SymbolMatch {
                symbol: "AAPL".to_string(),
                name: "Apple Inc.".to_string(),
                exchange: Some("NMS".to_string()),
                kind: Some("EQUITY".to_string()),
            }]),
    )
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health_reports_cache_and_connections() {
    let state = state_with(provider(), &AppConfig::default());
    let app = build_router(state);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cache_size"], 0);
    assert_eq!(body["ws_connections"], 0);
}

#[tokio::test]
async fn test_identical_chart_requests_share_one_upstream_call() {
    let provider = provider();
    let state = state_with(provider.clone(), &AppConfig::default());
    let app = build_router(state);

    let (status, first) = get(&app, "/api/stock/aapl/chart?period=3mo&interval=1d").await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = get(&app, "/api/stock/AAPL/chart?period=3mo&interval=1d").await;

    assert_eq!(provider.history_calls(), 1);
    assert_eq!(first, second);
    assert_eq!(first["ticker"], "AAPL");
    assert_eq!(first["interval"], "1d");
    assert_eq!(first["points"], 60);
    assert_eq!(first["data"][0]["time"], "1970-01-01");
    assert!(first["data"][0]["indicators"]["rsi_14"].is_null());
    assert!(first["data"][59]["indicators"]["rsi_14"].is_f64());
    assert!(first["data"][59]["indicators"]["sma_50"].is_f64());

    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["cache_size"], 1);
}

#[tokio::test]
async fn test_intraday_chart_uses_clock_time() {
    let state = state_with(provider(), &AppConfig::default());
    let app = build_router(state);

    let (status, body) = get(&app, "/api/stock/AAPL/chart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"], "1d");
    assert_eq!(body["interval"], "5m");
    assert_eq!(body["data"][0]["time"], "00:00");
}

#[tokio::test]
async fn test_unknown_symbol_and_bad_params() {
    let state = state_with(provider(), &AppConfig::default());
    let app = build_router(state);

    let (status, body) = get(&app, "/api/stock/ZZZZ/chart").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No data for ZZZZ");

    let (status, body) = get(&app, "/api/stock/AAPL/chart?interval=7x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid interval: 7x");

    let (status, _) = get(&app, "/api/stock/ZZZZ/quote").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signals_report_counts_add_up() {
    let state = state_with(provider(), &AppConfig::default());
    let app = build_router(state);

    let (status, body) = get(&app, "/api/stock/msft/signals?period=3mo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticker"], "MSFT");

    let signals = body["signals"].as_array().unwrap();
    let total = body["buy_count"].as_u64().unwrap()
        + body["sell_count"].as_u64().unwrap()
        + body["neutral_count"].as_u64().unwrap();
    assert_eq!(total as usize, signals.len());
    assert!(!signals.is_empty());
    assert_eq!(signals[0]["indicator"], "RSI");
}

#[tokio::test]
async fn test_fibonacci_spans_period_range() {
    let state = state_with(provider(), &AppConfig::default());
    let app = build_router(state);

    let (status, body) = get(&app, "/api/stock/AAPL/fibonacci").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"], "3mo");

    let levels = body["levels"].as_array().unwrap();
    assert_eq!(levels.len(), 7);
    assert_eq!(levels[0]["level"], "0.0%");
    assert_eq!(levels[0]["price"], body["high"]);
    assert_eq!(levels[6]["level"], "100.0%");
    assert_eq!(levels[6]["price"], body["low"]);
}

#[tokio::test]
async fn test_quote_info_legacy_search_and_overview() {
    let state = state_with(provider(), &AppConfig::default());
    let app = build_router(state);

    let (status, quote) = get(&app, "/api/stock/AAPL/quote").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["ticker"], "AAPL");
    assert!(quote["price"].is_f64());

    let (status, info) = get(&app, "/api/stock/AAPL/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["name"], "AAPL");

    let (status, legacy) = get(&app, "/api/stock/AAPL").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(legacy["data"].as_array().unwrap().len(), 60);
    assert_eq!(legacy["data"][0]["time"], "00:00");

    let (status, matches) = get(&app, "/api/search/apple?limit=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(matches[0]["symbol"], "AAPL");
    assert_eq!(matches[0]["type"], "EQUITY");

    let (status, overview) = get(&app, "/api/market/overview").await;
    assert_eq!(status, StatusCode::OK);
    assert!(overview["indices"].as_array().unwrap().is_empty());
    assert!(overview["mega_cap"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_compare_ticker_bounds() {
    let state = state_with(provider(), &AppConfig::default());
    let app = build_router(state);

    let (status, body) = get(&app, "/api/compare?tickers=AAPL").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Need at least 2 tickers");

    let (status, body) = get(&app, "/api/compare?tickers=A,B,C,D,E,F,G,H,I,J,K").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Max 10 tickers");

    let (status, body) = get(&app, "/api/compare?tickers=X1,X2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No data");

    let (status, body) = get(&app, "/api/compare?tickers=aapl,msft").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tickers"], serde_json::json!(["AAPL", "MSFT"]));
    assert_eq!(body["chart"][0]["AAPL"], 100.0);
    assert!(body["performance"]["MSFT"]["return_pct"].is_f64());
}

#[tokio::test]
async fn test_rate_limit_rejects_over_budget() {
    let mut config = AppConfig::default();
    config.rate_limit.limit = 3;
    let state = state_with(provider(), &config);
    let app = build_router(state);

    for _ in 0..3 {
        let (status, _) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["detail"], "Rate limit exceeded");
}

#[tokio::test]
async fn test_websocket_streams_quote_and_cleans_up() {
    let state = state_with(provider(), &AppConfig::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(analytics_api::serve(listener, state.clone(), async {
        let _ = stop_rx.await;
    }));

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws/aapl", addr))
        .await
        .unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let text = match first {
        Message::Text(text) => text,
        other => panic!("expected a text frame, got {:?}", other),
    };
    let tick: QuoteTick = serde_json::from_str(&text).unwrap();
    assert_eq!(tick.ticker, "AAPL");
    assert_eq!(state.broadcaster.connection_count(), 1);
    assert_eq!(state.broadcaster.subscriber_count("AAPL"), 1);

    socket.close(None).await.unwrap();

    let mut remaining = state.broadcaster.connection_count();
    for _ in 0..100 {
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        remaining = state.broadcaster.connection_count();
    }
    assert_eq!(remaining, 0);
    assert_eq!(state.broadcaster.symbol_count(), 0);

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
