//! Router assembly.

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes;
use crate::state::AppState;
use crate::ws;

/// Assemble the full HTTP and WebSocket router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/stock/:ticker", get(routes::legacy))
        .route("/api/stock/:ticker/chart", get(routes::chart))
        .route("/api/stock/:ticker/quote", get(routes::quote))
        .route("/api/stock/:ticker/info", get(routes::info))
        .route("/api/stock/:ticker/signals", get(routes::signals))
        .route("/api/stock/:ticker/fibonacci", get(routes::fibonacci))
        .route("/api/search/:query", get(routes::search))
        .route("/api/compare", get(routes::compare))
        .route("/api/market/overview", get(routes::market_overview))
        .route("/ws/:ticker", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(state.clone(), crate::middleware::track_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
