//! Request admission and access logging.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Rate-limit key of a request: the peer IP, or `unknown`.
fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Reject clients over their request budget, then log the request.
pub async fn track_request(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let client = client_key(&req);
    if !state.limiter.allow(&client) {
        warn!(client = %client, path = %req.uri().path(), "Rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    info!(
        "{} {} -> {} ({}ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}
