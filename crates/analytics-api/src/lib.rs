//! HTTP and WebSocket surface of the stock analytics service.

mod broadcast;
mod error;
mod middleware;
mod rate_limit;
mod router;
mod routes;
mod state;
mod stream;
mod ws;

pub use broadcast::{Broadcaster, ConnectionId, Subscription};
pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use router::build_router;
pub use routes::MAX_COMPARE;
pub use state::AppState;
pub use stream::{backoff, quote_tick, refresh_loop, QuoteTick};

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

/// Interval of the idle-client sweep of the rate limiter.
const LIMITER_SWEEP: Duration = Duration::from_secs(60);

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let janitor = state.limiter.spawn_janitor(LIMITER_SWEEP);
    let app = build_router(state);

    info!(addr = %listener.local_addr()?, "Stock analytics API listening");
    let result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await;

    janitor.abort();
    result
}
