//! WebSocket quote stream.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::Notify;
use tracing::debug;

use crate::state::AppState;
use crate::stream::refresh_loop;

/// WebSocket upgrade handler for `/ws/:ticker`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let symbol = ticker.to_uppercase();
    ws.on_upgrade(move |socket| handle_socket(socket, symbol, state))
}

async fn handle_socket(socket: WebSocket, symbol: String, state: AppState) {
    let (mut sink, mut inbound) = socket.split();
    let (subscription, mut outbox) = state.broadcaster.subscribe(&symbol);
    let keepalive = Notify::new();

    let writer = async {
        while let Some(payload) = outbox.recv().await {
            if sink.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    };

    let reader = async {
        while let Some(Ok(msg)) = inbound.next().await {
            match msg {
                Message::Close(_) => break,
                _ => keepalive.notify_one(),
            }
        }
    };

    let refresh = refresh_loop(
        &state.fetcher,
        &state.broadcaster,
        &symbol,
        &state.stream,
        &keepalive,
    );

    tokio::select! {
        _ = writer => debug!(symbol = %symbol, "WS writer closed"),
        _ = reader => debug!(symbol = %symbol, "WS client disconnected"),
        _ = refresh => {}
    }

    drop(subscription);
}
