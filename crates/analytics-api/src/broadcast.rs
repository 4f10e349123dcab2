//! Per-symbol fan-out of stream payloads to WebSocket connections.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Outbound queue depth per connection.
const OUTBOX_CAPACITY: usize = 16;

/// Identity of one WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

struct Subscriber {
    id: ConnectionId,
    outbox: mpsc::Sender<String>,
}

/// Subscriber sets keyed by symbol.
///
/// A symbol entry exists only while it has at least one subscriber.
pub struct Broadcaster {
    symbols: Mutex<HashMap<String, Vec<Subscriber>>>,
    send_timeout: Duration,
}

impl Broadcaster {
    pub fn new(send_timeout: Duration) -> Self {
        Self {
            symbols: Mutex::new(HashMap::new()),
            send_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Subscriber>>> {
        self.symbols.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a new connection for `symbol`.
    ///
    /// Payloads broadcast to the symbol arrive on the returned receiver. The
    /// connection stays registered until the [`Subscription`] is dropped or a
    /// send to it fails.
    pub fn subscribe(self: &Arc<Self>, symbol: &str) -> (Subscription, mpsc::Receiver<String>) {
        let (outbox, inbox) = mpsc::channel(OUTBOX_CAPACITY);
        let id = ConnectionId::new();

        let total = {
            let mut symbols = self.lock();
            symbols
                .entry(symbol.to_string())
                .or_default()
                .push(Subscriber { id, outbox });
            symbols.values().map(Vec::len).sum::<usize>()
        };
        info!(symbol, connection = %id, total, "WS subscribed");

        let subscription = Subscription {
            broadcaster: Arc::clone(self),
            symbol: symbol.to_string(),
            id,
        };
        (subscription, inbox)
    }

    /// Remove a connection, dropping the symbol entry when it empties.
    pub fn unsubscribe(&self, symbol: &str, id: ConnectionId) {
        let total = {
            let mut symbols = self.lock();
            if let Some(subscribers) = symbols.get_mut(symbol) {
                subscribers.retain(|s| s.id != id);
                if subscribers.is_empty() {
                    symbols.remove(symbol);
                }
            }
            symbols.values().map(Vec::len).sum::<usize>()
        };
        info!(symbol, connection = %id, total, "WS unsubscribed");
    }

    /// Send `payload` to every subscriber of `symbol`.
    ///
    /// Each send is bounded by the send timeout. Subscribers whose send fails
    /// are removed. Returns the number of successful deliveries.
    pub async fn broadcast(&self, symbol: &str, payload: String) -> usize {
        let targets: Vec<(ConnectionId, mpsc::Sender<String>)> = match self.lock().get(symbol) {
            Some(subscribers) => subscribers.iter().map(|s| (s.id, s.outbox.clone())).collect(),
            None => return 0,
        };

        let results = join_all(targets.iter().map(|(id, outbox)| {
            let payload = payload.clone();
            async move { (*id, outbox.send_timeout(payload, self.send_timeout).await.is_ok()) }
        }))
        .await;

        let dead: Vec<ConnectionId> = results.iter().filter(|(_, ok)| !ok).map(|(id, _)| *id).collect();
        if !dead.is_empty() {
            let mut symbols = self.lock();
            if let Some(subscribers) = symbols.get_mut(symbol) {
                subscribers.retain(|s| !dead.contains(&s.id));
                if subscribers.is_empty() {
                    symbols.remove(symbol);
                }
            }
            debug!(symbol, dropped = dead.len(), "Removed unresponsive subscribers");
        }

        results.len() - dead.len()
    }

    /// Symbols with at least one subscriber.
    pub fn symbol_count(&self) -> usize {
        self.lock().len()
    }

    /// Subscribers across all symbols.
    pub fn connection_count(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    pub fn subscriber_count(&self, symbol: &str) -> usize {
        self.lock().get(symbol).map_or(0, Vec::len)
    }
}

/// Registration of one connection; unsubscribes on drop.
pub struct Subscription {
    broadcaster: Arc<Broadcaster>,
    symbol: String,
    id: ConnectionId,
}

impl Subscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unsubscribe(&self.symbol, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broadcaster() -> Arc<Broadcaster> {
        Arc::new(Broadcaster::new(Duration::from_millis(100)))
    }

    #[tokio::test]
    async fn test_symbol_entry_removed_with_last_subscriber() {
        let hub = broadcaster();

        let (a, _rx_a) = hub.subscribe("AAPL");
        let (b, _rx_b) = hub.subscribe("AAPL");
        let (c, _rx_c) = hub.subscribe("MSFT");
        assert_eq!(hub.symbol_count(), 2);
        assert_eq!(hub.connection_count(), 3);

        drop(a);
        assert_eq!(hub.subscriber_count("AAPL"), 1);
        drop(b);
        assert_eq!(hub.symbol_count(), 1);
        assert_eq!(hub.subscriber_count("AAPL"), 0);
        drop(c);
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_only_symbol_subscribers() {
        let hub = broadcaster();
        let (_a, mut rx_a) = hub.subscribe("AAPL");
        let (_b, mut rx_b) = hub.subscribe("MSFT");

        assert_eq!(hub.broadcast("AAPL", "tick".to_string()).await, 1);
        assert_eq!(rx_a.recv().await.as_deref(), Some("tick"));
        assert!(rx_b.try_recv().is_err());

        assert_eq!(hub.broadcast("TSLA", "tick".to_string()).await, 0);
    }

    #[tokio::test]
    async fn test_failed_subscriber_is_removed() {
        let hub = broadcaster();
        let (_live, mut rx_live) = hub.subscribe("AAPL");
        let (_gone, rx_gone) = hub.subscribe("AAPL");
        drop(rx_gone);

        assert_eq!(hub.broadcast("AAPL", "tick".to_string()).await, 1);
        assert_eq!(hub.subscriber_count("AAPL"), 1);
        assert_eq!(rx_live.recv().await.as_deref(), Some("tick"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_subscriber_times_out() {
        let hub = broadcaster();
        let (_slow, _rx_slow) = hub.subscribe("AAPL");

        for _ in 0..OUTBOX_CAPACITY {
            assert_eq!(hub.broadcast("AAPL", "x".to_string()).await, 1);
        }
        // Outbox full and never drained
        assert_eq!(hub.broadcast("AAPL", "x".to_string()).await, 0);
        assert_eq!(hub.symbol_count(), 0);
    }
}
