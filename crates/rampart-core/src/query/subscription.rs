// ── Query subscriptions ──
//
// Handles returned by `QueryClient::subscribe`. Holding one keeps its poll
// task alive; dropping it (or the stream made from it) stops scheduling.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

use super::client::QueryEntry;
use super::key::QueryKey;
use super::state::QueryState;

/// Cancels the poll task and releases the observer slot on drop.
pub(crate) struct ObserverGuard {
    entry: Arc<QueryEntry>,
    cancel: CancellationToken,
}

impl ObserverGuard {
    pub(crate) fn new(entry: Arc<QueryEntry>, cancel: CancellationToken) -> Self {
        Self { entry, cancel }
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.entry.remove_observer();
    }
}

/// A live view of one query.
pub struct Subscription {
    key: QueryKey,
    receiver: watch::Receiver<QueryState>,
    guard: ObserverGuard,
}

impl Subscription {
    pub(crate) fn new(key: QueryKey, receiver: watch::Receiver<QueryState>, guard: ObserverGuard) -> Self {
        Self {
            key,
            receiver,
            guard,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// The latest state.
    pub fn current(&self) -> QueryState {
        self.receiver.borrow().clone()
    }

    /// A receiver for use in `select!` loops.
    pub fn receiver(&self) -> watch::Receiver<QueryState> {
        self.receiver.clone()
    }

    /// Wait for the next state change. `None` once the cache is gone.
    pub async fn changed(&mut self) -> Option<QueryState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Stop refreshing for this observer.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Convert into a `Stream` of states. The poll task lives as long as
    /// the stream does.
    pub fn into_stream(self) -> QueryStream {
        QueryStream {
            inner: WatchStream::new(self.receiver),
            _guard: self.guard,
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("cancelled", &self.guard.cancel.is_cancelled())
            .finish()
    }
}

/// `Stream` adapter over a subscription's `watch::Receiver`.
pub struct QueryStream {
    inner: WatchStream<QueryState>,
    _guard: ObserverGuard,
}

impl Stream for QueryStream {
    type Item = QueryState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
