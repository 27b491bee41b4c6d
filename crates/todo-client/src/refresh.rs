//! Single-flight token refresh.
//!
//! The first caller that needs a new access token becomes the leader and runs
//! the refresh exchange. Callers arriving while the exchange is in flight are
//! parked on a oneshot channel and settled with the leader's outcome. The
//! `refreshing` flag and the queue are only touched under one short lock that
//! is never held across an `.await`.

use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::messages;

type Waiter = oneshot::Sender<Result<String>>;

#[derive(Default)]
struct State {
    refreshing: bool,
    queue: Vec<Waiter>,
}

/// Coordinates refresh exchanges across every request issued by one client.
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<State>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &state.refreshing)
            .field("queued", &state.queue.len())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an exchange is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.state.lock().refreshing
    }

    /// Number of callers parked behind the in-flight exchange.
    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Obtain a fresh access token.
    ///
    /// If no exchange is in flight, `exchange` is run and its outcome is
    /// shared with every caller that queued up meanwhile. Otherwise the caller
    /// waits for the in-flight exchange and `exchange` is dropped unused.
    pub async fn refresh<F, Fut>(&self, exchange: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let waiting = {
            let mut state = self.state.lock();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.queue.push(tx);
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        if let Some(rx) = waiting {
            tracing::debug!("Refresh in flight; queued");
            return rx.await.unwrap_or_else(|_| Err(abandoned()));
        }

        let lease = Lease {
            coordinator: self,
            settled: false,
        };
        tracing::info!("Refreshing access token");
        let outcome = exchange().await;
        lease.settle(outcome.clone());
        outcome
    }

    /// Clear the flag and settle every waiter in one critical section, so no
    /// caller can queue behind an exchange that has already settled.
    fn release(&self, outcome: Result<String>) {
        let waiters = {
            let mut state = self.state.lock();
            state.refreshing = false;
            std::mem::take(&mut state.queue)
        };

        if !waiters.is_empty() {
            tracing::debug!(waiters = waiters.len(), ok = outcome.is_ok(), "Settling queued requests");
        }
        for waiter in waiters {
            // A waiter whose caller went away has nothing left to settle.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Held by the leader for the duration of the exchange. Releases the flag
/// even if the leader's future is dropped or the exchange panics.
struct Lease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl Lease<'_> {
    fn settle(mut self, outcome: Result<String>) {
        self.settled = true;
        self.coordinator.release(outcome);
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Refresh abandoned before it settled");
            self.coordinator.release(Err(abandoned()));
        }
    }
}

fn abandoned() -> Error {
    Error::session_expired(messages::TOKEN_REFRESH_FAILED, "TOKEN_REFRESH_FAILED")
}
