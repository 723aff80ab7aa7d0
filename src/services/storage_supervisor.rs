//! Background task owning the storage connection and the degraded flag.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{document_store::DocumentStore, storage::StorageError},
    state::SharedState,
};

/// Timing knobs of the supervisor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// First retry delay; doubles after each failure.
    pub initial_delay: Duration,
    /// Cap of the doubling delay.
    pub max_delay: Duration,
    /// Pause between health checks of a connected store.
    pub health_poll_interval: Duration,
    /// In-place reconnects tried before dropping the store.
    pub reconnect_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(10),
            health_poll_interval: Duration::from_secs(5),
            reconnect_attempts: 3,
        }
    }
}

impl Backoff {
    fn next(&self, delay: Duration) -> Duration {
        (delay * 2).min(self.max_delay)
    }
}

/// Connect to the storage backend and keep the shared state in degraded mode while it is unavailable.
pub async fn run<F, Fut>(state: SharedState, connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn DocumentStore>, StorageError>> + Send,
{
    run_with(state, Backoff::default(), connect).await
}

/// [`run`] with explicit timings.
pub async fn run_with<F, Fut>(state: SharedState, backoff: Backoff, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn DocumentStore>, StorageError>> + Send,
{
    let mut delay = backoff.initial_delay;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_document_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = backoff.initial_delay;

                watch_health(&state, store.as_ref(), &backoff).await;
                state.clear_document_store().await;
            }
            Err(err) => warn!(error = %err, "storage connection attempt failed"),
        }

        sleep(delay).await;
        delay = backoff.next(delay);
    }
}

/// Poll `store` until it fails and cannot be revived in place.
async fn watch_health(state: &SharedState, store: &dyn DocumentStore, backoff: &Backoff) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded() {
                info!("storage healthy again; leaving degraded mode");
                state.update_degraded(false);
            }
        } else if !reconnect(state, store, backoff).await {
            warn!("exhausted storage reconnect attempts; staying in degraded mode");
            return;
        }
        sleep(backoff.health_poll_interval).await;
    }
}

async fn reconnect(state: &SharedState, store: &dyn DocumentStore, backoff: &Backoff) -> bool {
    let mut delay = backoff.initial_delay;

    for attempt in 0..backoff.reconnect_attempts {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                state.update_degraded(false);
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %err,
                        "storage reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(delay).await;
                delay = backoff.next(delay);
            }
        }
    }

    false
}
