//! Startup sequence: connect, subscribe, spawn.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::processor::{Processor, RunSummary};
use crate::channels::Backend;
use crate::error::ConnectionError;
use crate::health::HealthState;

/// Run the startup sequence once.
///
/// Store connection first (`StoreUp`), then the subscription (`Ready`), then
/// the processor loop is spawned. The returned handle resolves when the
/// subscription stream ends; aborting it unsubscribes.
pub async fn start(
    backend: &dyn Backend,
    channel: &str,
    health: Arc<HealthState>,
) -> Result<JoinHandle<RunSummary>, ConnectionError> {
    info!(backend = backend.name(), "Connecting to store");
    let store = backend.connect_store().await?;
    if let Err(e) = health.store_connected() {
        warn!(error = %e, "Unexpected health transition");
    }

    let stream = backend.subscribe(channel, Arc::clone(&health)).await?;
    if let Err(e) = health.subscription_active() {
        warn!(error = %e, "Unexpected health transition");
    }

    let processor = Processor::new(store);
    let handle = tokio::spawn(async move { processor.run(stream).await });

    info!(channel = %channel, "Worker started. Waiting for jobs...");
    Ok(handle)
}

/// Top-level catch around [`start`].
///
/// A failure is logged once and flips health to `Failed`; the startup
/// sequence is not retried and the caller keeps running in degraded mode.
pub async fn launch(
    backend: &dyn Backend,
    channel: &str,
    health: Arc<HealthState>,
) -> Option<JoinHandle<RunSummary>> {
    match start(backend, channel, Arc::clone(&health)).await {
        Ok(handle) => Some(handle),
        Err(e) => {
            error!(error = %e, "Worker startup failed, serving degraded health");
            if let Err(e) = health.startup_failed() {
                warn!(error = %e, "Unexpected health transition");
            }
            None
        }
    }
}
