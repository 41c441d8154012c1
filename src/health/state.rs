//! Readiness state machine.

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::TransitionError;

/// Startup phase of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthPhase {
    /// Process started, nothing connected yet.
    Starting,
    /// Command connection to the store is up.
    StoreUp,
    /// Subscription is active and messages are being handled.
    Ready,
    /// Startup sequence aborted. The process keeps serving degraded health.
    Failed,
}

impl HealthPhase {
    /// Check if this phase allows moving to `target`.
    pub fn can_transition_to(&self, target: HealthPhase) -> bool {
        use HealthPhase::*;

        matches!(
            (self, target),
            (Starting, StoreUp) | (Starting, Failed) |
            (StoreUp, Ready) | (StoreUp, Failed)
        )
    }
}

impl std::fmt::Display for HealthPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Starting => "starting",
            Self::StoreUp => "store_up",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Point-in-time view of the readiness flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub phase: HealthPhase,
    pub worker_ready: bool,
    pub store_ready: bool,
}

impl HealthSnapshot {
    fn initial() -> Self {
        Self {
            phase: HealthPhase::Starting,
            worker_ready: false,
            store_ready: false,
        }
    }

    /// Healthy only when both the worker and the store are ready.
    pub fn is_healthy(&self) -> bool {
        self.worker_ready && self.store_ready
    }

    /// JSON document served by `GET /health`.
    pub fn report(&self) -> HealthReport {
        HealthReport {
            status: if self.is_healthy() {
                OverallStatus::Healthy
            } else {
                OverallStatus::Degraded
            },
            checks: HealthChecks {
                worker: CheckStatus::from(self.worker_ready),
                redis: CheckStatus::from(self.store_ready),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Healthy,
    Unhealthy,
}

impl From<bool> for CheckStatus {
    fn from(ready: bool) -> Self {
        if ready { Self::Healthy } else { Self::Unhealthy }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthChecks {
    pub worker: CheckStatus,
    pub redis: CheckStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: OverallStatus,
    pub checks: HealthChecks,
}

/// Owner of the readiness flags.
///
/// Lifecycle code mutates the state through the named transitions below;
/// everyone else reads snapshots or waits on [`HealthState::watch`].
#[derive(Debug)]
pub struct HealthState {
    tx: watch::Sender<HealthSnapshot>,
}

impl HealthState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(HealthSnapshot::initial());
        Self { tx }
    }

    /// Current flags.
    pub fn snapshot(&self) -> HealthSnapshot {
        *self.tx.borrow()
    }

    /// Receiver that is notified on every change.
    pub fn watch(&self) -> watch::Receiver<HealthSnapshot> {
        self.tx.subscribe()
    }

    /// Command connection established.
    pub fn store_connected(&self) -> Result<(), TransitionError> {
        self.advance(HealthPhase::StoreUp, |s| s.store_ready = true)?;
        info!("Store connection established");
        Ok(())
    }

    /// Subscription active, worker is processing.
    pub fn subscription_active(&self) -> Result<(), TransitionError> {
        self.advance(HealthPhase::Ready, |s| s.worker_ready = true)?;
        info!("Worker ready");
        Ok(())
    }

    /// Startup aborted; both flags drop back to false.
    pub fn startup_failed(&self) -> Result<(), TransitionError> {
        self.advance(HealthPhase::Failed, |s| {
            s.worker_ready = false;
            s.store_ready = false;
        })
    }

    /// The reconnect loop lost the store. Phase is left untouched.
    pub fn connection_lost(&self) {
        let changed = self.tx.send_if_modified(|s| {
            let was = s.store_ready;
            s.store_ready = false;
            was
        });
        if changed {
            warn!("Store connection lost");
        }
    }

    /// The reconnect loop got the store back.
    pub fn connection_restored(&self) {
        let changed = self.tx.send_if_modified(|s| {
            if s.phase == HealthPhase::Failed || s.store_ready {
                return false;
            }
            s.store_ready = true;
            true
        });
        if changed {
            info!("Store connection restored");
        }
    }

    /// The subscription is gone for good. Phase is left untouched.
    pub fn subscription_closed(&self) {
        let changed = self.tx.send_if_modified(|s| {
            let was = s.worker_ready || s.store_ready;
            s.worker_ready = false;
            s.store_ready = false;
            was
        });
        if changed {
            warn!("Subscription closed, worker no longer processing");
        }
    }

    fn advance<F>(&self, target: HealthPhase, apply: F) -> Result<(), TransitionError>
    where
        F: FnOnce(&mut HealthSnapshot),
    {
        let mut result = Ok(());
        self.tx.send_if_modified(|s| {
            if !s.phase.can_transition_to(target) {
                result = Err(TransitionError {
                    from: s.phase,
                    to: target,
                });
                return false;
            }
            s.phase = target;
            apply(s);
            true
        });
        result
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}
