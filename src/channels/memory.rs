//! In-process backend: a pub/sub hub plus a [`MemoryStore`].
//!
//! Mirrors Redis semantics closely enough for tests and local runs:
//! publishes reach only current subscribers, in order, and nothing is
//! buffered for a channel nobody listens to.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::forward::spawn_forwarder;
use super::{Backend, MessageStream};
use crate::error::ConnectionError;
use crate::health::HealthState;
use crate::reconnect::ReconnectPolicy;
use crate::store::{MemoryStore, ResultStore};

#[derive(Default)]
struct Hub {
    topics: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>,
    reachable: AtomicBool,
    refuse_subscriptions: AtomicBool,
}

impl Hub {
    fn open(&self, channel: &str) -> Result<MessageStream, ConnectionError> {
        if !self.reachable.load(Ordering::SeqCst)
            || self.refuse_subscriptions.load(Ordering::SeqCst)
        {
            return Err(ConnectionError::Unreachable(format!(
                "memory hub refused subscription to {channel}"
            )));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.topics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

/// In-memory [`Backend`].
#[derive(Clone)]
pub struct MemoryBackend {
    hub: Arc<Hub>,
    store: Arc<MemoryStore>,
    policy: ReconnectPolicy,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_policy(ReconnectPolicy::default())
    }

    pub fn with_policy(policy: ReconnectPolicy) -> Self {
        let hub = Hub::default();
        hub.reachable.store(true, Ordering::SeqCst);
        Self {
            hub: Arc::new(hub),
            store: Arc::new(MemoryStore::new()),
            policy,
        }
    }

    /// A backend that refuses every connection.
    pub fn unreachable() -> Self {
        let backend = Self::new();
        backend.set_reachable(false);
        backend
    }

    /// Toggle whether new connections succeed. Live subscriptions are untouched.
    pub fn set_reachable(&self, reachable: bool) {
        self.hub.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Refuse new subscriptions while the store keeps accepting connections.
    pub fn set_refuse_subscriptions(&self, refuse: bool) {
        self.hub.refuse_subscriptions.store(refuse, Ordering::SeqCst);
    }

    /// The shared store behind every `connect_store`.
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }

    /// Deliver `payload` to every live subscriber of `channel`.
    ///
    /// Returns the number of subscribers reached, like Redis `PUBLISH`.
    pub fn publish(&self, channel: &str, payload: impl Into<String>) -> usize {
        let payload = payload.into();
        let mut topics = self.hub.topics.lock().unwrap_or_else(|e| e.into_inner());
        let Some(subscribers) = topics.get_mut(channel) else {
            return 0;
        };
        subscribers.retain(|tx| tx.send(payload.clone()).is_ok());
        subscribers.len()
    }

    /// Sever every live subscription, as if the server closed the sockets.
    pub fn drop_subscriptions(&self) {
        self.hub
            .topics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn connect_store(&self) -> Result<Arc<dyn ResultStore>, ConnectionError> {
        if !self.hub.reachable.load(Ordering::SeqCst) {
            return Err(ConnectionError::Unreachable(
                "memory store refused connection".to_string(),
            ));
        }
        Ok(self.store())
    }

    async fn subscribe(
        &self,
        channel: &str,
        health: Arc<HealthState>,
    ) -> Result<MessageStream, ConnectionError> {
        let initial = self.hub.open(channel)?;

        let hub = Arc::clone(&self.hub);
        let name = channel.to_string();
        Ok(spawn_forwarder(
            channel.to_string(),
            initial,
            move || {
                let result = hub.open(&name);
                async move { result }
            },
            self.policy.clone(),
            health,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;

    use super::*;
    use crate::health::HealthPhase;

    fn ready_health() -> Arc<HealthState> {
        let health = Arc::new(HealthState::new());
        health.store_connected().unwrap();
        health.subscription_active().unwrap();
        health
    }

    #[tokio::test]
    async fn publish_without_subscribers_reaches_nobody() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.publish("insert", "1"), 0);
    }

    #[tokio::test]
    async fn delivers_in_order() {
        let backend = MemoryBackend::new();
        let mut stream = backend
            .subscribe("insert", Arc::new(HealthState::new()))
            .await
            .unwrap();

        for n in ["1", "2", "3"] {
            assert_eq!(backend.publish("insert", n), 1);
        }
        assert_eq!(backend.publish("other", "9"), 0);

        let got: Vec<String> = stream.by_ref().take(3).collect().await;
        assert_eq!(got, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn unreachable_refuses_everything() {
        let backend = MemoryBackend::unreachable();
        assert!(backend.connect_store().await.is_err());
        assert!(
            backend
                .subscribe("insert", Arc::new(HealthState::new()))
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_subscription_reconnects_and_reports_health() {
        let backend = MemoryBackend::with_policy(ReconnectPolicy::fixed(Duration::from_millis(1000)));
        let health = ready_health();
        let mut watch = health.watch();
        let mut stream = backend.subscribe("insert", Arc::clone(&health)).await.unwrap();

        backend.set_reachable(false);
        backend.drop_subscriptions();

        watch.wait_for(|s| !s.store_ready).await.unwrap();
        assert_eq!(health.snapshot().phase, HealthPhase::Ready);
        assert!(!health.snapshot().is_healthy());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert!(!health.snapshot().store_ready);

        backend.set_reachable(true);
        watch.wait_for(|s| s.store_ready).await.unwrap();
        assert!(health.snapshot().is_healthy());

        assert_eq!(backend.publish("insert", "7"), 1);
        assert_eq!(stream.next().await.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn refused_subscription_leaves_store_reachable() {
        let backend = MemoryBackend::new();
        backend.set_refuse_subscriptions(true);
        assert!(backend.connect_store().await.is_ok());
        assert!(matches!(
            backend.subscribe("insert", Arc::new(HealthState::new())).await,
            Err(ConnectionError::Unreachable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_policy_clears_worker_readiness() {
        let backend =
            MemoryBackend::with_policy(ReconnectPolicy::fixed_with_max(Duration::from_millis(100), 2));
        let health = ready_health();
        let mut watch = health.watch();
        let mut stream = backend.subscribe("insert", Arc::clone(&health)).await.unwrap();

        backend.set_refuse_subscriptions(true);
        backend.drop_subscriptions();

        watch.wait_for(|s| !s.worker_ready).await.unwrap();
        let snap = health.snapshot();
        assert!(!snap.store_ready);
        assert_eq!(snap.phase, HealthPhase::Ready);

        // The consumer sees the end of the stream.
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn dropping_stream_unsubscribes() {
        let backend = MemoryBackend::new();
        let stream = backend
            .subscribe("insert", Arc::new(HealthState::new()))
            .await
            .unwrap();
        drop(stream);

        // The forwarder notices on the next delivery and releases its receiver.
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if backend.publish("insert", "1") == 0 {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("subscription was never released");
    }
}
