//! Subscription channels and the backend seam.
//!
//! A [`Backend`] hands out the two logical connections the worker needs:
//! a [`ResultStore`] for writes and a [`MessageStream`] of raw payloads from
//! the pub/sub channel, in arrival order.

pub mod forward;
pub mod memory;
pub mod redis;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ConnectionError;
use crate::health::HealthState;
use crate::store::ResultStore;

pub use memory::MemoryBackend;
pub use redis::RedisBackend;

/// Raw text payloads received on a subscription.
pub type MessageStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Connection factory for the store and its pub/sub channel.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Open the command connection used for writes.
    async fn connect_store(&self) -> Result<Arc<dyn ResultStore>, ConnectionError>;

    /// Subscribe to `channel`.
    ///
    /// Post-connect drops are handled inside the returned stream, which
    /// reports them through `health`. Dropping the stream unsubscribes.
    async fn subscribe(
        &self,
        channel: &str,
        health: Arc<HealthState>,
    ) -> Result<MessageStream, ConnectionError>;
}
