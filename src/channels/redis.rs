//! Redis backend — command connection plus pub/sub subscriber.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::info;

use super::forward::spawn_forwarder;
use super::{Backend, MessageStream};
use crate::config::RedisConfig;
use crate::error::ConnectionError;
use crate::health::HealthState;
use crate::reconnect::ReconnectPolicy;
use crate::store::{RedisStore, ResultStore};

/// Redis connection factory.
pub struct RedisBackend {
    client: redis::Client,
    target: String,
    policy: ReconnectPolicy,
}

impl RedisBackend {
    /// Build a backend for `config`. No connection is made yet.
    pub fn new(config: &RedisConfig, policy: ReconnectPolicy) -> Result<Self, ConnectionError> {
        let target = format!("{}:{}", config.host, config.port);
        let client = redis::Client::open(config.url()).map_err(|e| ConnectionError::Connect {
            target: target.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            target,
            policy,
        })
    }
}

/// Open a dedicated pub/sub connection and subscribe to `channel`.
async fn open_subscription(
    client: redis::Client,
    channel: String,
) -> Result<MessageStream, ConnectionError> {
    let mut pubsub = client
        .get_async_pubsub()
        .await
        .map_err(|e| ConnectionError::Subscribe {
            channel: channel.clone(),
            reason: e.to_string(),
        })?;
    pubsub
        .subscribe(&channel)
        .await
        .map_err(|e| ConnectionError::Subscribe {
            channel: channel.clone(),
            reason: e.to_string(),
        })?;

    let stream = pubsub
        .into_on_message()
        .map(|msg| String::from_utf8_lossy(msg.get_payload_bytes()).into_owned());
    Ok(Box::pin(stream))
}

#[async_trait]
impl Backend for RedisBackend {
    fn name(&self) -> &str {
        "redis"
    }

    async fn connect_store(&self) -> Result<Arc<dyn ResultStore>, ConnectionError> {
        let store = RedisStore::connect(self.client.clone(), &self.target, &self.policy).await?;
        info!(target = %self.target, "Redis command connection open");
        Ok(Arc::new(store))
    }

    async fn subscribe(
        &self,
        channel: &str,
        health: Arc<HealthState>,
    ) -> Result<MessageStream, ConnectionError> {
        let initial = open_subscription(self.client.clone(), channel.to_string()).await?;
        info!(channel = %channel, "Subscribed");

        let client = self.client.clone();
        let name = channel.to_string();
        Ok(spawn_forwarder(
            channel.to_string(),
            initial,
            move || open_subscription(client.clone(), name.clone()),
            self.policy.clone(),
            health,
        ))
    }
}
