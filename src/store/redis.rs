//! Redis-backed store over the driver's connection manager.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};

use super::traits::{ResultStore, values_key};
use crate::error::{ConnectionError, StoreError};
use crate::reconnect::ReconnectPolicy;

/// Command connection to Redis.
///
/// `ConnectionManager` is cheap to clone and re-establishes the underlying
/// multiplexed connection on its own after a drop, paced by the same
/// [`ReconnectPolicy`] as the subscriber.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

/// Manager settings that hold the retry delay at the policy's fixed interval.
///
/// The driver always adds jitter on top, so each wait lands between one and
/// two times the configured delay.
pub fn manager_config(policy: &ReconnectPolicy) -> ConnectionManagerConfig {
    match policy {
        ReconnectPolicy::None => ConnectionManagerConfig::new().set_number_of_retries(0),
        ReconnectPolicy::Fixed {
            delay,
            max_attempts,
        } => {
            // A zero max delay would make the driver spin.
            let delay = (*delay).max(Duration::from_millis(1));
            let retries = max_attempts.map_or(usize::MAX, |max| max as usize);
            ConnectionManagerConfig::new()
                .set_exponent_base(1.0)
                .set_min_delay(delay)
                .set_max_delay(delay)
                .set_number_of_retries(retries)
        }
    }
}

impl RedisStore {
    /// Open the command connection. `target` only labels errors.
    ///
    /// The first connection is a single attempt; only once it succeeds does
    /// the manager take over re-establishing dropped connections.
    pub async fn connect(
        client: redis::Client,
        target: &str,
        policy: &ReconnectPolicy,
    ) -> Result<Self, ConnectionError> {
        let connect_error = |e: redis::RedisError| ConnectionError::Connect {
            target: target.to_string(),
            reason: e.to_string(),
        };

        let mut probe = client
            .get_multiplexed_async_connection()
            .await
            .map_err(connect_error)?;
        redis::cmd("PING")
            .query_async::<()>(&mut probe)
            .await
            .map_err(connect_error)?;

        // Lazy, so an unbounded retry budget never stalls startup here.
        let conn = ConnectionManager::new_lazy_with_config(client, manager_config(policy))
            .map_err(connect_error)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ResultStore for RedisStore {
    async fn set_value(&self, index: i64, value: u64) -> Result<(), StoreError> {
        let key = values_key(index);
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(&key, value.to_string())
            .await
            .map_err(|e| StoreError::Write {
                key,
                reason: e.to_string(),
            })
    }

    async fn get_value(&self, index: i64) -> Result<Option<String>, StoreError> {
        let key = values_key(index);
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(&key)
            .await
            .map_err(|e| StoreError::Read {
                key,
                reason: e.to_string(),
            })
    }
}
