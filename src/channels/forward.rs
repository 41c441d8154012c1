//! Subscription forwarder with reconnect.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, warn};

use super::MessageStream;
use crate::error::ConnectionError;
use crate::health::HealthState;
use crate::reconnect::{self, ReconnectPolicy};

/// Forward `initial` into a fresh stream, re-subscribing through `resubscribe`
/// whenever the underlying subscription ends.
///
/// Store readiness drops while the subscription is down and comes back once a
/// new one is established. The forwarder stops when the returned stream is
/// dropped or the policy gives up; giving up also clears worker readiness.
pub fn spawn_forwarder<C, Fut>(
    channel: String,
    initial: MessageStream,
    mut resubscribe: C,
    policy: ReconnectPolicy,
    health: Arc<HealthState>,
) -> MessageStream
where
    C: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<MessageStream, ConnectionError>> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut current = initial;

        loop {
            loop {
                tokio::select! {
                    next = current.next() => match next {
                        Some(payload) => {
                            if tx.send(payload).is_err() {
                                return;
                            }
                        }
                        None => break,
                    },
                    _ = tx.closed() => {
                        debug!(channel = %channel, "Subscriber dropped, closing subscription");
                        return;
                    }
                }
            }

            health.connection_lost();
            warn!(channel = %channel, "Subscription connection dropped, reconnecting");

            let restored = tokio::select! {
                restored = reconnect::retry(&policy, &mut resubscribe) => restored,
                _ = tx.closed() => return,
            };

            match restored {
                Some(stream) => {
                    current = stream;
                    health.connection_restored();
                }
                None => {
                    error!(channel = %channel, "Reconnect policy exhausted, subscription closed");
                    health.subscription_closed();
                    return;
                }
            }
        }
    });

    Box::pin(UnboundedReceiverStream::new(rx))
}
