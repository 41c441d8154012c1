//! Sequential message processor.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::channels::MessageStream;
use crate::compute::fib;
use crate::error::{MessageError, ProcessError};
use crate::store::ResultStore;

/// Parse a payload as a base-10 index.
///
/// Surrounding whitespace is ignored, a single leading sign is accepted, and
/// the longest run of leading digits wins (`"12abc"` is 12). A payload with
/// no leading digits, or one that does not fit an `i64`, is rejected.
pub fn parse_index(payload: &str) -> Result<i64, MessageError> {
    let not_a_number = || MessageError::NotANumber {
        payload: payload.to_string(),
    };

    let trimmed = payload.trim();
    let (sign_len, rest) = match trimmed.as_bytes().first() {
        Some(b'-') | Some(b'+') => (1, &trimmed[1..]),
        _ => (0, trimmed),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Err(not_a_number());
    }

    trimmed[..sign_len + digits]
        .parse()
        .map_err(|_| not_a_number())
}

/// A value that was computed and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Computed {
    pub index: i64,
    pub value: u64,
}

/// Counters reported when the subscription stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Messages computed and stored.
    pub processed: u64,
    /// Payloads dropped because they were not numbers.
    pub dropped: u64,
    /// Messages whose store write failed.
    pub failed: u64,
}

/// Handles subscription payloads against a result store.
pub struct Processor {
    store: Arc<dyn ResultStore>,
}

impl Processor {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    /// Parse, compute and persist a single payload.
    pub async fn handle(&self, payload: &str) -> Result<Computed, ProcessError> {
        let index = parse_index(payload)?;
        let value = fib(index);
        self.store.set_value(index, value).await?;
        info!("Calculated fib({index}) = {value}");
        Ok(Computed { index, value })
    }

    /// Consume `stream` until it ends.
    ///
    /// The next payload is not pulled until the current one has been fully
    /// handled. Malformed payloads are dropped and failed writes are logged;
    /// neither stops the loop.
    pub async fn run(&self, mut stream: MessageStream) -> RunSummary {
        let mut summary = RunSummary::default();

        while let Some(payload) = stream.next().await {
            match self.handle(&payload).await {
                Ok(computed) => {
                    debug!(index = computed.index, "Stored result");
                    summary.processed += 1;
                }
                Err(ProcessError::Parse(e)) => {
                    warn!(error = %e, "Dropping malformed payload");
                    summary.dropped += 1;
                }
                Err(ProcessError::Store(e)) => {
                    error!(error = %e, "Failed to store result, continuing");
                    summary.failed += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            dropped = summary.dropped,
            failed = summary.failed,
            "Subscription closed"
        );
        summary
    }
}
