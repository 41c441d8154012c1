//! Worker — turns subscription payloads into stored sequence values.
//!
//! - `processor` — parse, compute, persist; one message at a time
//! - `startup` — connect, subscribe, spawn the processor, drive health

pub mod processor;
pub mod startup;

pub use processor::{Computed, Processor, RunSummary, parse_index};
pub use startup::{launch, start};
