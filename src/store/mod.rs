//! Result persistence.

pub mod memory;
pub mod redis;
pub mod traits;

pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use traits::{ResultStore, values_key};
