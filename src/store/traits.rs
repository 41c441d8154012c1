//! `ResultStore` trait — the write side of the worker.

use async_trait::async_trait;

use crate::error::StoreError;

/// Key a computed value is stored under.
pub fn values_key(index: i64) -> String {
    format!("values.{index}")
}

/// Backend-agnostic key-value persistence for computed results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Write `value` under `values.<index>`, overwriting any previous value.
    async fn set_value(&self, index: i64, value: u64) -> Result<(), StoreError>;

    /// Read back the stored decimal string, if any.
    async fn get_value(&self, index: i64) -> Result<Option<String>, StoreError>;
}
