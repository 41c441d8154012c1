//! Fib worker — pub/sub driven sequence computation with health reporting.

pub mod channels;
pub mod compute;
pub mod config;
pub mod error;
pub mod health;
pub mod reconnect;
pub mod store;
pub mod worker;
