//! Health aggregation — readiness flags and the `/health` endpoint.

pub mod routes;
pub mod state;

pub use routes::{health_routes, serve};
pub use state::{HealthPhase, HealthReport, HealthSnapshot, HealthState};
