use std::sync::Arc;

use fib_worker::channels::RedisBackend;
use fib_worker::config::WorkerConfig;
use fib_worker::health::{self, HealthState};
use fib_worker::reconnect::ReconnectPolicy;
use fib_worker::worker;

#[tokio::main]
async fn main() -> fib_worker::error::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = WorkerConfig::from_env()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        redis = %config.redis.url(),
        channel = %config.channel,
        health_port = config.health_port,
        "fib-worker starting"
    );

    let health = Arc::new(HealthState::new());

    // ── Health endpoint ─────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.health_port)).await?;
    let health_state = Arc::clone(&health);
    tokio::spawn(async move {
        if let Err(e) = health::serve(listener, health_state).await {
            tracing::error!(error = %e, "Health server stopped");
        }
    });

    // ── Worker ──────────────────────────────────────────────────────────
    let policy = ReconnectPolicy::fixed(config.reconnect_delay);
    let worker_handle = match RedisBackend::new(&config.redis, policy) {
        Ok(backend) => worker::launch(&backend, &config.channel, Arc::clone(&health)).await,
        Err(e) => {
            tracing::error!(error = %e, "Invalid Redis client configuration");
            if let Err(e) = health.startup_failed() {
                tracing::warn!(error = %e, "Unexpected health transition");
            }
            None
        }
    };

    // Stay up until interrupted, degraded or not.
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    if let Some(handle) = worker_handle {
        handle.abort();
    }

    Ok(())
}
