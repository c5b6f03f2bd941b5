//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for Ctrl+C and translate it to the internal shutdown signal

use crate::lifecycle::shutdown::Shutdown;

/// Wait for Ctrl+C, then trigger the shutdown coordinator.
pub async fn shutdown_on_ctrl_c(shutdown: std::sync::Arc<Shutdown>) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}
