//! # Shutdown Coordinator
//!
//! Converts termination signals into the cooperative shutdown flag and
//! performs ordered teardown once the relay loop has drained. The signal
//! task does nothing but log and set the flag, so it never races with an
//! in-flight transaction or publish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sqlx::PgPool;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::info;

use crate::broker::BrokerManager;
use crate::error::RelayError;

/// Spawn a task that sets the shutdown flag on SIGINT, SIGTERM, or SIGQUIT.
///
/// All three signals map to the same graceful path: the relay loop finishes
/// its current iteration and exits at the top of the next one.
pub fn spawn_signal_listener(flag: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let signal_name = wait_for_termination().await;
        info!(signal = signal_name, "termination signal received, finishing current batch");
        flag.store(true, Ordering::SeqCst);
    })
}

async fn wait_for_termination() -> &'static str {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    let quit = async {
        signal::unix::signal(signal::unix::SignalKind::quit())
            .expect("Failed to install SIGQUIT handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    #[cfg(not(unix))]
    let quit = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
        _ = quit => "SIGQUIT",
    }
}

/// Ordered teardown after the loop exits: publish channel, broker
/// connection, then database pool. Sequential, and a failure maps to a
/// failing exit status in the binary.
pub async fn cleanup(broker: &BrokerManager, pool: &PgPool) -> Result<(), RelayError> {
    info!("closing broker channel and connection");
    broker
        .close()
        .await
        .map_err(|e| RelayError::cleanup("broker", e.to_string()))?;

    info!("closing database pool");
    pool.close().await;

    info!("cleanup complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flag_starts_unset_and_listener_spawns() {
        let flag = Arc::new(AtomicBool::new(false));
        let handle = spawn_signal_listener(Arc::clone(&flag));

        // No signal delivered: the flag must stay unset.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(!flag.load(Ordering::SeqCst));

        handle.abort();
    }
}
