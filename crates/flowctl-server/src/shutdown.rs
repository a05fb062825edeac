// crates/flowctl-server/src/shutdown.rs
// ============================================================================
// Module: Graceful Shutdown
// Description: Waits for SIGINT or SIGTERM so the caller can pass this
// future to axum's `with_graceful_shutdown`.
// Purpose: Let in-flight `/execute` calls finish before the process exits.
// Dependencies: tokio
// ============================================================================

/// Resolves on the first `SIGINT` (`Ctrl+C`) or `SIGTERM`, whichever the
/// process receives first.
///
/// # Panics
///
/// Panics if installing either OS signal handler fails, which only happens
/// if the process has already exhausted its signal-handling resources.
#[allow(clippy::expect_used, reason = "an unhandled signal handler failure should abort startup loudly, not be swallowed")]
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
