// crates/flowctl-server/src/server.rs
// ============================================================================
// Module: Server Entry Point
// Description: Binds the router built from `AppState` to a TCP listener and
// serves it until a shutdown signal arrives.
// Purpose: Give the composition root one call (`Server::bind` then
// `serve`) instead of wiring axum's listener/shutdown plumbing itself.
// Dependencies: axum, tokio
// ============================================================================

use std::net::SocketAddr;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::routes::AppState;
use crate::shutdown::shutdown_signal;

/// Failure binding or running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding the TCP listener failed, typically because the port is
    /// already in use.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the listener attempted to bind.
        addr: SocketAddr,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The listener was bound but `axum::serve` itself returned an error.
    #[error("server exited with an error: {0}")]
    Serve(#[source] std::io::Error),
}

/// A bound, not-yet-serving HTTP server.
///
/// # Invariants
/// - Holds a live [`TcpListener`]; [`Self::serve`] consumes it exactly once.
pub struct Server {
    listener: TcpListener,
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Binds `addr` and prepares to serve `router` (from [`crate::build_router`]).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn bind(addr: SocketAddr, state: AppState) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self {
            listener,
            router: crate::build_router(state),
            addr,
        })
    }

    /// Returns the address this server is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves requests until a `SIGINT`/`SIGTERM` is received, then drains
    /// in-flight connections before returning.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Serve`] if the underlying accept loop fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        axum::serve(self.listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ServerError::Serve)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions use panic-based failure reporting")]

    use super::Server;
    use crate::readiness::AlwaysReady;
    use crate::routes::AppState;
    use flowctl_audit::LogEventSink;
    use flowctl_runner::LocalAdapter;
    use std::net::SocketAddr;
    use std::sync::Arc;

    #[tokio::test]
    async fn bind_resolves_an_ephemeral_port_to_a_concrete_address() {
        let state = AppState::new(Arc::new(LocalAdapter::new()), Arc::new(LogEventSink::new()), Arc::new(AlwaysReady), "local");
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = Server::bind(addr, state).await.unwrap();
        assert_ne!(server.local_addr().port(), 0);
    }
}
