// crates/flowctl-server/src/lib.rs
// ============================================================================
// Module: Flowctl Server Library
// Description: The control-plane-to-runner HTTP surface (spec.md §6).
// Purpose: Expose the runner adapter over `POST /execute` and a readiness
// probe over `GET /health`, nothing else.
// Dependencies: flowctl-audit, flowctl-core, flowctl-runner, axum, tokio
// ============================================================================

//! ## Overview
//! This crate is the thinnest possible wrapper around [`flowctl_runner`]'s
//! adapter trait: it decodes an [`flowctl_core::execution::ExecutionRequest`],
//! picks the adapter entry point matching its
//! [`flowctl_core::execution::RequestedAction`] variant, and serializes the
//! [`flowctl_core::execution::ExecutionResult`] back. Boundary admission
//! (tenant/capability checks) happens inside the adapter itself, not here,
//! and a malformed or unadmitted request still returns `200` with
//! `success: false`, matching [`flowctl_runner::RunnerAdapter`]'s contract
//! that nothing past the boundary ever raises. This surface only returns
//! `400` for requests so malformed they cannot be decoded into an
//! [`flowctl_core::execution::ExecutionRequest`] at all.
//!
//! [`Server`] owns the listener and graceful-shutdown wiring; the
//! composition root builds an [`AppState`] and calls [`Server::bind`] then
//! [`Server::serve`].

pub mod readiness;
pub mod routes;
pub mod server;
pub mod shutdown;

pub use readiness::ReadinessProbe;
pub use routes::build_router;
pub use routes::AppState;
pub use server::Server;
pub use server::ServerError;
pub use shutdown::shutdown_signal;
