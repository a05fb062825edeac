// crates/flowctl-providers/src/lib.rs
// ============================================================================
// Module: Flowctl Providers Library
// Description: Builds the blocking HTTP clients the remote runner adapter
// and the promotion webhook notifier share.
// Purpose: One place to configure timeouts, redirect policy, and the
// outbound user agent instead of repeating `reqwest::blocking::Client`
// builders at each call site.
// Dependencies: reqwest, thiserror
// ============================================================================

//! ## Overview
//! Every outbound HTTP call this workspace makes (the remote runner
//! adapter's dispatch request, the promotion pipeline's webhook POST) goes
//! through a client built by [`build_http_client`]. Redirects are disabled,
//! the timeout is explicit, and the user agent identifies the process.

pub mod http;

pub use http::build_http_client;
pub use http::HttpClientConfig;
pub use http::HttpClientError;
