// crates/flowctl-providers/src/http.rs
// ============================================================================
// Module: HTTP Client Construction
// Description: Builds a blocking reqwest client with an explicit timeout,
// redirects disabled, and an explicit user agent.
// Purpose: Shared construction point for the remote runner adapter and the
// promotion webhook notifier.
// Dependencies: reqwest, thiserror
// ============================================================================

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use thiserror::Error;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for an outbound HTTP client.
///
/// # Invariants
/// - Redirects are always disabled; a redirect response is returned to the
///   caller as-is rather than followed.
/// - `timeout` applies to the full request lifecycle, not just connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Request timeout, covering connect through body read.
    pub timeout: Duration,
    /// User agent string sent with every request.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(30_000),
            user_agent: "flowctl/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Client Construction
// ============================================================================

/// Error returned when the underlying reqwest client cannot be built.
#[derive(Debug, Error)]
#[error("failed to build http client: {0}")]
pub struct HttpClientError(#[from] reqwest::Error);

/// Builds a blocking HTTP client with no redirects, an explicit timeout, and
/// an explicit user agent.
///
/// # Errors
///
/// Returns [`HttpClientError`] when the TLS backend cannot be initialized.
pub fn build_http_client(config: &HttpClientConfig) -> Result<Client, HttpClientError> {
    Client::builder()
        .redirect(Policy::none())
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(HttpClientError)
}

#[cfg(test)]
mod tests {
    use super::build_http_client;
    use super::HttpClientConfig;
    use std::time::Duration;

    #[test]
    fn default_config_builds_a_client() {
        assert!(build_http_client(&HttpClientConfig::default()).is_ok());
    }

    #[test]
    fn custom_timeout_and_agent_build_a_client() {
        let config = HttpClientConfig {
            timeout: Duration::from_millis(500),
            user_agent: "flowctl-test/0.1".to_string(),
        };
        assert!(build_http_client(&config).is_ok());
    }
}
