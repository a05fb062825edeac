// crates/flowctl-config/src/lib.rs
// ============================================================================
// Module: Flowctl Config Library
// Description: Canonical environment-variable configuration for the runner
// adapter and HTTP surface.
// Purpose: Give the composition root one typed config struct instead of
// scattered `std::env::var` calls.
// Dependencies: flowctl-core, serde, thiserror
// ============================================================================

//! ## Overview
//! `flowctl-config` resolves the runner adapter and HTTP surface's
//! environment variables into a single [`RunnerConfig`] / [`ServerConfig`]
//! pair, each with typed defaults. Resolution happens once per process, at
//! composition-root startup (`flowctl-cli`, `flowctl-server`), not scattered
//! through engine code.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env::VarError;
use std::time::Duration;

use thiserror::Error;

// ============================================================================
// SECTION: Runner Adapter Kind
// ============================================================================

/// Which runner adapter variant the process resolves to.
///
/// # Invariants
/// - Resolved once per process from `RUNNER_ADAPTER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerAdapterKind {
    /// In-process local adapter.
    Local,
    /// HTTP-dispatching remote adapter.
    Remote,
}

impl RunnerAdapterKind {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(ConfigError::InvalidValue {
                var: "RUNNER_ADAPTER",
                value: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// SECTION: Runner Config
// ============================================================================

/// Resolved runner adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Which adapter variant to construct.
    pub adapter: RunnerAdapterKind,
    /// Base URL the remote adapter POSTs execution requests to.
    pub runner_url: String,
    /// Per-request timeout for the remote adapter.
    pub timeout: Duration,
    /// Port the runner's own HTTP surface listens on.
    pub runner_port: u16,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            adapter: RunnerAdapterKind::Local,
            runner_url: "http://localhost:4001".to_string(),
            timeout: Duration::from_millis(30_000),
            runner_port: 4001,
        }
    }
}

impl RunnerConfig {
    /// Resolves runner configuration from the process environment, falling
    /// back to the documented defaults for any unset variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name))
    }

    /// Resolves runner configuration from an injectable lookup function,
    /// used by tests to avoid mutating the real process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Result<String, VarError>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let adapter = match lookup("RUNNER_ADAPTER") {
            Ok(raw) => RunnerAdapterKind::parse(&raw)?,
            Err(VarError::NotPresent) => defaults.adapter,
            Err(VarError::NotUnicode(_)) => {
                return Err(ConfigError::InvalidValue {
                    var: "RUNNER_ADAPTER",
                    value: "<non-unicode>".to_string(),
                });
            }
        };

        let runner_url = match lookup("RUNNER_URL") {
            Ok(raw) => raw,
            Err(VarError::NotPresent) => defaults.runner_url,
            Err(VarError::NotUnicode(_)) => {
                return Err(ConfigError::InvalidValue {
                    var: "RUNNER_URL",
                    value: "<non-unicode>".to_string(),
                });
            }
        };

        let timeout = match lookup("RUNNER_TIMEOUT_MS") {
            Ok(raw) => Duration::from_millis(parse_u64("RUNNER_TIMEOUT_MS", &raw)?),
            Err(VarError::NotPresent) => defaults.timeout,
            Err(VarError::NotUnicode(_)) => {
                return Err(ConfigError::InvalidValue {
                    var: "RUNNER_TIMEOUT_MS",
                    value: "<non-unicode>".to_string(),
                });
            }
        };

        let runner_port = match lookup("RUNNER_PORT") {
            Ok(raw) => parse_port("RUNNER_PORT", &raw)?,
            Err(VarError::NotPresent) => defaults.runner_port,
            Err(VarError::NotUnicode(_)) => {
                return Err(ConfigError::InvalidValue {
                    var: "RUNNER_PORT",
                    value: "<non-unicode>".to_string(),
                });
            }
        };

        Ok(Self {
            adapter,
            runner_url,
            timeout,
            runner_port,
        })
    }
}

// ============================================================================
// SECTION: Server Config
// ============================================================================

/// Resolved control-plane HTTP server configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Port the control plane listens on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

impl ServerConfig {
    /// Resolves server configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `PORT` is set but not a valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name))
    }

    /// Resolves server configuration from an injectable lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `PORT` is set but not a valid port number.
    pub fn from_lookup(lookup: impl Fn(&str) -> Result<String, VarError>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Ok(raw) => parse_port("PORT", &raw)?,
            Err(VarError::NotPresent) => Self::default().port,
            Err(VarError::NotUnicode(_)) => {
                return Err(ConfigError::InvalidValue {
                    var: "PORT",
                    value: "<non-unicode>".to_string(),
                });
            }
        };
        Ok(Self { port })
    }
}

// ============================================================================
// SECTION: Parsing Helpers
// ============================================================================

fn parse_u64(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
    })
}

fn parse_port(var: &'static str, raw: &str) -> Result<u16, ConfigError> {
    raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
    })
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Error returned when an environment variable is set but invalid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The named variable's value did not parse.
    #[error("invalid value for {var}: {value}")]
    InvalidValue {
        /// Name of the offending environment variable.
        var: &'static str,
        /// The value that failed to parse.
        value: String,
    },
}
