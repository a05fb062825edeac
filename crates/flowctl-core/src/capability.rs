// crates/flowctl-core/src/capability.rs
// ============================================================================
// Module: Flowctl Capability System
// Description: Named permission tokens, static profile resolution, and
// assertion (C2).
// Purpose: Give every execution a concrete, auditable set of granted
// capabilities instead of ambient trust.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Capabilities are short, stable strings gating a single execution action.
//! [`CapabilityProfile`] is a compile-time constant bundle; resolving a
//! profile always returns a fresh `Vec<Capability>` so callers cannot
//! accidentally alias and mutate a shared list.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Capability Tokens
// ============================================================================

/// A named permission token gating a single execution action.
///
/// # Invariants
/// - The wire form (`fs:read`, `fs:write`, ...) is stable; it is emitted
///   verbatim in telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Read access to the module's file boundary.
    FsRead,
    /// Write access to the module's file boundary.
    FsWrite,
    /// Permission to run shell commands inside the module boundary.
    CmdRun,
    /// Permission to compute or read a git diff.
    GitDiff,
    /// Permission to make outbound HTTP requests.
    NetHttp,
}

impl Capability {
    /// Returns the wire-visible token for this capability.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FsRead => "fs:read",
            Self::FsWrite => "fs:write",
            Self::CmdRun => "cmd:run",
            Self::GitDiff => "git:diff",
            Self::NetHttp => "net:http",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Capability Profiles
// ============================================================================

/// A static, named bundle of capabilities.
///
/// # Invariants
/// - Profiles are compile-time constants; [`CapabilityProfile::tokens`]
///   always returns a freshly allocated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityProfile {
    /// Default profile for code-execution modules: full file and command access.
    CodeModuleDefault,
    /// Default profile for workflow-driving modules: file, command and network access.
    WorkflowModuleDefault,
    /// Read-only profile: filesystem reads only.
    ReadOnly,
    /// Platform-internal system profile: every capability granted.
    SystemPrivileged,
}

impl CapabilityProfile {
    /// Resolves this profile to its concrete, ordered capability list.
    #[must_use]
    pub fn tokens(self) -> Vec<Capability> {
        match self {
            Self::CodeModuleDefault => {
                vec![Capability::FsRead, Capability::FsWrite, Capability::CmdRun, Capability::GitDiff]
            }
            Self::WorkflowModuleDefault => {
                vec![Capability::FsRead, Capability::FsWrite, Capability::GitDiff, Capability::NetHttp]
            }
            Self::ReadOnly => vec![Capability::FsRead],
            Self::SystemPrivileged => vec![
                Capability::FsRead,
                Capability::FsWrite,
                Capability::CmdRun,
                Capability::GitDiff,
                Capability::NetHttp,
            ],
        }
    }

    /// Resolves a profile by its wire name.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityDenied`]'s sibling error when the name does not
    /// match a known profile.
    pub fn from_name(name: &str) -> Result<Self, UnknownCapabilityProfile> {
        match name {
            "CODE_MODULE_DEFAULT" => Ok(Self::CodeModuleDefault),
            "WORKFLOW_MODULE_DEFAULT" => Ok(Self::WorkflowModuleDefault),
            "READ_ONLY" => Ok(Self::ReadOnly),
            "SYSTEM_PRIVILEGED" => Ok(Self::SystemPrivileged),
            other => Err(UnknownCapabilityProfile {
                name: other.to_string(),
            }),
        }
    }
}

/// Error returned when a profile name does not resolve to a known profile.
#[derive(Debug, Error)]
#[error("unknown capability profile: {name}")]
pub struct UnknownCapabilityProfile {
    /// The unrecognized profile name.
    pub name: String,
}

// ============================================================================
// SECTION: Assertion
// ============================================================================

/// Error returned when a requested capability was not granted.
///
/// # Invariants
/// - Carries both the missing capability and the full granted set so callers
///   can render an actionable message without re-deriving context.
#[derive(Debug, Error)]
#[error("capability not granted: {missing} (granted: {granted:?})")]
pub struct CapabilityDenied {
    /// The capability that was requested but not granted.
    pub missing: Capability,
    /// The full set of capabilities that were granted.
    pub granted: Vec<Capability>,
}

/// Asserts that `granted` contains `requested`.
///
/// # Errors
///
/// Returns [`CapabilityDenied`] carrying the missing capability and the full
/// granted set when `requested` is not present in `granted`.
pub fn assert_capability(granted: &[Capability], requested: Capability) -> Result<(), CapabilityDenied> {
    if granted.contains(&requested) {
        Ok(())
    } else {
        Err(CapabilityDenied {
            missing: requested,
            granted: granted.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::assert_capability;
    use super::Capability;
    use super::CapabilityProfile;

    #[test]
    fn profile_resolution_returns_fresh_copies() {
        let a = CapabilityProfile::ReadOnly.tokens();
        let mut b = CapabilityProfile::ReadOnly.tokens();
        b.push(Capability::NetHttp);
        assert_eq!(a, vec![Capability::FsRead]);
        assert_ne!(a, b);
    }

    #[test]
    fn assert_capability_reports_missing_and_granted() {
        let granted = vec![Capability::FsRead, Capability::CmdRun];
        let err = assert_capability(&granted, Capability::FsWrite).unwrap_err();
        assert_eq!(err.missing, Capability::FsWrite);
        assert_eq!(err.granted, granted);
    }

    #[test]
    fn system_privileged_grants_every_capability() {
        let tokens = CapabilityProfile::SystemPrivileged.tokens();
        for cap in [
            Capability::FsRead,
            Capability::FsWrite,
            Capability::CmdRun,
            Capability::GitDiff,
            Capability::NetHttp,
        ] {
            assert!(tokens.contains(&cap));
        }
    }
}
