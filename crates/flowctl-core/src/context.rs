// crates/flowctl-core/src/context.rs
// ============================================================================
// Module: Flowctl Tenant & Module Context
// Description: Immutable request-scoped identity and scope carriers (C1).
// Purpose: Give every C3-C11 operation a single, unambiguous tenant/module
// identity to act under.
// Dependencies: crate::capability, crate::identifiers
// ============================================================================

//! ## Overview
//! [`TenantContext`] is constructed once at request ingress and passed by
//! value through every subsequent call; nothing in this crate or its
//! downstream consumers mutates it in place. [`ModuleExecutionContext`] nests
//! a `TenantContext` together with the module identity and resolved
//! capability profile a runner request executes under.
//!
//! [`SystemContext`] is a branded variant used only for platform-internal
//! sweeps (template registry reads, orphan-collector jobs) that carry no
//! tenant. It is only constructible through [`SystemContext::for_reason`],
//! which interns the result per human-readable reason in a process-wide
//! cache so repeated sweeps for the same reason do not allocate new system
//! identities.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::OnceLock;

use serde::Deserialize;
use serde::Serialize;

use crate::capability::Capability;
use crate::capability::CapabilityProfile;
use crate::identifiers::AgentId;
use crate::identifiers::ModuleId;
use crate::identifiers::TenantId;
use crate::identifiers::UserId;

// ============================================================================
// SECTION: Context Source
// ============================================================================

/// Provenance tag recorded on every [`TenantContext`] for audit purposes.
///
/// # Invariants
/// - Variants are stable for serialization and audit matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    /// The context was derived from an inbound request header.
    Header,
    /// The context was synthesized by a platform-internal system job.
    System,
    /// The context was constructed by an internal (non-request) caller.
    Internal,
}

// ============================================================================
// SECTION: Tenant Context
// ============================================================================

/// Immutable, request-scoped tenant identity.
///
/// # Invariants
/// - Never mutated after construction; passed by value through every call.
/// - `source` records provenance and is compared byte-for-byte at the
///   boundary guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Optional acting user identifier.
    pub user_id: Option<UserId>,
    /// Optional acting agent identifier.
    pub agent_id: Option<AgentId>,
    /// Provenance of this context.
    pub source: ContextSource,
}

impl TenantContext {
    /// Creates a new tenant context.
    #[must_use]
    pub const fn new(
        tenant_id: TenantId,
        user_id: Option<UserId>,
        agent_id: Option<AgentId>,
        source: ContextSource,
    ) -> Self {
        Self {
            tenant_id,
            user_id,
            agent_id,
            source,
        }
    }
}

// ============================================================================
// SECTION: System Context
// ============================================================================

/// Process-wide intern cache for [`SystemContext`] reasons.
///
/// # Invariants
/// - Keyed by the human-readable reason string; repeated calls with the same
///   reason return byte-identical contexts without growing the cache.
static SYSTEM_CONTEXT_CACHE: OnceLock<Mutex<HashMap<String, SystemContext>>> = OnceLock::new();

/// A branded context variant that carries no tenant but does carry an
/// implicit `SYSTEM_PRIVILEGED` capability set and a free-form reason.
///
/// # Invariants
/// - Only constructible through [`SystemContext::for_reason`].
/// - Always carries the `SYSTEM_PRIVILEGED` capability profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemContext {
    /// Human-readable reason for this system context's existence.
    reason: String,
    /// Capability profile granted to system contexts.
    capabilities: CapabilityProfile,
}

impl SystemContext {
    /// Returns the interned system context for the given reason, creating
    /// and caching it on first use.
    ///
    /// # Panics
    ///
    /// Panics if the process-wide intern cache's mutex is poisoned, which
    /// can only happen if a prior caller panicked while holding the lock.
    #[must_use]
    pub fn for_reason(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let cache = SYSTEM_CONTEXT_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
        let mut guard = cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard
            .entry(reason.clone())
            .or_insert_with(|| Self {
                reason,
                capabilities: CapabilityProfile::SystemPrivileged,
            })
            .clone()
    }

    /// Returns the reason this system context was created for.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the capability profile granted to this system context.
    #[must_use]
    pub const fn capability_profile(&self) -> CapabilityProfile {
        self.capabilities
    }

    /// Returns the capability tokens granted to this system context.
    #[must_use]
    pub fn capabilities(&self) -> Vec<Capability> {
        self.capabilities.tokens()
    }
}

// ============================================================================
// SECTION: Module Execution Context
// ============================================================================

/// The tenant + module + capabilities triple under which a runner request
/// executes.
///
/// # Invariants
/// - `tenant_context` must byte-equal the outer request's tenant context on
///   `tenant_id` and `source`; mismatches are a boundary violation (see
///   `flowctl-boundary`), not something this type enforces itself.
/// - `capabilities` is the concrete, ordered capability list resolved from
///   `capability_profile` at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleExecutionContext {
    /// The nested tenant context this module executes under.
    pub tenant_context: TenantContext,
    /// Identifier of the runner-executable module.
    pub module_id: ModuleId,
    /// Root path the module's file operations are scoped to.
    pub module_root_path: String,
    /// Name of the capability profile this context was built from.
    pub capability_profile: CapabilityProfile,
    /// Ordered set of capability tokens granted to this context.
    pub capabilities: Vec<Capability>,
}

impl ModuleExecutionContext {
    /// Builds a module execution context, resolving `profile` to its
    /// concrete capability list in one shot.
    #[must_use]
    pub fn new(
        tenant_context: TenantContext,
        module_id: ModuleId,
        module_root_path: impl Into<String>,
        profile: CapabilityProfile,
    ) -> Self {
        Self {
            tenant_context,
            module_id,
            module_root_path: module_root_path.into(),
            capability_profile: profile,
            capabilities: profile.tokens(),
        }
    }

    /// Returns true if every capability in `requested` is granted by this context.
    #[must_use]
    pub fn grants_all(&self, requested: &[Capability]) -> bool {
        requested.iter().all(|cap| self.capabilities.contains(cap))
    }
}
