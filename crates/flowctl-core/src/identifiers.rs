// crates/flowctl-core/src/identifiers.rs
// ============================================================================
// Module: Flowctl Identifiers
// Description: Opaque string identifiers used throughout the execution and
// graph-install core.
// Purpose: Give every entity a strongly typed, serializable identifier
// instead of passing bare strings across crate boundaries.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every identifier in this module is an opaque wrapper around a `String`.
//! None of them validate or normalize their contents at construction time;
//! the boundary guard (`flowctl-boundary`) is the single place non-blank and
//! shape checks are enforced for identifiers that cross the control-plane
//! boundary. Treating identifiers as opaque here keeps this crate free of
//! policy decisions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Macro
// ============================================================================

macro_rules! opaque_string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true when the identifier is empty or all whitespace.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

// ============================================================================
// SECTION: Tenant & Module Identifiers
// ============================================================================

opaque_string_id!(
    /// Opaque tenant identifier.
    ///
    /// # Invariants
    /// - Non-blank tenant ids are enforced at the boundary guard, not here.
    TenantId
);

opaque_string_id!(
    /// Opaque identifier for a user account within a tenant.
    UserId
);

opaque_string_id!(
    /// Opaque identifier for an agent acting on behalf of a tenant.
    AgentId
);

opaque_string_id!(
    /// Opaque identifier for a runner-executable module.
    ModuleId
);

opaque_string_id!(
    /// Opaque identifier for a project within a tenant.
    ProjectId
);

opaque_string_id!(
    /// Opaque identifier for a change record driving a package install.
    ChangeId
);

opaque_string_id!(
    /// Opaque identifier for a named environment slot (`dev`, `test`, `prod`, ...).
    EnvironmentId
);

opaque_string_id!(
    /// Opaque key identifying a record type within a project's graph.
    ///
    /// # Invariants
    /// - Globally unique within a project once installed (enforced by the
    ///   install engine's ownership check, not by this type).
    RecordTypeKey
);

// ============================================================================
// SECTION: Workflow Identifiers
// ============================================================================

opaque_string_id!(
    /// Opaque identifier for a workflow definition.
    WorkflowDefinitionId
);

opaque_string_id!(
    /// Opaque identifier for a workflow step within a definition.
    WorkflowStepId
);

opaque_string_id!(
    /// Opaque identifier for a workflow execution.
    WorkflowExecutionId
);

opaque_string_id!(
    /// Opaque identifier for a single step execution within a workflow execution.
    WorkflowStepExecutionId
);

opaque_string_id!(
    /// Opaque identifier for a durable workflow execution intent.
    IntentId
);

// ============================================================================
// SECTION: Promotion Identifiers
// ============================================================================

opaque_string_id!(
    /// Opaque identifier for a promotion intent moving packages between environments.
    PromotionIntentId
);

// ============================================================================
// SECTION: Unit Tests
// ============================================================================
