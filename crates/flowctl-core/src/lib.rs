// crates/flowctl-core/src/lib.rs
// ============================================================================
// Module: Flowctl Core Library
// Description: Tenant/module execution context, capability system, and the
// wire types shared by every runner-boundary and graph-install crate.
// Purpose: Give every downstream crate one canonical set of identifiers,
// contexts, and request/result envelopes to build against.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `flowctl-core` defines the immutable identity and scope carriers that flow
//! through every execution in the platform: [`TenantContext`],
//! [`SystemContext`], and [`ModuleExecutionContext`]. It also defines the
//! capability system (named permission tokens and static profiles) and the
//! [`ExecutionRequest`] / [`ExecutionResult`] envelope that crosses the
//! control-plane/runner boundary.
//!
//! Nothing in this crate performs I/O. Construction is the only mutation
//! point for every type here; once built, contexts and requests are passed by
//! value and never mutated in place.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod capability;
pub mod context;
pub mod execution;
pub mod hashing;
pub mod identifiers;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use capability::Capability;
pub use capability::CapabilityDenied;
pub use capability::CapabilityProfile;
pub use context::ContextSource;
pub use context::ModuleExecutionContext;
pub use context::SystemContext;
pub use context::TenantContext;
pub use execution::ExecutionRequest;
pub use execution::ExecutionResult;
pub use execution::RequestedAction;
pub use hashing::checksum;
pub use hashing::CanonicalizationError;
pub use identifiers::AgentId;
pub use identifiers::ChangeId;
pub use identifiers::EnvironmentId;
pub use identifiers::IntentId;
pub use identifiers::ModuleId;
pub use identifiers::PromotionIntentId;
pub use identifiers::ProjectId;
pub use identifiers::RecordTypeKey;
pub use identifiers::TenantId;
pub use identifiers::UserId;
pub use identifiers::WorkflowDefinitionId;
pub use identifiers::WorkflowExecutionId;
pub use identifiers::WorkflowStepExecutionId;
pub use identifiers::WorkflowStepId;
pub use time::Timestamp;
