// crates/flowctl-boundary/src/request.rs
// ============================================================================
// Module: Flowctl Request Admission
// Description: Validates every ExecutionRequest at the control-plane to
// runner boundary, in a fixed, fail-fast order.
// Purpose: Fail closed on tenant mutation, capability elevation, or
// malformed context before any runner adapter sees the request.
// Dependencies: flowctl-core, thiserror
// ============================================================================

//! ## Overview
//! [`admit`] runs four checks in order and stops at the first failure:
//! 1. The outer tenant context is well-formed (non-blank tenant id, known
//!    source).
//! 2. The module execution context is well-formed (non-empty module id,
//!    root path, capability profile name).
//! 3. The module's nested tenant context byte-equals the outer one.
//! 4. Every requested capability is granted by the module context.
//!
//! Every failure is a typed [`BoundaryError`]; nothing here ever panics or
//! raises past this function's `Result` return.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use flowctl_core::capability::Capability;
use flowctl_core::capability::CapabilityDenied;
use flowctl_core::context::ContextSource;
use flowctl_core::execution::ExecutionRequest;

// ============================================================================
// SECTION: Boundary Error
// ============================================================================

/// Every way an [`ExecutionRequest`] can be rejected at the boundary.
///
/// # Invariants
/// - Variants are stable for programmatic handling, each with a distinct
///   wire-visible error code.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The outer tenant context had a blank tenant id.
    #[error("missing tenant context: tenant id is blank")]
    MissingTenantContext,
    /// The module execution context had an empty module id, root path, or
    /// capability profile.
    #[error("missing module context: {0}")]
    MissingModuleContext(&'static str),
    /// The module's nested tenant context did not match the outer one.
    #[error("tenant context mutation: {0}")]
    TenantContextMutation(&'static str),
    /// A requested capability was not granted to the module context.
    #[error("capability not granted: {0}")]
    CapabilityNotGranted(#[from] CapabilityDenied),
}

impl BoundaryError {
    /// Returns a stable, wire-visible error code for this rejection.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingTenantContext => "MISSING_TENANT_CONTEXT",
            Self::MissingModuleContext(_) => "MISSING_MODULE_CONTEXT",
            Self::TenantContextMutation(_) => "TENANT_CONTEXT_MUTATION",
            Self::CapabilityNotGranted(_) => "CAPABILITY_NOT_GRANTED",
        }
    }
}

// ============================================================================
// SECTION: Admission
// ============================================================================

/// Admits or rejects an [`ExecutionRequest`], running four checks in order:
/// tenant context well-formedness, module context well-formedness, tenant
/// context equality between the outer and nested contexts, and capability
/// grants.
///
/// # Errors
///
/// Returns the first [`BoundaryError`] encountered; later checks are not run
/// once an earlier one fails.
pub fn admit(request: &ExecutionRequest) -> Result<(), BoundaryError> {
    let outer = &request.tenant_context;
    if outer.tenant_id.is_blank() {
        return Err(BoundaryError::MissingTenantContext);
    }

    let module_ctx = &request.module_execution_context;
    if module_ctx.module_id.is_blank() {
        return Err(BoundaryError::MissingModuleContext("module id is blank"));
    }
    if module_ctx.module_root_path.trim().is_empty() {
        return Err(BoundaryError::MissingModuleContext("module root path is blank"));
    }

    let inner = &module_ctx.tenant_context;
    if inner.tenant_id != outer.tenant_id {
        return Err(BoundaryError::TenantContextMutation("tenantId mismatch"));
    }
    if !sources_equal(inner.source, outer.source) {
        return Err(BoundaryError::TenantContextMutation("source mismatch"));
    }

    for requested in &request.requested_capabilities {
        assert_granted(module_ctx.capabilities.as_slice(), *requested)?;
    }

    Ok(())
}

fn sources_equal(a: ContextSource, b: ContextSource) -> bool {
    matches!(
        (a, b),
        (ContextSource::Header, ContextSource::Header)
            | (ContextSource::System, ContextSource::System)
            | (ContextSource::Internal, ContextSource::Internal)
    )
}

fn assert_granted(granted: &[Capability], requested: Capability) -> Result<(), CapabilityDenied> {
    flowctl_core::capability::assert_capability(granted, requested)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic, reason = "test assertions use panic-based failure reporting")]

    use super::admit;
    use super::BoundaryError;
    use flowctl_core::capability::Capability;
    use flowctl_core::capability::CapabilityProfile;
    use flowctl_core::context::ContextSource;
    use flowctl_core::context::ModuleExecutionContext;
    use flowctl_core::context::TenantContext;
    use flowctl_core::execution::ExecutionRequest;
    use flowctl_core::execution::RequestedAction;
    use flowctl_core::identifiers::ModuleId;
    use flowctl_core::identifiers::TenantId;
    use serde_json::json;

    fn base_request(requested_capabilities: Vec<Capability>) -> ExecutionRequest {
        let tenant = TenantContext::new(TenantId::new("tenant-a"), None, None, ContextSource::Header);
        let module_ctx = ModuleExecutionContext::new(
            tenant.clone(),
            ModuleId::new("module-a"),
            "src/components",
            CapabilityProfile::CodeModuleDefault,
        );
        ExecutionRequest {
            tenant_context: tenant,
            module_execution_context: module_ctx,
            requested_action: RequestedAction::AgentTask { payload: json!({}) },
            requested_capabilities,
        }
    }

    #[test]
    fn well_formed_request_is_admitted() {
        let request = base_request(vec![Capability::FsRead]);
        assert!(admit(&request).is_ok());
    }

    #[test]
    fn blank_tenant_id_is_rejected() {
        let mut request = base_request(vec![]);
        request.tenant_context.tenant_id = TenantId::new("   ");
        let err = admit(&request).unwrap_err();
        assert!(matches!(err, BoundaryError::MissingTenantContext));
    }

    #[test]
    fn tenant_context_mutation_is_detected() {
        let mut request = base_request(vec![]);
        request.module_execution_context.tenant_context.tenant_id = TenantId::new("tenant-b");
        let err = admit(&request).unwrap_err();
        assert!(matches!(err, BoundaryError::TenantContextMutation(_)));
    }

    #[test]
    fn source_mutation_is_detected() {
        let mut request = base_request(vec![]);
        request.module_execution_context.tenant_context.source = ContextSource::System;
        let err = admit(&request).unwrap_err();
        assert!(matches!(err, BoundaryError::TenantContextMutation(_)));
    }

    #[test]
    fn ungranted_capability_is_rejected() {
        let request = base_request(vec![Capability::NetHttp]);
        let err = admit(&request).unwrap_err();
        match err {
            BoundaryError::CapabilityNotGranted(denied) => {
                assert_eq!(denied.missing, Capability::NetHttp);
                assert_eq!(denied.granted.len(), 4);
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn blank_module_root_path_is_rejected() {
        let mut request = base_request(vec![]);
        request.module_execution_context.module_root_path = "   ".to_string();
        let err = admit(&request).unwrap_err();
        assert!(matches!(err, BoundaryError::MissingModuleContext(_)));
    }
}
