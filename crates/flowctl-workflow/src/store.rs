// crates/flowctl-workflow/src/store.rs
// ============================================================================
// Module: Workflow Storage Facade Trait
// Description: The tenant-scoped storage surface the workflow engine reads
// and writes through.
// Purpose: Let the engine be tested against an in-memory fake and let
// `flowctl-store-sqlite` provide the real implementation, without the
// engine depending on a concrete database crate.
// Dependencies: flowctl-core, crate::types, crate::error
// ============================================================================

use flowctl_core::TenantContext;
use flowctl_core::WorkflowDefinitionId;
use flowctl_core::WorkflowExecutionId;
use flowctl_core::WorkflowStepExecutionId;

use crate::error::WorkflowError;
use crate::types::WorkflowDefinition;
use crate::types::WorkflowExecution;
use crate::types::WorkflowStep;
use crate::types::WorkflowStepExecution;

/// Outcome of attempting to acquire an advisory record lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLockOutcome {
    /// No lock existed; one was created for this execution.
    Acquired,
    /// A lock already existed (the call is a no-op either way).
    AlreadyExists,
}

/// The only storage surface the workflow engine consumes.
///
/// # Invariants
/// - Every read is scoped to the passed [`TenantContext`]; cross-tenant
///   reads are structurally impossible through this trait.
pub trait WorkflowStore: Send + Sync {
    /// Reads a workflow definition by id, scoped to the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on a storage failure.
    fn get_definition(
        &self,
        tenant: &TenantContext,
        id: &WorkflowDefinitionId,
    ) -> Result<Option<WorkflowDefinition>, WorkflowError>;

    /// Lists a definition's steps ordered by `orderIndex` ascending.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on a storage failure.
    fn list_steps(
        &self,
        tenant: &TenantContext,
        definition_id: &WorkflowDefinitionId,
    ) -> Result<Vec<WorkflowStep>, WorkflowError>;

    /// Persists a newly created execution row.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on a storage failure.
    fn create_execution(&self, execution: &WorkflowExecution) -> Result<(), WorkflowError>;

    /// Persists the current state of an existing execution row.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on a storage failure.
    fn update_execution(&self, execution: &WorkflowExecution) -> Result<(), WorkflowError>;

    /// Reads an execution by id, scoped to the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on a storage failure.
    fn get_execution(
        &self,
        tenant: &TenantContext,
        id: &WorkflowExecutionId,
    ) -> Result<Option<WorkflowExecution>, WorkflowError>;

    /// Persists a newly created step execution row.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on a storage failure.
    fn create_step_execution(&self, step_execution: &WorkflowStepExecution) -> Result<(), WorkflowError>;

    /// Persists the current state of an existing step execution row.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on a storage failure.
    fn update_step_execution(&self, step_execution: &WorkflowStepExecution) -> Result<(), WorkflowError>;

    /// Reads a step execution by id, scoped to the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on a storage failure.
    fn get_step_execution(
        &self,
        tenant: &TenantContext,
        id: &WorkflowStepExecutionId,
    ) -> Result<Option<WorkflowStepExecution>, WorkflowError>;

    /// Attempts to acquire the advisory lock on `(tenant, record_type_id,
    /// record_id)` for `execution_id`. An existing lock is left untouched
    /// either way.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on a storage failure.
    fn try_acquire_record_lock(
        &self,
        tenant: &TenantContext,
        record_type_id: &str,
        record_id: &str,
        execution_id: &WorkflowExecutionId,
    ) -> Result<RecordLockOutcome, WorkflowError>;

    /// Returns the execution id currently holding the lock on
    /// `(tenant, record_type_id, record_id)`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on a storage failure.
    fn record_lock_holder(
        &self,
        tenant: &TenantContext,
        record_type_id: &str,
        record_id: &str,
    ) -> Result<Option<WorkflowExecutionId>, WorkflowError>;

    /// Releases every advisory lock held by `execution_id`, called once an
    /// execution reaches a terminal status.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on a storage failure.
    fn release_locks_for_execution(&self, execution_id: &WorkflowExecutionId) -> Result<(), WorkflowError>;
}
