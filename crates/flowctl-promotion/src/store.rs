// crates/flowctl-promotion/src/store.rs
// ============================================================================
// Module: Promotion Store Trait
// Description: The tenant-scoped storage surface the promotion pipeline
// reads and writes through.
// Purpose: Let the state machine be tested against an in-memory fake and let
// `flowctl-store-sqlite` supply the real implementation.
// Dependencies: flowctl-core, crate::row, thiserror
// ============================================================================

use thiserror::Error;

use flowctl_core::EnvironmentId;
use flowctl_core::ProjectId;
use flowctl_core::PromotionIntentId;
use flowctl_core::TenantContext;

use crate::row::EnvironmentConfig;
use crate::row::EnvironmentPackageInstall;
use crate::row::PromotionIntent;

/// Error returned by a [`PromotionStore`] implementation.
#[derive(Debug, Error)]
#[error("promotion store error: {0}")]
pub struct PromotionStoreError(pub String);

/// The only storage surface the promotion pipeline consumes.
pub trait PromotionStore: Send + Sync {
    /// Returns the intent with `id`, if one exists for the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionStoreError`] on a storage failure.
    fn get_intent(&self, tenant: &TenantContext, id: &PromotionIntentId) -> Result<Option<PromotionIntent>, PromotionStoreError>;

    /// Persists a new `draft` intent.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionStoreError`] on a storage failure.
    fn create_intent(&self, tenant: &TenantContext, intent: &PromotionIntent) -> Result<(), PromotionStoreError>;

    /// Overwrites an existing intent's full state after a transition.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionStoreError`] on a storage failure.
    fn save_intent(&self, tenant: &TenantContext, intent: &PromotionIntent) -> Result<(), PromotionStoreError>;

    /// Returns the configuration for `environment_id`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionStoreError`] on a storage failure.
    fn get_environment(&self, tenant: &TenantContext, environment_id: &EnvironmentId) -> Result<Option<EnvironmentConfig>, PromotionStoreError>;

    /// Lists the packages currently considered installed in
    /// `(project_id, environment_id)`.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionStoreError`] on a storage failure.
    fn list_environment_installs(&self, tenant: &TenantContext, project_id: &ProjectId, environment_id: &EnvironmentId) -> Result<Vec<EnvironmentPackageInstall>, PromotionStoreError>;

    /// Upserts the "currently installed" row for one package in one
    /// environment, called once per promoted package after `execute`
    /// installs it.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionStoreError`] on a storage failure.
    fn record_environment_install(&self, tenant: &TenantContext, project_id: &ProjectId, install: &EnvironmentPackageInstall) -> Result<(), PromotionStoreError>;
}
