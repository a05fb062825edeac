// crates/flowctl-promotion/src/lib.rs
// ============================================================================
// Module: Flowctl Promotion Library
// Description: The package-set promotion pipeline: environment diffing,
// the draft/previewed/approved/executed/rejected state machine, and
// best-effort reviewer notification.
// Purpose: Move an already-installed project package set from one named
// environment slot to another under explicit review, reusing the install
// engine rather than reimplementing it.
// Dependencies: flowctl-audit, flowctl-core, flowctl-graph, flowctl-install,
// flowctl-providers
// ============================================================================

//! ## Overview
//! This crate owns C9, the promotion pipeline. It never mutates a project's
//! graph directly; [`pipeline::execute_promotion`] delegates every package
//! mutation to [`flowctl_install::install_graph_package`] and only tracks
//! which packages are current in which environment via
//! [`row::EnvironmentPackageInstall`].

pub mod diff;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod row;
pub mod store;

pub use diff::diff_environments;
pub use diff::PackageDelta;
pub use diff::PromotionDiff;
pub use error::PromotionError;
pub use pipeline::approve_promotion;
pub use pipeline::execute_promotion;
pub use pipeline::preview_promotion;
pub use pipeline::reject_promotion;
pub use row::EnvironmentConfig;
pub use row::EnvironmentPackageInstall;
pub use row::NotificationStatus;
pub use row::PromotionIntent;
pub use row::PromotionResult;
pub use row::PromotionStatus;
pub use store::PromotionStore;
pub use store::PromotionStoreError;
