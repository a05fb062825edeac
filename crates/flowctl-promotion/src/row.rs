// crates/flowctl-promotion/src/row.rs
// ============================================================================
// Module: Promotion Rows
// Description: The persisted promotion intent, its terminal result, and the
// per-environment "currently installed" package rows it diffs.
// Purpose: Give the state machine and the diff function durable shapes to
// read and write.
// Dependencies: flowctl-core, flowctl-graph, serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use flowctl_core::EnvironmentId;
use flowctl_core::ProjectId;
use flowctl_core::PromotionIntentId;
use flowctl_core::Timestamp;
use flowctl_core::UserId;
use flowctl_graph::GraphPackage;

use crate::diff::PromotionDiff;

/// A promotion intent's position in its state machine (spec.md §4.9).
///
/// # Invariants
/// - `Executed` and `Rejected` are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionStatus {
    /// Freshly created; not yet previewed.
    Draft,
    /// A diff has been computed and attached.
    Previewed,
    /// A reviewer has approved execution.
    Approved,
    /// The package set was promoted. Terminal.
    Executed,
    /// The intent was rejected from a non-terminal state. Terminal.
    Rejected,
}

/// Delivery status of the best-effort reviewer webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    /// The webhook POST completed with a non-error response.
    Sent,
    /// The webhook POST failed, timed out, or no webhook was configured.
    Failed,
}

/// The outcome recorded on an `executed` intent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionResult {
    /// Package keys installed into the target environment.
    pub promoted: Vec<String>,
    /// Package keys already current in the target environment.
    pub skipped: Vec<String>,
}

/// A durable, state-machine-governed request to move a project's package
/// state from one environment to another (spec.md §3 `PromotionIntent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionIntent {
    /// Identifier of this intent.
    pub id: PromotionIntentId,
    /// Project whose package state is being promoted.
    pub project_id: ProjectId,
    /// Source environment.
    pub from_environment_id: EnvironmentId,
    /// Target environment.
    pub to_environment_id: EnvironmentId,
    /// Current state machine position.
    pub status: PromotionStatus,
    /// Diff attached by the most recent preview, if any.
    pub diff: Option<PromotionDiff>,
    /// Result attached once executed.
    pub result: Option<PromotionResult>,
    /// Identifier of the user who created this intent.
    pub created_by: Option<UserId>,
    /// Identifier of the user who approved this intent.
    pub approved_by: Option<UserId>,
    /// When this intent was approved.
    pub approved_at: Option<Timestamp>,
    /// Delivery status of the reviewer webhook, if one was attempted.
    pub notification_status: Option<NotificationStatus>,
}

/// The package currently considered "installed" in one environment
/// (spec.md §6 `environmentPackageInstalls`), distinct from the
/// project-scoped `graphPackageInstalls` audit log the install engine
/// appends to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentPackageInstall {
    /// Environment this row describes.
    pub environment_id: EnvironmentId,
    /// Key of the installed package.
    pub package_key: String,
    /// Installed version, as a string.
    pub version: String,
    /// Checksum of the installed package contents.
    pub checksum: String,
    /// Full package contents, passed to the install engine when this
    /// package is promoted into another environment.
    pub package_contents: GraphPackage,
}

/// Configuration for one named environment slot (spec.md §4.9
/// "Environments are named slots").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Identifier of this environment.
    pub id: EnvironmentId,
    /// Whether promotions into this environment require reviewer approval
    /// before `execute`.
    pub requires_promotion_approval: bool,
    /// Reviewer webhook URL, if configured.
    pub webhook_url: Option<String>,
}
