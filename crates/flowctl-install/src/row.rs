// crates/flowctl-install/src/row.rs
// ============================================================================
// Module: Install Audit Row
// Description: The persisted, append-only record of a graph package install
// plus the pre-mutation snapshot kept for patch rollback.
// Purpose: Give the idempotency check, the ownership scan, and
// `executeChange`'s rollback path one durable shape each to read back.
// Dependencies: flowctl-core, flowctl-graph, serde_json
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use flowctl_core::ChangeId;
use flowctl_core::ProjectId;
use flowctl_core::RecordTypeKey;
use flowctl_core::Timestamp;
use flowctl_core::UserId;
use flowctl_graph::GraphPackage;

/// The append-only audit row created by a successful, non-preview install
/// (spec.md §3 `GraphPackageInstall`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPackageInstall {
    /// Identifier of this audit row.
    pub id: String,
    /// Project the install targeted.
    pub project_id: ProjectId,
    /// Key of the installed package.
    pub package_key: String,
    /// Installed version, as a string for storage portability.
    pub version: String,
    /// Hex SHA-256 checksum of the package's canonical serialization.
    pub checksum: String,
    /// Diff between the pre- and post-install snapshots.
    pub diff: Value,
    /// Full serialized package contents, kept so a later install's
    /// ownership scan can determine which package owns which record type
    /// or binding.
    pub package_contents: GraphPackage,
    /// Identifier of the caller who triggered this install.
    pub installed_by: Option<UserId>,
    /// When this install was applied.
    pub installed_at: Timestamp,
}

/// A pre-mutation snapshot of one record type's schema, captured before a
/// patch changes it, keyed by `(changeId, recordTypeKey)` (spec.md §3
/// `RecordTypeSnapshot`). `executeChange` rolls back to this shape on
/// partial-batch failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTypeSnapshot {
    /// Change this snapshot was captured for.
    pub change_id: ChangeId,
    /// Record type this snapshot captures.
    pub record_type_key: RecordTypeKey,
    /// Full prior schema, as the engine last saw it.
    pub prior_schema: Value,
}
