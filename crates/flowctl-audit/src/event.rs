// crates/flowctl-audit/src/event.rs
// ============================================================================
// Module: Domain Events
// Description: Closed enum of every install, promotion, and execution
// outcome that gets audited.
// Purpose: Replace a stringly-typed `{type, status, entityId, ...}` map
// with one tagged variant per event kind, decoded once at construction.
// Dependencies: serde
// ============================================================================

use serde::Serialize;

/// Every auditable outcome the install engine, promotion pipeline, and
/// runner adapter can emit.
///
/// # Invariants
/// - Each variant's [`DomainEvent::event_type`] is a stable, dotted wire
///   name; renaming a variant must not change its `event_type` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A graph package install applied successfully.
    GraphPackageInstalled {
        /// Id of the `GraphPackageInstall` audit row.
        entity_id: String,
        /// Count of record types, bindings, and workflows applied.
        affected_records: u64,
    },
    /// A graph package install matched the latest checksum and made no
    /// writes.
    GraphPackageInstallNoop {
        /// Id of the project the install targeted.
        entity_id: String,
        /// Human-readable reason, e.g. "checksum unchanged".
        reason: String,
    },
    /// A graph package install was rejected by the version guard or an
    /// ownership conflict.
    GraphPackageInstallRejected {
        /// Id of the project the install targeted.
        entity_id: String,
        /// Human-readable rejection reason.
        reason: String,
    },
    /// A promotion intent moved to `previewed`.
    GraphPromotionIntentPreviewed {
        /// Id of the promotion intent.
        entity_id: String,
    },
    /// A promotion intent moved to `approved`.
    GraphPromotionIntentApproved {
        /// Id of the promotion intent.
        entity_id: String,
    },
    /// A promotion intent moved to `rejected`.
    GraphPromotionIntentRejected {
        /// Id of the promotion intent.
        entity_id: String,
    },
    /// A promotion intent moved to `executed`.
    GraphPromotionIntentExecuted {
        /// Id of the promotion intent.
        entity_id: String,
        /// Count of packages promoted.
        promoted: u64,
        /// Count of packages skipped (already current in the target).
        skipped: u64,
    },
    /// A promotion reviewer webhook POST succeeded.
    GraphPromotionNotificationSent {
        /// Id of the promotion intent.
        entity_id: String,
    },
    /// A promotion reviewer webhook POST failed; the transition proceeded
    /// regardless.
    GraphPromotionNotificationFailed {
        /// Id of the promotion intent.
        entity_id: String,
        /// Cause of the notification failure.
        error: String,
    },
    /// A package was generated by the authoring surface.
    VibePackageGenerated {
        /// Id of the generated package.
        entity_id: String,
    },
    /// A generated package was installed.
    VibePackageInstalled {
        /// Id of the generated package.
        entity_id: String,
    },
    /// A runner dispatch began.
    ExecutionStarted {
        /// Id of the execution.
        entity_id: String,
    },
    /// A runner dispatch completed successfully.
    ExecutionCompleted {
        /// Id of the execution.
        entity_id: String,
    },
    /// A runner dispatch failed.
    ExecutionFailed {
        /// Id of the execution.
        entity_id: String,
        /// Cause of the failure.
        error: String,
    },
}

impl DomainEvent {
    /// Returns the stable, dotted wire name for this event.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::GraphPackageInstalled { .. } => "graph.package_installed",
            Self::GraphPackageInstallNoop { .. } => "graph.package_install_noop",
            Self::GraphPackageInstallRejected { .. } => "graph.package_install_rejected",
            Self::GraphPromotionIntentPreviewed { .. } => "graph.promotion_intent_previewed",
            Self::GraphPromotionIntentApproved { .. } => "graph.promotion_intent_approved",
            Self::GraphPromotionIntentRejected { .. } => "graph.promotion_intent_rejected",
            Self::GraphPromotionIntentExecuted { .. } => "graph.promotion_intent_executed",
            Self::GraphPromotionNotificationSent { .. } => "graph.promotion_notification_sent",
            Self::GraphPromotionNotificationFailed { .. } => "graph.promotion_notification_failed",
            Self::VibePackageGenerated { .. } => "vibe.package_generated",
            Self::VibePackageInstalled { .. } => "vibe.package_installed",
            Self::ExecutionStarted { .. } => "execution_started",
            Self::ExecutionCompleted { .. } => "execution_completed",
            Self::ExecutionFailed { .. } => "execution_failed",
        }
    }

    /// Returns the entity id this event is about.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        match self {
            Self::GraphPackageInstalled { entity_id, .. }
            | Self::GraphPackageInstallNoop { entity_id, .. }
            | Self::GraphPackageInstallRejected { entity_id, .. }
            | Self::GraphPromotionIntentPreviewed { entity_id }
            | Self::GraphPromotionIntentApproved { entity_id }
            | Self::GraphPromotionIntentRejected { entity_id }
            | Self::GraphPromotionIntentExecuted { entity_id, .. }
            | Self::GraphPromotionNotificationSent { entity_id }
            | Self::GraphPromotionNotificationFailed { entity_id, .. }
            | Self::VibePackageGenerated { entity_id }
            | Self::VibePackageInstalled { entity_id }
            | Self::ExecutionStarted { entity_id }
            | Self::ExecutionCompleted { entity_id }
            | Self::ExecutionFailed { entity_id, .. } => entity_id,
        }
    }

    /// Returns the error cause carried by failure-shaped events, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::GraphPromotionNotificationFailed { error, .. } | Self::ExecutionFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}
