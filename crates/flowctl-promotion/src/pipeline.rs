// crates/flowctl-promotion/src/pipeline.rs
// ============================================================================
// Module: Promotion State Machine
// Description: The four transitions a `PromotionIntent` can make
// (draft -> previewed -> approved -> executed, with rejection from any
// non-terminal state), per spec.md §4.9.
// Purpose: Enforce the transition diagram in one place and drive the diff,
// notification, and install steps each transition requires.
// Dependencies: crate::diff, crate::notify, crate::row, crate::store,
// flowctl-audit, flowctl-core, flowctl-install
// ============================================================================

use flowctl_audit::DomainEvent;
use flowctl_audit::DomainEventSink;
use flowctl_core::PromotionIntentId;
use flowctl_core::TenantContext;
use flowctl_core::Timestamp;
use flowctl_core::UserId;
use flowctl_install::InstallOptions;

use crate::diff::diff_environments;
use crate::error::PromotionError;
use crate::notify;
use crate::row::NotificationStatus;
use crate::row::PromotionIntent;
use crate::row::PromotionResult;
use crate::row::PromotionStatus;
use crate::store::PromotionStore;

/// Computes the diff between the source and target environments and
/// attaches it to the intent, moving it from `draft` (or re-previewing from
/// `previewed`) and, if the target environment has a webhook configured,
/// notifying its reviewer best-effort (spec.md §4.9 "preview").
///
/// # Errors
///
/// Returns [`PromotionError::NotFound`] if no such intent exists,
/// [`PromotionError::InvalidTransition`] if the intent is `approved`,
/// `executed`, or `rejected`, or a store error.
pub fn preview_promotion(store: &dyn PromotionStore, events: &dyn DomainEventSink, tenant: &TenantContext, intent_id: &PromotionIntentId, now: Timestamp) -> Result<PromotionIntent, PromotionError> {
    let mut intent = store.get_intent(tenant, intent_id).map_err(|err| PromotionError::Store(err.0))?.ok_or(PromotionError::NotFound)?;

    if !matches!(intent.status, PromotionStatus::Draft | PromotionStatus::Previewed) {
        return Err(PromotionError::InvalidTransition { from: intent.status, attempted: "preview" });
    }

    let source = store
        .list_environment_installs(tenant, &intent.project_id, &intent.from_environment_id)
        .map_err(|err| PromotionError::Store(err.0))?;
    let target = store
        .list_environment_installs(tenant, &intent.project_id, &intent.to_environment_id)
        .map_err(|err| PromotionError::Store(err.0))?;
    let diff = diff_environments(&source, &target);

    intent.diff = Some(diff.clone());
    intent.status = PromotionStatus::Previewed;

    let target_env = store.get_environment(tenant, &intent.to_environment_id).map_err(|err| PromotionError::Store(err.0))?;
    if let Some(webhook_url) = target_env.and_then(|env| env.webhook_url) {
        let payload = notify::approval_required_payload(
            &intent.id,
            intent.project_id.as_str(),
            intent.from_environment_id.as_str(),
            intent.to_environment_id.as_str(),
            intent.created_by.as_ref().map(UserId::as_str),
            &serde_json::to_value(&diff).unwrap_or_default(),
            now.as_unix_millis(),
        );
        match notify::notify_reviewer(&webhook_url, &payload) {
            Ok(()) => {
                intent.notification_status = Some(NotificationStatus::Sent);
                events.emit(DomainEvent::GraphPromotionNotificationSent { entity_id: intent.id.as_str().to_string() });
            }
            Err(error) => {
                intent.notification_status = Some(NotificationStatus::Failed);
                events.emit(DomainEvent::GraphPromotionNotificationFailed { entity_id: intent.id.as_str().to_string(), error });
            }
        }
    }

    store.save_intent(tenant, &intent).map_err(|err| PromotionError::Store(err.0))?;
    events.emit(DomainEvent::GraphPromotionIntentPreviewed { entity_id: intent.id.as_str().to_string() });
    Ok(intent)
}

/// Records reviewer approval, moving a `previewed` intent to `approved`
/// (spec.md §4.9 "approve").
///
/// # Errors
///
/// Returns [`PromotionError::NotFound`] if no such intent exists,
/// [`PromotionError::InvalidTransition`] if the intent is not `previewed`,
/// or a store error.
pub fn approve_promotion(store: &dyn PromotionStore, events: &dyn DomainEventSink, tenant: &TenantContext, intent_id: &PromotionIntentId, approved_by: Option<UserId>, now: Timestamp) -> Result<PromotionIntent, PromotionError> {
    let mut intent = store.get_intent(tenant, intent_id).map_err(|err| PromotionError::Store(err.0))?.ok_or(PromotionError::NotFound)?;

    if intent.status != PromotionStatus::Previewed {
        return Err(PromotionError::InvalidTransition { from: intent.status, attempted: "approve" });
    }

    intent.status = PromotionStatus::Approved;
    intent.approved_by = approved_by;
    intent.approved_at = Some(now);

    store.save_intent(tenant, &intent).map_err(|err| PromotionError::Store(err.0))?;
    events.emit(DomainEvent::GraphPromotionIntentApproved { entity_id: intent.id.as_str().to_string() });
    Ok(intent)
}

/// Rejects an intent from any non-terminal status (spec.md §4.9 "reject").
///
/// # Errors
///
/// Returns [`PromotionError::NotFound`] if no such intent exists,
/// [`PromotionError::InvalidTransition`] if the intent is already `executed`
/// or `rejected`, or a store error.
pub fn reject_promotion(store: &dyn PromotionStore, events: &dyn DomainEventSink, tenant: &TenantContext, intent_id: &PromotionIntentId) -> Result<PromotionIntent, PromotionError> {
    let mut intent = store.get_intent(tenant, intent_id).map_err(|err| PromotionError::Store(err.0))?.ok_or(PromotionError::NotFound)?;

    if matches!(intent.status, PromotionStatus::Executed | PromotionStatus::Rejected) {
        return Err(PromotionError::InvalidTransition { from: intent.status, attempted: "reject" });
    }

    intent.status = PromotionStatus::Rejected;
    store.save_intent(tenant, &intent).map_err(|err| PromotionError::Store(err.0))?;
    events.emit(DomainEvent::GraphPromotionIntentRejected { entity_id: intent.id.as_str().to_string() });
    Ok(intent)
}

/// Installs every package in the attached diff's `to_install` list into the
/// target environment, then records the result and moves the intent to
/// `executed` (spec.md §4.9 "execute"). Reuses
/// [`flowctl_install::install_graph_package`] per package rather than
/// reimplementing install logic; aborts on the first package that fails.
///
/// # Errors
///
/// Returns [`PromotionError::NotFound`] if no such intent exists,
/// [`PromotionError::InvalidTransition`] if the intent is not `approved`,
/// [`PromotionError::Install`] if a package install fails, or a store error.
#[allow(clippy::too_many_arguments, reason = "threads every caller-supplied collaborator and identity explicitly")]
pub fn execute_promotion(
    store: &dyn PromotionStore,
    graph_store: &dyn flowctl_graph::GraphStore,
    install_store: &dyn flowctl_install::InstallStore,
    events: &dyn DomainEventSink,
    tenant: &TenantContext,
    intent_id: &PromotionIntentId,
    mut install_id_for: impl FnMut(&str) -> String,
    now: Timestamp,
) -> Result<PromotionIntent, PromotionError> {
    let mut intent = store.get_intent(tenant, intent_id).map_err(|err| PromotionError::Store(err.0))?.ok_or(PromotionError::NotFound)?;

    if intent.status != PromotionStatus::Approved {
        return Err(PromotionError::InvalidTransition { from: intent.status, attempted: "execute" });
    }

    let diff = intent.diff.clone().unwrap_or_default();
    let source_installs = store
        .list_environment_installs(tenant, &intent.project_id, &intent.from_environment_id)
        .map_err(|err| PromotionError::Store(err.0))?;

    let mut promoted = Vec::new();
    for delta in &diff.to_install {
        let Some(source_install) = source_installs.iter().find(|install| install.package_key == delta.package_key) else {
            continue;
        };

        let install_id = install_id_for(&delta.package_key);
        let report = flowctl_install::install_graph_package(
            graph_store,
            install_store,
            events,
            tenant,
            &intent.project_id,
            &source_install.package_contents,
            InstallOptions::default(),
            intent.approved_by.clone(),
            install_id,
            now,
        )?;

        if !report.success {
            return Err(PromotionError::Install(flowctl_install::InstallError::Store(report.reason.unwrap_or_else(|| "install rejected during promotion".to_string()))));
        }

        store
            .record_environment_install(tenant, &intent.project_id, &crate::row::EnvironmentPackageInstall {
                environment_id: intent.to_environment_id.clone(),
                package_key: source_install.package_key.clone(),
                version: source_install.version.clone(),
                checksum: source_install.checksum.clone(),
                package_contents: source_install.package_contents.clone(),
            })
            .map_err(|err| PromotionError::Store(err.0))?;

        promoted.push(delta.package_key.clone());
    }

    intent.result = Some(PromotionResult { promoted: promoted.clone(), skipped: diff.up_to_date.clone() });
    intent.status = PromotionStatus::Executed;
    store.save_intent(tenant, &intent).map_err(|err| PromotionError::Store(err.0))?;

    events.emit(DomainEvent::GraphPromotionIntentExecuted {
        entity_id: intent.id.as_str().to_string(),
        #[allow(clippy::cast_possible_truncation, reason = "promotion batches are bounded by a project's package count")]
        promoted: promoted.len() as u64,
        #[allow(clippy::cast_possible_truncation, reason = "promotion batches are bounded by a project's package count")]
        skipped: diff.up_to_date.len() as u64,
    });

    Ok(intent)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "test assertions use panic-based failure reporting")]

    use std::cell::RefCell;
    use std::collections::HashMap;

    use flowctl_audit::sink::ChannelEventSink;
    use flowctl_core::EnvironmentId;
    use flowctl_core::ProjectId;
    use flowctl_core::TenantContext;
    use flowctl_graph::GraphPackage;
    use flowctl_graph::PackageVersion;

    use super::approve_promotion;
    use super::preview_promotion;
    use super::reject_promotion;
    use crate::row::EnvironmentConfig;
    use crate::row::EnvironmentPackageInstall;
    use crate::row::PromotionIntent;
    use crate::row::PromotionStatus;
    use crate::store::PromotionStore;
    use crate::store::PromotionStoreError;

    struct FakeStore {
        intents: RefCell<HashMap<String, PromotionIntent>>,
        environments: RefCell<HashMap<String, EnvironmentConfig>>,
        installs: RefCell<HashMap<String, Vec<EnvironmentPackageInstall>>>,
    }

    impl PromotionStore for FakeStore {
        fn get_intent(&self, _tenant: &TenantContext, id: &flowctl_core::PromotionIntentId) -> Result<Option<PromotionIntent>, PromotionStoreError> {
            Ok(self.intents.borrow().get(id.as_str()).cloned())
        }

        fn create_intent(&self, _tenant: &TenantContext, intent: &PromotionIntent) -> Result<(), PromotionStoreError> {
            self.intents.borrow_mut().insert(intent.id.as_str().to_string(), intent.clone());
            Ok(())
        }

        fn save_intent(&self, _tenant: &TenantContext, intent: &PromotionIntent) -> Result<(), PromotionStoreError> {
            self.intents.borrow_mut().insert(intent.id.as_str().to_string(), intent.clone());
            Ok(())
        }

        fn get_environment(&self, _tenant: &TenantContext, environment_id: &EnvironmentId) -> Result<Option<EnvironmentConfig>, PromotionStoreError> {
            Ok(self.environments.borrow().get(environment_id.as_str()).cloned())
        }

        fn list_environment_installs(&self, _tenant: &TenantContext, _project_id: &ProjectId, environment_id: &EnvironmentId) -> Result<Vec<EnvironmentPackageInstall>, PromotionStoreError> {
            Ok(self.installs.borrow().get(environment_id.as_str()).cloned().unwrap_or_default())
        }

        fn record_environment_install(&self, _tenant: &TenantContext, _project_id: &ProjectId, install: &EnvironmentPackageInstall) -> Result<(), PromotionStoreError> {
            self.installs.borrow_mut().entry(install.environment_id.as_str().to_string()).or_default().push(install.clone());
            Ok(())
        }
    }

    fn install(env: &str, package_key: &str) -> EnvironmentPackageInstall {
        EnvironmentPackageInstall {
            environment_id: EnvironmentId::new(env),
            package_key: package_key.to_string(),
            version: "1.0.0".to_string(),
            checksum: "abc".to_string(),
            package_contents: GraphPackage {
                package_key: package_key.to_string(),
                version: PackageVersion::new(1, 0, 0),
                depends_on: vec![],
                record_types: vec![],
                sla_policies: vec![],
                assignment_rules: vec![],
                workflows: vec![],
            },
        }
    }

    fn tenant() -> TenantContext {
        TenantContext::new(flowctl_core::TenantId::new("tenant-a"), None, None, flowctl_core::ContextSource::Internal)
    }

    fn draft_intent() -> PromotionIntent {
        PromotionIntent {
            id: flowctl_core::PromotionIntentId::new("intent-1"),
            project_id: ProjectId::new("proj-a"),
            from_environment_id: EnvironmentId::new("dev"),
            to_environment_id: EnvironmentId::new("prod"),
            status: PromotionStatus::Draft,
            diff: None,
            result: None,
            created_by: None,
            approved_by: None,
            approved_at: None,
            notification_status: None,
        }
    }

    #[test]
    fn preview_attaches_a_diff_and_advances_status() {
        let store = FakeStore {
            intents: RefCell::new(HashMap::from([("intent-1".to_string(), draft_intent())])),
            environments: RefCell::new(HashMap::new()),
            installs: RefCell::new(HashMap::from([("dev".to_string(), vec![install("dev", "hr.lite")])])),
        };
        let (events, _receiver) = ChannelEventSink::new(16);

        let intent = preview_promotion(&store, &events, &tenant(), &flowctl_core::PromotionIntentId::new("intent-1"), flowctl_core::Timestamp::from_unix_millis(0)).expect("preview succeeds");

        assert_eq!(intent.status, PromotionStatus::Previewed);
        assert_eq!(intent.diff.expect("diff attached").to_install.len(), 1);
    }

    #[test]
    fn approve_requires_a_previewed_intent() {
        let store = FakeStore {
            intents: RefCell::new(HashMap::from([("intent-1".to_string(), draft_intent())])),
            environments: RefCell::new(HashMap::new()),
            installs: RefCell::new(HashMap::new()),
        };
        let (events, _receiver) = ChannelEventSink::new(16);

        let result = approve_promotion(&store, &events, &tenant(), &flowctl_core::PromotionIntentId::new("intent-1"), None, flowctl_core::Timestamp::from_unix_millis(0));
        assert!(result.is_err());
    }

    #[test]
    fn reject_is_terminal_and_cannot_be_rejected_again() {
        let mut intent = draft_intent();
        intent.status = PromotionStatus::Rejected;
        let store = FakeStore {
            intents: RefCell::new(HashMap::from([("intent-1".to_string(), intent)])),
            environments: RefCell::new(HashMap::new()),
            installs: RefCell::new(HashMap::new()),
        };
        let (events, _receiver) = ChannelEventSink::new(16);

        let result = reject_promotion(&store, &events, &tenant(), &flowctl_core::PromotionIntentId::new("intent-1"));
        assert!(result.is_err());
    }
}
