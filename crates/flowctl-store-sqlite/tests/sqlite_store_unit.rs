// crates/flowctl-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Test: SQLite Store Unit Scenarios
// Description: Exercises each storage trait `SqliteStore` implements against
// an in-memory connection: record type / binding round-trips, install audit
// rows, intent idempotency, workflow execution persistence and record
// locking, and promotion intent / environment-install round-trips.
// ============================================================================

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions use panic-based failure reporting")]

use serde_json::json;

use flowctl_core::CapabilityProfile;
use flowctl_core::ChangeId;
use flowctl_core::ContextSource;
use flowctl_core::EnvironmentId;
use flowctl_core::IntentId;
use flowctl_core::ModuleId;
use flowctl_core::ProjectId;
use flowctl_core::PromotionIntentId;
use flowctl_core::RecordTypeKey;
use flowctl_core::TenantContext;
use flowctl_core::TenantId;
use flowctl_core::Timestamp;
use flowctl_core::WorkflowDefinitionId;
use flowctl_core::WorkflowExecutionId;
use flowctl_core::WorkflowStepExecutionId;
use flowctl_core::WorkflowStepId;
use flowctl_graph::GraphPackage;
use flowctl_graph::GraphStore;
use flowctl_install::GraphPackageInstall;
use flowctl_install::InstallStore;
use flowctl_intent::IntentStore;
use flowctl_promotion::row::EnvironmentConfig;
use flowctl_promotion::row::EnvironmentPackageInstall;
use flowctl_promotion::row::PromotionIntent;
use flowctl_promotion::row::PromotionStatus;
use flowctl_promotion::PromotionStore;
use flowctl_store_sqlite::SqliteStore;
use flowctl_workflow::store::RecordLockOutcome;
use flowctl_workflow::types::WorkflowDefinitionStatus;
use flowctl_workflow::types::WorkflowExecution;
use flowctl_workflow::types::WorkflowExecutionStatus;
use flowctl_workflow::types::WorkflowStepExecution;
use flowctl_workflow::types::WorkflowStepExecutionStatus;
use flowctl_workflow::TriggerType;
use flowctl_workflow::WorkflowStore;

fn tenant(id: &str) -> TenantContext {
    TenantContext::new(TenantId::new(id), None, None, ContextSource::Header)
}

fn open() -> SqliteStore {
    SqliteStore::open_in_memory().expect("in-memory store opens")
}

fn sample_package() -> GraphPackage {
    GraphPackage {
        package_key: "hr.lite".to_string(),
        version: "1.0.0".parse().expect("valid semver"),
        depends_on: vec![],
        record_types: vec![],
        sla_policies: vec![],
        assignment_rules: vec![],
        workflows: vec![],
    }
}

#[test]
fn opening_an_empty_store_has_no_record_types() {
    let store = open();
    let tenant = tenant("tenant-a");
    assert!(store.list_record_types(&tenant).unwrap().is_empty());
}

#[test]
fn record_types_round_trip_through_install_store_and_graph_store() {
    let store = open();
    let tenant = tenant("tenant-a");
    let project_id = ProjectId::new("project-a");
    let key = RecordTypeKey::new("ticket");

    store.create_record_type(&tenant, &project_id, &key, Some("Ticket"), None, &[]).unwrap();

    let record_types = store.list_record_types(&tenant).unwrap();
    assert_eq!(record_types.len(), 1);
    assert_eq!(record_types[0].key, key);
    assert_eq!(record_types[0].name.as_deref(), Some("Ticket"));

    store.update_record_type_sla_config(&tenant, &key, 60).unwrap();
    let bindings = store.list_bindings(&tenant).unwrap();
    assert_eq!(bindings.slas.len(), 1);
    assert_eq!(bindings.slas[0].duration_minutes, 60);
}

#[test]
fn record_types_are_isolated_per_tenant() {
    let store = open();
    let tenant_a = tenant("tenant-a");
    let tenant_b = tenant("tenant-b");
    let project_id = ProjectId::new("project-a");
    let key = RecordTypeKey::new("ticket");

    store.create_record_type(&tenant_a, &project_id, &key, None, None, &[]).unwrap();

    assert_eq!(store.list_record_types(&tenant_a).unwrap().len(), 1);
    assert!(store.list_record_types(&tenant_b).unwrap().is_empty());
}

#[test]
fn install_rows_round_trip_and_filter_by_version() {
    let store = open();
    let project_id = ProjectId::new("project-a");

    let install = GraphPackageInstall {
        id: "install-1".to_string(),
        project_id: project_id.clone(),
        package_key: "hr.lite".to_string(),
        version: "1.0.0".to_string(),
        checksum: "deadbeef".to_string(),
        diff: json!({"recordTypesAdded": []}),
        package_contents: sample_package(),
        installed_by: None,
        installed_at: Timestamp::from_unix_millis(1_000),
    };
    store.create_install(&install).unwrap();

    let latest = store.get_latest_install(&project_id, "hr.lite").unwrap().unwrap();
    assert_eq!(latest.version, "1.0.0");

    let by_version = store.get_install_by_version(&project_id, "hr.lite", "1.0.0").unwrap().unwrap();
    assert_eq!(by_version.checksum, "deadbeef");
    assert!(store.get_install_by_version(&project_id, "hr.lite", "2.0.0").unwrap().is_none());

    let all = store.list_installs_for_project(&project_id).unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn intent_create_is_idempotent_on_repeated_key() {
    let store = open();
    let tenant = tenant("tenant-a");
    let workflow_id = WorkflowDefinitionId::new("wfdef-1");
    let now = Timestamp::from_unix_millis(1_000);

    let first = store
        .create_intent(&tenant, &workflow_id, TriggerType::Manual, json!({"k": "v"}), Some("dedupe-key"), IntentId::new("intent-1"), now)
        .unwrap();

    let second = store
        .create_intent(&tenant, &workflow_id, TriggerType::Manual, json!({"k": "different"}), Some("dedupe-key"), IntentId::new("intent-2"), now)
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.trigger_payload, json!({"k": "v"}));
}

#[test]
fn pending_intents_list_oldest_first() {
    let store = open();
    let tenant = tenant("tenant-a");
    let workflow_id = WorkflowDefinitionId::new("wfdef-1");

    store
        .create_intent(&tenant, &workflow_id, TriggerType::Manual, json!({}), None, IntentId::new("intent-a"), Timestamp::from_unix_millis(200))
        .unwrap();
    store
        .create_intent(&tenant, &workflow_id, TriggerType::Manual, json!({}), None, IntentId::new("intent-b"), Timestamp::from_unix_millis(100))
        .unwrap();

    let pending = store.list_pending_intents(&tenant).unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].id.as_str(), "intent-b");
    assert_eq!(pending[1].id.as_str(), "intent-a");
}

#[test]
fn mark_dispatched_removes_intent_from_pending_list() {
    let store = open();
    let tenant = tenant("tenant-a");
    let workflow_id = WorkflowDefinitionId::new("wfdef-1");
    let intent = store
        .create_intent(&tenant, &workflow_id, TriggerType::Manual, json!({}), None, IntentId::new("intent-a"), Timestamp::from_unix_millis(100))
        .unwrap();

    store.mark_dispatched(&tenant, &intent.id, &WorkflowExecutionId::new("exec-1"), Timestamp::from_unix_millis(200)).unwrap();

    assert!(store.list_pending_intents(&tenant).unwrap().is_empty());
}

#[test]
fn mark_failed_records_the_error_and_clears_pending() {
    let store = open();
    let tenant = tenant("tenant-a");
    let workflow_id = WorkflowDefinitionId::new("wfdef-1");
    let intent = store
        .create_intent(&tenant, &workflow_id, TriggerType::Manual, json!({}), None, IntentId::new("intent-a"), Timestamp::from_unix_millis(100))
        .unwrap();

    store.mark_failed(&tenant, &intent.id, "no module available", Timestamp::from_unix_millis(150)).unwrap();

    assert!(store.list_pending_intents(&tenant).unwrap().is_empty());
}

#[test]
fn resolve_module_context_falls_back_to_any_tenant_module() {
    let store = open();
    let tenant = tenant("tenant-a");
    let project_id = ProjectId::new("project-a");
    let module_id = ModuleId::new("module-a");

    assert!(store.resolve_module_context(&tenant, &WorkflowDefinitionId::new("wfdef-1")).unwrap().is_none());

    store.seed_module(&tenant, &project_id, &module_id, CapabilityProfile::WorkflowModuleDefault, "src").unwrap();

    let resolved = store.resolve_module_context(&tenant, &WorkflowDefinitionId::new("wfdef-1")).unwrap().unwrap();
    assert_eq!(resolved.module_id, module_id);
    assert_eq!(resolved.capability_profile, CapabilityProfile::WorkflowModuleDefault);
}

#[test]
fn resolve_module_context_prefers_module_from_definitions_change() {
    let store = open();
    let tenant = tenant("tenant-a");
    let project_id = ProjectId::new("project-a");
    let fallback_module = ModuleId::new("module-fallback");
    let preferred_module = ModuleId::new("module-preferred");
    let change_id = ChangeId::new("change-1");

    store.seed_module(&tenant, &project_id, &fallback_module, CapabilityProfile::ReadOnly, "src").unwrap();
    store.seed_module(&tenant, &project_id, &preferred_module, CapabilityProfile::CodeModuleDefault, "src").unwrap();
    store.seed_change(&tenant, &change_id, &preferred_module).unwrap();

    let workflow_id = store
        .create_workflow(&tenant, "onboarding", TriggerType::Manual, json!({}), &[], Some(&change_id), Timestamp::from_unix_millis(1))
        .unwrap();

    let resolved = store.resolve_module_context(&tenant, &workflow_id).unwrap().unwrap();
    assert_eq!(resolved.module_id, preferred_module);
}

#[test]
fn workflow_definition_is_created_as_draft_and_activates() {
    let store = open();
    let tenant = tenant("tenant-a");
    assert!(store.find_workflow_by_name(&tenant, "intake").unwrap().is_none());

    let workflow_id = store
        .create_workflow(&tenant, "intake", TriggerType::Manual, json!({}), &[], None, Timestamp::from_unix_millis(1))
        .unwrap();

    let definition = store.get_definition(&tenant, &workflow_id).unwrap().unwrap();
    assert_eq!(definition.status, WorkflowDefinitionStatus::Draft);
    assert_eq!(store.find_workflow_by_name(&tenant, "intake").unwrap(), Some(workflow_id.clone()));

    store.activate_workflow(&tenant, &workflow_id).unwrap();
    let activated = store.get_definition(&tenant, &workflow_id).unwrap().unwrap();
    assert_eq!(activated.status, WorkflowDefinitionStatus::Active);
}

#[test]
fn workflow_execution_round_trips_and_updates() {
    let store = open();
    let tenant = tenant("tenant-a");
    let workflow_id = store
        .create_workflow(&tenant, "onboarding", TriggerType::Manual, json!({}), &[], None, Timestamp::from_unix_millis(1))
        .unwrap();

    let execution = WorkflowExecution {
        id: WorkflowExecutionId::new("exec-1"),
        tenant_id: tenant.tenant_id.clone(),
        workflow_definition_id: workflow_id,
        intent_id: IntentId::new("intent-1"),
        input: json!({"field": "value"}),
        status: WorkflowExecutionStatus::Running,
        paused_at_step_id: None,
        accumulated_input: None,
        started_at: Timestamp::from_unix_millis(10),
        completed_at: None,
        error: None,
    };
    store.create_execution(&execution).unwrap();

    let mut loaded = store.get_execution(&tenant, &execution.id).unwrap().unwrap();
    assert_eq!(loaded.status, WorkflowExecutionStatus::Running);

    loaded.status = WorkflowExecutionStatus::Completed;
    loaded.completed_at = Some(Timestamp::from_unix_millis(20));
    store.update_execution(&loaded).unwrap();

    let reloaded = store.get_execution(&tenant, &execution.id).unwrap().unwrap();
    assert_eq!(reloaded.status, WorkflowExecutionStatus::Completed);
    assert_eq!(reloaded.completed_at, Some(Timestamp::from_unix_millis(20)));
}

#[test]
fn step_execution_round_trips() {
    let store = open();
    let tenant = tenant("tenant-a");
    let step_execution = WorkflowStepExecution {
        id: WorkflowStepExecutionId::new("step-exec-1"),
        workflow_execution_id: WorkflowExecutionId::new("exec-1"),
        workflow_step_id: WorkflowStepId::new("step-1"),
        status: WorkflowStepExecutionStatus::Pending,
        output: None,
        executed_at: None,
    };
    store.create_step_execution(&step_execution).unwrap();

    let mut loaded = store.get_step_execution(&tenant, &step_execution.id).unwrap().unwrap();
    assert_eq!(loaded.status, WorkflowStepExecutionStatus::Pending);

    loaded.status = WorkflowStepExecutionStatus::Completed;
    loaded.output = Some(json!({"ok": true}));
    loaded.executed_at = Some(Timestamp::from_unix_millis(5));
    store.update_step_execution(&loaded).unwrap();

    let reloaded = store.get_step_execution(&tenant, &step_execution.id).unwrap().unwrap();
    assert_eq!(reloaded.status, WorkflowStepExecutionStatus::Completed);
    assert_eq!(reloaded.output, Some(json!({"ok": true})));
}

#[test]
fn record_lock_is_acquired_once_and_released_on_execution_end() {
    let store = open();
    let tenant = tenant("tenant-a");
    let exec_a = WorkflowExecutionId::new("exec-a");
    let exec_b = WorkflowExecutionId::new("exec-b");

    let outcome = store.try_acquire_record_lock(&tenant, "ticket", "rec-1", &exec_a).unwrap();
    assert_eq!(outcome, RecordLockOutcome::Acquired);

    let outcome = store.try_acquire_record_lock(&tenant, "ticket", "rec-1", &exec_b).unwrap();
    assert_eq!(outcome, RecordLockOutcome::AlreadyExists);

    assert_eq!(store.record_lock_holder(&tenant, "ticket", "rec-1").unwrap(), Some(exec_a.clone()));

    store.release_locks_for_execution(&exec_a).unwrap();
    assert_eq!(store.record_lock_holder(&tenant, "ticket", "rec-1").unwrap(), None);
}

#[test]
fn promotion_intent_round_trips_through_create_and_save() {
    let store = open();
    let tenant = tenant("tenant-a");
    let project_id = ProjectId::new("project-a");
    let dev = EnvironmentId::new("dev");
    let prod = EnvironmentId::new("prod");

    store
        .seed_environment(&tenant, &EnvironmentConfig { id: prod.clone(), requires_promotion_approval: true, webhook_url: None })
        .unwrap();

    let env = store.get_environment(&tenant, &prod).unwrap().unwrap();
    assert!(env.requires_promotion_approval);

    let intent = PromotionIntent {
        id: PromotionIntentId::new("promo-1"),
        project_id,
        from_environment_id: dev,
        to_environment_id: prod,
        status: PromotionStatus::Draft,
        diff: None,
        result: None,
        created_by: None,
        approved_by: None,
        approved_at: None,
        notification_status: None,
    };
    store.create_intent(&tenant, &intent).unwrap();

    let mut loaded = store.get_intent(&tenant, &intent.id).unwrap().unwrap();
    assert_eq!(loaded.status, PromotionStatus::Draft);

    loaded.status = PromotionStatus::Approved;
    store.save_intent(&tenant, &loaded).unwrap();

    let reloaded = store.get_intent(&tenant, &intent.id).unwrap().unwrap();
    assert_eq!(reloaded.status, PromotionStatus::Approved);
}

#[test]
fn environment_installs_round_trip_and_upsert() {
    let store = open();
    let tenant = tenant("tenant-a");
    let project_id = ProjectId::new("project-a");
    let prod = EnvironmentId::new("prod");

    let install = EnvironmentPackageInstall {
        environment_id: prod.clone(),
        package_key: "hr.lite".to_string(),
        version: "1.0.0".to_string(),
        checksum: "abc123".to_string(),
        package_contents: sample_package(),
    };
    store.record_environment_install(&tenant, &project_id, &install).unwrap();

    let installs = store.list_environment_installs(&tenant, &project_id, &prod).unwrap();
    assert_eq!(installs.len(), 1);
    assert_eq!(installs[0].checksum, "abc123");

    let upgraded = EnvironmentPackageInstall {
        version: "1.1.0".to_string(),
        checksum: "def456".to_string(),
        package_contents: sample_package(),
        ..install
    };
    store.record_environment_install(&tenant, &project_id, &upgraded).unwrap();

    let installs = store.list_environment_installs(&tenant, &project_id, &prod).unwrap();
    assert_eq!(installs.len(), 1);
    assert_eq!(installs[0].checksum, "def456");
}
