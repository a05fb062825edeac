// crates/flowctl-store-sqlite/src/promotion_store.rs
// ============================================================================
// Module: SQLite Promotion Store
// Description: `PromotionStore` backed by `promotion_intents`,
// `environments`, and `environment_package_installs`.
// Purpose: Let the promotion pipeline (flowctl-promotion) persist its state
// machine and the per-environment "currently installed" package rows it
// diffs.
// Dependencies: flowctl-core, flowctl-graph, flowctl-promotion, rusqlite,
// serde_json
// ============================================================================

use rusqlite::params;
use rusqlite::OptionalExtension;

use flowctl_core::EnvironmentId;
use flowctl_core::ProjectId;
use flowctl_core::PromotionIntentId;
use flowctl_core::TenantContext;
use flowctl_core::Timestamp;
use flowctl_core::UserId;
use flowctl_graph::GraphPackage;
use flowctl_promotion::row::EnvironmentConfig;
use flowctl_promotion::row::EnvironmentPackageInstall;
use flowctl_promotion::row::NotificationStatus;
use flowctl_promotion::row::PromotionIntent;
use flowctl_promotion::row::PromotionResult;
use flowctl_promotion::row::PromotionStatus;
use flowctl_promotion::store::PromotionStore;
use flowctl_promotion::store::PromotionStoreError;
use flowctl_promotion::diff::PromotionDiff;

use crate::SqliteStore;

fn status_name(status: PromotionStatus) -> &'static str {
    match status {
        PromotionStatus::Draft => "draft",
        PromotionStatus::Previewed => "previewed",
        PromotionStatus::Approved => "approved",
        PromotionStatus::Executed => "executed",
        PromotionStatus::Rejected => "rejected",
    }
}

fn parse_status(value: &str) -> PromotionStatus {
    match value {
        "previewed" => PromotionStatus::Previewed,
        "approved" => PromotionStatus::Approved,
        "executed" => PromotionStatus::Executed,
        "rejected" => PromotionStatus::Rejected,
        _ => PromotionStatus::Draft,
    }
}

fn notification_status_name(status: NotificationStatus) -> &'static str {
    match status {
        NotificationStatus::Sent => "sent",
        NotificationStatus::Failed => "failed",
    }
}

fn parse_notification_status(value: &str) -> NotificationStatus {
    match value {
        "sent" => NotificationStatus::Sent,
        _ => NotificationStatus::Failed,
    }
}

#[allow(clippy::too_many_arguments, reason = "mirrors the row columns read back from a single SELECT")]
fn row_to_intent(
    id: String,
    project_id: String,
    from_environment_id: String,
    to_environment_id: String,
    status: String,
    diff_json: Option<String>,
    result_json: Option<String>,
    created_by: Option<String>,
    approved_by: Option<String>,
    approved_at: Option<i64>,
    notification_status: Option<String>,
) -> Result<PromotionIntent, PromotionStoreError> {
    let diff: Option<PromotionDiff> = diff_json.map(|json| serde_json::from_str(&json)).transpose().map_err(|err| PromotionStoreError(err.to_string()))?;
    let result: Option<PromotionResult> = result_json.map(|json| serde_json::from_str(&json)).transpose().map_err(|err| PromotionStoreError(err.to_string()))?;
    Ok(PromotionIntent {
        id: PromotionIntentId::new(id),
        project_id: ProjectId::new(project_id),
        from_environment_id: EnvironmentId::new(from_environment_id),
        to_environment_id: EnvironmentId::new(to_environment_id),
        status: parse_status(&status),
        diff,
        result,
        created_by: created_by.map(UserId::new),
        approved_by: approved_by.map(UserId::new),
        approved_at: approved_at.map(Timestamp::from_unix_millis),
        notification_status: notification_status.as_deref().map(parse_notification_status),
    })
}

impl PromotionStore for SqliteStore {
    fn get_intent(&self, tenant: &TenantContext, id: &PromotionIntentId) -> Result<Option<PromotionIntent>, PromotionStoreError> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, project_id, from_environment_id, to_environment_id, status, diff_json, result_json, created_by, approved_by, approved_at, notification_status
             FROM promotion_intents WHERE tenant_id = ?1 AND id = ?2",
            params![tenant.tenant_id.as_str(), id.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, Option<i64>>(9)?,
                    row.get::<_, Option<String>>(10)?,
                ))
            },
        )
        .optional()
        .map_err(|err| PromotionStoreError(err.to_string()))?
        .map(|(id, project_id, from_env, to_env, status, diff, result, created_by, approved_by, approved_at, notification)| {
            row_to_intent(id, project_id, from_env, to_env, status, diff, result, created_by, approved_by, approved_at, notification)
        })
        .transpose()
    }

    fn create_intent(&self, tenant: &TenantContext, intent: &PromotionIntent) -> Result<(), PromotionStoreError> {
        let conn = self.lock();
        let diff_json = intent.diff.as_ref().map(serde_json::to_string).transpose().map_err(|err| PromotionStoreError(err.to_string()))?;
        let result_json = intent.result.as_ref().map(serde_json::to_string).transpose().map_err(|err| PromotionStoreError(err.to_string()))?;
        conn.execute(
            "INSERT INTO promotion_intents
                (id, tenant_id, project_id, from_environment_id, to_environment_id, status, diff_json, result_json, created_by, approved_by, approved_at, notification_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                intent.id.as_str(),
                tenant.tenant_id.as_str(),
                intent.project_id.as_str(),
                intent.from_environment_id.as_str(),
                intent.to_environment_id.as_str(),
                status_name(intent.status),
                diff_json,
                result_json,
                intent.created_by.as_ref().map(UserId::as_str),
                intent.approved_by.as_ref().map(UserId::as_str),
                intent.approved_at.map(Timestamp::as_unix_millis),
                intent.notification_status.map(notification_status_name),
            ],
        )
        .map_err(|err| PromotionStoreError(err.to_string()))?;
        Ok(())
    }

    fn save_intent(&self, tenant: &TenantContext, intent: &PromotionIntent) -> Result<(), PromotionStoreError> {
        let conn = self.lock();
        let diff_json = intent.diff.as_ref().map(serde_json::to_string).transpose().map_err(|err| PromotionStoreError(err.to_string()))?;
        let result_json = intent.result.as_ref().map(serde_json::to_string).transpose().map_err(|err| PromotionStoreError(err.to_string()))?;
        conn.execute(
            "UPDATE promotion_intents SET
                status = ?1, diff_json = ?2, result_json = ?3, approved_by = ?4, approved_at = ?5, notification_status = ?6
             WHERE tenant_id = ?7 AND id = ?8",
            params![
                status_name(intent.status),
                diff_json,
                result_json,
                intent.approved_by.as_ref().map(UserId::as_str),
                intent.approved_at.map(Timestamp::as_unix_millis),
                intent.notification_status.map(notification_status_name),
                tenant.tenant_id.as_str(),
                intent.id.as_str(),
            ],
        )
        .map_err(|err| PromotionStoreError(err.to_string()))?;
        Ok(())
    }

    fn get_environment(&self, tenant: &TenantContext, environment_id: &EnvironmentId) -> Result<Option<EnvironmentConfig>, PromotionStoreError> {
        let conn = self.lock();
        conn.query_row(
            "SELECT requires_promotion_approval, webhook_url FROM environments WHERE tenant_id = ?1 AND environment_id = ?2",
            params![tenant.tenant_id.as_str(), environment_id.as_str()],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?)),
        )
        .optional()
        .map_err(|err| PromotionStoreError(err.to_string()))
        .map(|opt| {
            opt.map(|(requires_approval, webhook_url)| EnvironmentConfig {
                id: environment_id.clone(),
                requires_promotion_approval: requires_approval != 0,
                webhook_url,
            })
        })
    }

    fn list_environment_installs(&self, tenant: &TenantContext, project_id: &ProjectId, environment_id: &EnvironmentId) -> Result<Vec<EnvironmentPackageInstall>, PromotionStoreError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT package_key, version, checksum, package_contents_json FROM environment_package_installs
                 WHERE tenant_id = ?1 AND project_id = ?2 AND environment_id = ?3",
            )
            .map_err(|err| PromotionStoreError(err.to_string()))?;
        let rows = stmt
            .query_map(params![tenant.tenant_id.as_str(), project_id.as_str(), environment_id.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?, row.get::<_, String>(3)?))
            })
            .map_err(|err| PromotionStoreError(err.to_string()))?;

        let mut installs = Vec::new();
        for row in rows {
            let (package_key, version, checksum, contents_json) = row.map_err(|err| PromotionStoreError(err.to_string()))?;
            let package_contents: GraphPackage = serde_json::from_str(&contents_json).map_err(|err| PromotionStoreError(err.to_string()))?;
            installs.push(EnvironmentPackageInstall {
                environment_id: environment_id.clone(),
                package_key,
                version,
                checksum,
                package_contents,
            });
        }
        Ok(installs)
    }

    fn record_environment_install(&self, tenant: &TenantContext, project_id: &ProjectId, install: &EnvironmentPackageInstall) -> Result<(), PromotionStoreError> {
        let conn = self.lock();
        let contents_json = serde_json::to_string(&install.package_contents).map_err(|err| PromotionStoreError(err.to_string()))?;
        conn.execute(
            "INSERT INTO environment_package_installs (tenant_id, project_id, environment_id, package_key, version, checksum, package_contents_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (tenant_id, project_id, environment_id, package_key) DO UPDATE SET
                version = excluded.version, checksum = excluded.checksum, package_contents_json = excluded.package_contents_json",
            params![
                tenant.tenant_id.as_str(),
                project_id.as_str(),
                install.environment_id.as_str(),
                install.package_key,
                install.version,
                install.checksum,
                contents_json,
            ],
        )
        .map_err(|err| PromotionStoreError(err.to_string()))?;
        Ok(())
    }
}
