// crates/flowctl-promotion/src/notify.rs
// ============================================================================
// Module: Reviewer Webhook Notification
// Description: Best-effort JSON POST to a target environment's reviewer
// webhook, with a hard 5-second timeout.
// Purpose: Implement spec.md §4.9's notify-on-preview and §6's webhook
// payload shapes without ever blocking or failing a transition.
// Dependencies: flowctl-providers, reqwest, serde_json
// ============================================================================

use std::time::Duration;

use serde_json::Value;

use flowctl_core::PromotionIntentId;
use flowctl_providers::http::build_http_client;
use flowctl_providers::http::HttpClientConfig;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends `payload` to `webhook_url` as a JSON POST with a 5-second timeout.
/// Never panics; any client-construction, network, or non-success-status
/// failure is folded into `Err` with a human-readable cause, for the caller
/// to record as `notificationStatus=failed` without blocking the intent's
/// transition (spec.md §4.9, §6 "Webhook payloads").
pub fn notify_reviewer(webhook_url: &str, payload: &Value) -> Result<(), String> {
    let config = HttpClientConfig {
        timeout: WEBHOOK_TIMEOUT,
        user_agent: "flowctl-promotion/0.1".to_string(),
    };
    let client = build_http_client(&config).map_err(|err| err.to_string())?;

    let response = client.post(webhook_url).json(payload).send().map_err(|err| err.to_string())?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("webhook responded with status {}", response.status()))
    }
}

/// Builds the `promotion.approval_required` webhook payload (spec.md §6).
#[must_use]
pub fn approval_required_payload(
    intent_id: &PromotionIntentId,
    project_id: &str,
    from_environment: &str,
    to_environment: &str,
    created_by: Option<&str>,
    diff: &Value,
    timestamp: i64,
) -> Value {
    serde_json::json!({
        "event": "promotion.approval_required",
        "intentId": intent_id.as_str(),
        "projectId": project_id,
        "fromEnvironment": from_environment,
        "toEnvironment": to_environment,
        "createdBy": created_by,
        "diff": diff,
        "timestamp": timestamp,
    })
}

/// Builds the `promotion.executed` webhook payload (spec.md §6).
#[must_use]
pub fn executed_payload(intent_id: &PromotionIntentId, project_id: &str, from_environment: &str, to_environment: &str, promoted: usize, skipped: usize, timestamp: i64) -> Value {
    serde_json::json!({
        "event": "promotion.executed",
        "intentId": intent_id.as_str(),
        "projectId": project_id,
        "fromEnvironment": from_environment,
        "toEnvironment": to_environment,
        "promoted": promoted,
        "skipped": skipped,
        "timestamp": timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::approval_required_payload;
    use flowctl_core::PromotionIntentId;

    #[test]
    fn approval_required_payload_carries_the_expected_fields() {
        let payload = approval_required_payload(&PromotionIntentId::new("intent-1"), "proj-a", "dev", "prod", Some("user-1"), &serde_json::json!({}), 0);
        assert_eq!(payload["event"], "promotion.approval_required");
        assert_eq!(payload["intentId"], "intent-1");
    }
}
