//! Webhook payload construction.
//!
//! The payload is built once per dispatch and serialized once; the same
//! bytes are retried verbatim, so the signature stays valid across attempts
//! and the `timestamp` reflects when the event was processed, not when a
//! retry happened to fire.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::events::IssueChangeEvent;

/// Constant event discriminator on the wire.
const EVENT_NAME: &str = "issue_updated";

/// Top-level webhook payload.
///
/// Absent issue fields serialize as explicit JSON `null`, never omitted
/// keys, so receivers get a stable shape.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub timestamp: String,
    pub event: &'static str,
    pub action: String,
    pub project: ProjectRef,
    pub issue: IssueFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectRef {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueFields {
    pub key: String,
    #[serde(rename = "type")]
    pub issue_type: Option<&'static str>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub resolution: Option<String>,
    pub assignee: Option<String>,
    pub author: Option<String>,
    pub component: Option<String>,
    pub rule: Option<String>,
    pub message: Option<String>,
    pub line: Option<u32>,
    pub effort: Option<String>,
    #[serde(rename = "creationDate")]
    pub creation_date: Option<String>,
    #[serde(rename = "updateDate")]
    pub update_date: Option<String>,
    #[serde(rename = "closeDate")]
    pub close_date: Option<String>,
}

impl WebhookPayload {
    /// Build the payload for an issue change.
    ///
    /// Pure and total: absent optional fields become `None` (JSON null).
    /// Deterministic for identical inputs except `timestamp`, which is the
    /// wall-clock time of the build.
    #[must_use]
    pub fn build(
        event: &IssueChangeEvent,
        action: &str,
        project_key: &str,
        project_name: &str,
    ) -> Self {
        Self {
            timestamp: format_date(Utc::now()),
            event: EVENT_NAME,
            action: action.to_string(),
            project: ProjectRef {
                key: project_key.to_string(),
                name: project_name.to_string(),
            },
            issue: IssueFields {
                key: event.key.clone(),
                issue_type: event.issue_type.map(|t| t.as_str()),
                severity: event.severity.clone(),
                status: event.status.clone(),
                resolution: event.resolution.clone(),
                assignee: event.assignee.clone(),
                author: event.author_login.clone(),
                component: event.component_key.clone(),
                rule: event.rule_key.clone(),
                message: event.message.clone(),
                line: event.line,
                effort: event.effort.clone(),
                creation_date: event.creation_date.map(format_date),
                update_date: event.update_date.map(format_date),
                close_date: event.close_date.map(format_date),
            },
        }
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}
