//! Issue change events consumed from the host issue engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue classification, serialized by its canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    CodeSmell,
    Bug,
    Vulnerability,
    SecurityHotspot,
}

impl IssueType {
    /// Canonical name used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CodeSmell => "CODE_SMELL",
            Self::Bug => "BUG",
            Self::Vulnerability => "VULNERABILITY",
            Self::SecurityHotspot => "SECURITY_HOTSPOT",
        }
    }
}

/// A snapshot of an issue at the moment it was created or transitioned.
///
/// Produced by the host issue engine; read-only to this crate. Every field
/// except `key` may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueChangeEvent {
    pub key: String,
    pub issue_type: Option<IssueType>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub resolution: Option<String>,
    pub assignee: Option<String>,
    pub author_login: Option<String>,
    pub component_key: Option<String>,
    pub rule_key: Option<String>,
    pub message: Option<String>,
    pub line: Option<u32>,
    /// Remediation effort, already rendered by the host (e.g. "5min").
    pub effort: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub update_date: Option<DateTime<Utc>>,
    pub close_date: Option<DateTime<Utc>>,
}

impl IssueChangeEvent {
    /// Create an event with only the required key set.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_type_canonical_names() {
        assert_eq!(IssueType::CodeSmell.as_str(), "CODE_SMELL");
        assert_eq!(IssueType::SecurityHotspot.as_str(), "SECURITY_HOTSPOT");
    }

    #[test]
    fn new_event_has_only_key() {
        let event = IssueChangeEvent::new("ABC-1");
        assert_eq!(event.key, "ABC-1");
        assert!(event.severity.is_none());
        assert!(event.creation_date.is_none());
    }
}
