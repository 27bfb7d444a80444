//! Storage model definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An employee record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub team: String,
    pub tracker_username: String,
}

/// A ticket record from the issue tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub summary: String,
    pub assignee: String,
    pub status: String,
    pub priority: String,
}

/// A service deployment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub service: String,
    pub version: String,
    pub date: DateTime<Utc>,
    pub status: String,
}

/// Classification of a processed query, persisted with each log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Answered from the model's own knowledge plus retrieved documentation
    StaticKnowledge,
    /// Answered via tool calls against internal records
    DynamicData,
    /// Declined as outside the assistant's scope
    OutOfScope,
    /// Gate and agent disagreed on scope; kept for stored history
    IntentMismatch,
    /// Processing failed; the apologetic fallback was returned
    Error,
    /// Audit-trail action row, not a user-facing answer
    Log,
}

impl QueryType {
    /// Canonical string name used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaticKnowledge => "static_knowledge",
            Self::DynamicData => "dynamic_data",
            Self::OutOfScope => "out_of_scope",
            Self::IntentMismatch => "intent_mismatch",
            Self::Error => "error",
            Self::Log => "log",
        }
    }

    /// Parse a stored string name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "static_knowledge" => Some(Self::StaticKnowledge),
            "dynamic_data" => Some(Self::DynamicData),
            "out_of_scope" => Some(Self::OutOfScope),
            "intent_mismatch" => Some(Self::IntentMismatch),
            "error" => Some(Self::Error),
            "log" => Some(Self::Log),
            _ => None,
        }
    }
}

/// User feedback attached to a log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub helpful: bool,
    #[serde(default)]
    pub feedback_text: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One persisted interaction log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub response_text: String,
    pub sources: Vec<String>,
    pub query_type: QueryType,
    pub processing_time_seconds: f64,
    pub user_id: Option<String>,
    pub feedback: Option<Feedback>,
}

/// A log entry about to be appended (id and timestamp assigned by the log).
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub query: String,
    pub response_text: String,
    pub sources: Vec<String>,
    pub query_type: QueryType,
    pub processing_time_seconds: f64,
    pub user_id: Option<String>,
}

/// Aggregated conversation statistics for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationStats {
    pub total_conversations: u32,
    pub recent_conversations_24h: u32,
    pub query_type_distribution: HashMap<String, u32>,
}

/// Join a source list into the flat delimited form used in storage.
pub fn join_sources(sources: &[String]) -> String {
    sources.join(", ")
}

/// Split the stored delimited form back into an ordered source list.
///
/// Items are trimmed and empties dropped, so round-tripping tolerates
/// hand-edited or legacy rows.
pub fn split_sources(stored: &str) -> Vec<String> {
    stored
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_type_round_trip() {
        for qt in [
            QueryType::StaticKnowledge,
            QueryType::DynamicData,
            QueryType::OutOfScope,
            QueryType::IntentMismatch,
            QueryType::Error,
            QueryType::Log,
        ] {
            assert_eq!(QueryType::parse(qt.as_str()), Some(qt));
        }
        assert_eq!(QueryType::parse("bogus"), None);
    }

    #[test]
    fn sources_round_trip() {
        let sources = vec!["a.md".to_string(), "/api/employees".to_string()];
        let stored = join_sources(&sources);
        assert_eq!(stored, "a.md, /api/employees");
        assert_eq!(split_sources(&stored), sources);
    }

    #[test]
    fn split_sources_drops_empties() {
        assert_eq!(
            split_sources(" a.md ,, b.md , "),
            vec!["a.md".to_string(), "b.md".to_string()]
        );
        assert!(split_sources("").is_empty());
    }

    #[test]
    fn feedback_serializes_as_json_blob() {
        let feedback = Feedback {
            helpful: true,
            feedback_text: Some("great".to_string()),
            timestamp: Utc::now(),
        };
        let blob = serde_json::to_string(&feedback).unwrap();
        let parsed: Feedback = serde_json::from_str(&blob).unwrap();
        assert!(parsed.helpful);
        assert_eq!(parsed.feedback_text.as_deref(), Some("great"));
    }
}
