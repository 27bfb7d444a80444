//! Conversation memory reconstructed from the interaction log.
//!
//! Nothing conversational is stored separately: a user's recent turns are
//! reread from the log on every request, so memory is always consistent
//! with what was actually answered.

use opsdesk_core::AppResult;
use opsdesk_store::{ConversationStats, InteractionLog, LogEntry};

/// How many recent log entries the transcript window considers.
pub const MEMORY_WINDOW: usize = 5;

/// Default character budget for the formatted transcript.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 2000;

/// Per-user conversation memory over the interaction log.
#[derive(Clone)]
pub struct ConversationMemory {
    log: InteractionLog,
}

impl ConversationMemory {
    pub fn new(log: InteractionLog) -> Self {
        Self { log }
    }

    /// Build the transcript for a user's recent turns.
    ///
    /// The window is the `MEMORY_WINDOW` most recent entries, replayed in
    /// chronological order. Turns are appended until the next one (including
    /// its joining blank line) would push the transcript past `max_chars`;
    /// an oversized turn is excluded whole, never truncated mid-turn. A user
    /// with no history gets an empty string, which callers treat as "omit
    /// the context block".
    pub fn context(&self, user_id: &str, max_chars: usize) -> AppResult<String> {
        let recent = self.log.recent_for_user(user_id, MEMORY_WINDOW)?;
        if recent.is_empty() {
            return Ok(String::new());
        }

        let mut parts: Vec<String> = Vec::new();
        let mut total_length = 0usize;

        // recent is newest-first; replay chronologically
        for entry in recent.iter().rev() {
            let turn = format_turn(entry);
            let joiner = if parts.is_empty() { 0 } else { 2 };

            if total_length + joiner + turn.len() > max_chars {
                break;
            }

            total_length += joiner + turn.len();
            parts.push(turn);
        }

        Ok(parts.join("\n\n"))
    }

    /// Aggregate statistics for a user. Always recomputed, never cached.
    pub fn stats(&self, user_id: &str) -> AppResult<ConversationStats> {
        self.log.stats_for_user(user_id)
    }
}

fn format_turn(entry: &LogEntry) -> String {
    let mut turn = format!("User: {}\nAssistant: {}", entry.query, entry.response_text);
    if !entry.sources.is_empty() {
        turn.push_str(&format!("\nSources used: {}", entry.sources.join(", ")));
    }
    turn
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_store::db::open_in_memory;
    use opsdesk_store::{NewLogEntry, QueryType};

    fn log_with_turns(turns: &[(&str, &str, &[&str])]) -> InteractionLog {
        let log = InteractionLog::new(open_in_memory().unwrap());
        for (query, response, sources) in turns {
            log.append(&NewLogEntry {
                query: query.to_string(),
                response_text: response.to_string(),
                sources: sources.iter().map(|s| s.to_string()).collect(),
                query_type: QueryType::StaticKnowledge,
                processing_time_seconds: 0.1,
                user_id: Some("alice".to_string()),
            })
            .unwrap();
        }
        log
    }

    #[test]
    fn no_history_returns_empty_string() {
        let memory = ConversationMemory::new(log_with_turns(&[]));
        assert_eq!(memory.context("alice", 2000).unwrap(), "");
        assert_eq!(memory.context("nobody", 2000).unwrap(), "");
    }

    #[test]
    fn turns_are_chronological_with_sources_line() {
        let memory = ConversationMemory::new(log_with_turns(&[
            ("first question", "first answer", &["a.md"]),
            ("second question", "second answer", &[]),
        ]));

        let context = memory.context("alice", 2000).unwrap();
        let first_pos = context.find("first question").unwrap();
        let second_pos = context.find("second question").unwrap();
        assert!(first_pos < second_pos);
        assert!(context.contains("User: first question\nAssistant: first answer\nSources used: a.md"));
        assert!(!context.contains("second answer\nSources used:"));
    }

    #[test]
    fn window_is_capped_at_five_entries() {
        let turns: Vec<(String, String)> = (0..8)
            .map(|i| (format!("q{}", i), format!("a{}", i)))
            .collect();
        let turn_refs: Vec<(&str, &str, &[&str])> = turns
            .iter()
            .map(|(q, a)| (q.as_str(), a.as_str(), &[][..]))
            .collect();
        let memory = ConversationMemory::new(log_with_turns(&turn_refs));

        let context = memory.context("alice", 10_000).unwrap();
        // Only the five most recent turns appear
        assert!(!context.contains("q2"));
        assert!(context.contains("q3"));
        assert!(context.contains("q7"));
    }

    #[test]
    fn context_never_exceeds_the_budget() {
        let memory = ConversationMemory::new(log_with_turns(&[
            ("one", "short", &[]),
            ("two", "also short", &[]),
            ("three", "still short", &[]),
        ]));

        for max_chars in [0, 10, 25, 50, 100, 2000] {
            let context = memory.context("alice", max_chars).unwrap();
            assert!(
                context.len() <= max_chars,
                "budget {} exceeded: {}",
                max_chars,
                context.len()
            );
        }
    }

    #[test]
    fn oversized_turn_is_excluded_not_truncated() {
        let long_answer = "x".repeat(500);
        let memory = ConversationMemory::new(log_with_turns(&[("q", &long_answer, &[])]));

        let context = memory.context("alice", 100).unwrap();
        assert_eq!(context, "");
    }

    #[test]
    fn stats_delegate_to_the_log() {
        let memory = ConversationMemory::new(log_with_turns(&[("q", "a", &[])]));
        let stats = memory.stats("alice").unwrap();
        assert_eq!(stats.total_conversations, 1);
        assert_eq!(
            stats.query_type_distribution.get("static_knowledge"),
            Some(&1)
        );
    }
}
