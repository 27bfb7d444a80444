//! The append-only interaction log.
//!
//! Every query/response pair, tool invocation, and feedback event lands here.
//! Entries are append-only; the single mutable field is `feedback`, scoped to
//! one entry by id. Audit-trail actions are entries with `query_type = log`
//! and no user id, so they never surface in a user's conversation memory.

use crate::db::{lock, SharedConnection};
use crate::models::{
    join_sources, split_sources, ConversationStats, Feedback, LogEntry, NewLogEntry, QueryType,
};
use chrono::{DateTime, Duration, Utc};
use opsdesk_core::{AppError, AppResult};
use rusqlite::{params, Row};
use std::collections::HashMap;

/// Handle over the `logs` table.
#[derive(Clone)]
pub struct InteractionLog {
    conn: SharedConnection,
}

impl InteractionLog {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Append an entry and return its generated id.
    pub fn append(&self, entry: &NewLogEntry) -> AppResult<i64> {
        self.append_with_feedback(entry, None)
    }

    fn append_with_feedback(
        &self,
        entry: &NewLogEntry,
        feedback_json: Option<String>,
    ) -> AppResult<i64> {
        let guard = lock(&self.conn)?;
        guard.execute(
            "INSERT INTO logs (timestamp, query, response, sources, query_type, processing_time, user_id, feedback)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                Utc::now().to_rfc3339(),
                entry.query,
                entry.response_text,
                join_sources(&entry.sources),
                entry.query_type.as_str(),
                entry.processing_time_seconds,
                entry.user_id,
                feedback_json,
            ],
        )?;
        Ok(guard.last_insert_rowid())
    }

    /// Recent entries, most-recent-first, optionally filtered by user.
    pub fn get(&self, limit: usize, user_id: Option<&str>) -> AppResult<Vec<LogEntry>> {
        let guard = lock(&self.conn)?;

        let mut entries = Vec::new();
        match user_id {
            Some(user) => {
                let mut stmt = guard.prepare(
                    "SELECT id, timestamp, query, response, sources, query_type, processing_time, user_id, feedback
                     FROM logs WHERE user_id = ?1 ORDER BY timestamp DESC, id DESC LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![user, limit as i64], row_to_entry)?;
                for row in rows {
                    entries.push(row?);
                }
            }
            None => {
                let mut stmt = guard.prepare(
                    "SELECT id, timestamp, query, response, sources, query_type, processing_time, user_id, feedback
                     FROM logs ORDER BY timestamp DESC, id DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit as i64], row_to_entry)?;
                for row in rows {
                    entries.push(row?);
                }
            }
        }

        Ok(entries)
    }

    /// The `n` most recent entries for a user (the conversation-memory window).
    pub fn recent_for_user(&self, user_id: &str, n: usize) -> AppResult<Vec<LogEntry>> {
        self.get(n, Some(user_id))
    }

    /// Attach feedback to an entry.
    ///
    /// Returns `Ok(false)` when the id does not exist; a prior feedback value
    /// is overwritten (last-write-wins).
    pub fn set_feedback(
        &self,
        id: i64,
        helpful: bool,
        feedback_text: Option<&str>,
    ) -> AppResult<bool> {
        let feedback = Feedback {
            helpful,
            feedback_text: feedback_text.map(|s| s.to_string()),
            timestamp: Utc::now(),
        };
        let blob = serde_json::to_string(&feedback)?;

        let guard = lock(&self.conn)?;
        let changed = guard.execute(
            "UPDATE logs SET feedback = ?1 WHERE id = ?2",
            params![blob, id],
        )?;

        Ok(changed > 0)
    }

    /// Aggregate conversation statistics for a user. Always recomputed.
    pub fn stats_for_user(&self, user_id: &str) -> AppResult<ConversationStats> {
        let guard = lock(&self.conn)?;

        let total_conversations: u32 = guard.query_row(
            "SELECT COUNT(*) FROM logs WHERE user_id = ?1",
            params![user_id],
            |row| row.get::<_, i64>(0).map(|v| v as u32),
        )?;

        let yesterday = (Utc::now() - Duration::hours(24)).to_rfc3339();
        let recent_conversations_24h: u32 = guard.query_row(
            "SELECT COUNT(*) FROM logs WHERE user_id = ?1 AND timestamp >= ?2",
            params![user_id, yesterday],
            |row| row.get::<_, i64>(0).map(|v| v as u32),
        )?;

        let mut stmt = guard.prepare(
            "SELECT query_type, COUNT(*) FROM logs WHERE user_id = ?1 GROUP BY query_type",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u32))
        })?;

        let mut query_type_distribution = HashMap::new();
        for row in rows {
            let (query_type, count) = row?;
            query_type_distribution.insert(query_type, count);
        }

        Ok(ConversationStats {
            total_conversations,
            recent_conversations_24h,
            query_type_distribution,
        })
    }

    /// Record an audit-trail action.
    ///
    /// Observability is best-effort: a write failure is logged and swallowed
    /// so it can never fail the primary response path.
    pub fn record_action(
        &self,
        query: &str,
        action: &str,
        result: Option<&str>,
        error: Option<&str>,
        duration_seconds: f64,
    ) {
        let detail = if result.is_some() || error.is_some() {
            Some(
                serde_json::json!({
                    "result": result,
                    "error": error,
                })
                .to_string(),
            )
        } else {
            None
        };

        let entry = NewLogEntry {
            query: query.to_string(),
            response_text: action.to_string(),
            sources: vec![action.to_string()],
            query_type: QueryType::Log,
            processing_time_seconds: duration_seconds,
            user_id: None,
        };

        if let Err(e) = self.append_with_feedback(&entry, detail) {
            tracing::warn!("Failed to record audit action '{}': {}", action, e);
        }
    }
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    let timestamp_str: String = row.get(1)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::ToSqlConversionFailure(Box::new(AppError::Store(format!(
                "Invalid timestamp '{}': {}",
                timestamp_str, e
            ))))
        })?;

    let sources: Option<String> = row.get(4)?;
    let query_type_str: String = row.get(5)?;
    let query_type = QueryType::parse(&query_type_str).unwrap_or(QueryType::Error);

    // Feedback is an opaque blob to storage; rows whose blob doesn't parse as
    // structured feedback (audit detail payloads) read back as None.
    let feedback: Option<Feedback> = row
        .get::<_, Option<String>>(8)?
        .and_then(|blob| serde_json::from_str(&blob).ok());

    Ok(LogEntry {
        id: row.get(0)?,
        timestamp,
        query: row.get(2)?,
        response_text: row.get(3)?,
        sources: sources.as_deref().map(split_sources).unwrap_or_default(),
        query_type,
        processing_time_seconds: row.get(6)?,
        user_id: row.get(7)?,
        feedback,
    })
}
