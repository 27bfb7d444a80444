//! SQLite database initialization for records and the interaction log.

use opsdesk_core::{AppError, AppResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared connection handle passed into store components.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Open (or create) the database at the given path and ensure the schema.
pub fn open(db_path: &Path) -> AppResult<SharedConnection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Store(format!("Failed to create database directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Store(format!("Failed to open database: {}", e)))?;

    init_schema(&conn)?;

    tracing::debug!("Opened database at {:?}", db_path);
    Ok(Arc::new(Mutex::new(conn)))
}

/// Open an in-memory database with the schema applied (tests, dry runs).
pub fn open_in_memory() -> AppResult<SharedConnection> {
    let conn = Connection::open_in_memory()
        .map_err(|e| AppError::Store(format!("Failed to open in-memory database: {}", e)))?;
    init_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Lock a shared connection, surfacing poisoning as a store error.
pub fn lock(conn: &SharedConnection) -> AppResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| AppError::Store("Database connection poisoned".to_string()))
}

fn init_schema(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            role TEXT NOT NULL,
            team TEXT NOT NULL,
            tracker_username TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tickets (
            id TEXT PRIMARY KEY,
            summary TEXT NOT NULL,
            assignee TEXT NOT NULL,
            status TEXT NOT NULL,
            priority TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS deployments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            service TEXT NOT NULL,
            version TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            query TEXT NOT NULL,
            response TEXT NOT NULL,
            sources TEXT,
            query_type TEXT NOT NULL,
            processing_time REAL NOT NULL,
            user_id TEXT,
            feedback TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_logs_user ON logs(user_id);
        CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp);
        "#,
    )
    .map_err(|e| AppError::Store(format!("Failed to create tables: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_schema() {
        let dir = TempDir::new().unwrap();
        let conn = open(&dir.path().join("nested/opsdesk.db")).unwrap();
        let guard = lock(&conn).unwrap();

        let table_count: i64 = guard
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('employees', 'tickets', 'deployments', 'logs')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 4);
    }

    #[test]
    fn open_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("opsdesk.db");
        open(&path).unwrap();
        assert!(open(&path).is_ok());
    }
}
