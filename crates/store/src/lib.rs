//! SQLite-backed storage for OpsDesk.
//!
//! Holds the internal record tables (employees, tickets, deployments) and the
//! append-only interaction log that conversation memory and the audit trail
//! are built on. All handles share one connection behind a mutex; entries are
//! append-only and read-ordered by timestamp, so concurrent queries never
//! race on the log itself.

pub mod db;
pub mod log;
pub mod models;
pub mod records;

// Re-export commonly used types
pub use log::InteractionLog;
pub use models::{
    ConversationStats, Deployment, Employee, Feedback, LogEntry, NewLogEntry, QueryType, Ticket,
};
pub use records::RecordStore;
