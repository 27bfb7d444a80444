//! Internal record access: employees, tickets, deployments.
//!
//! Reads return the full record set; filtering happens in the tool layer so
//! the matching rules live in one place. The LLM never touches these tables
//! directly.

use crate::db::{lock, SharedConnection};
use crate::models::{Deployment, Employee, Ticket};
use chrono::{DateTime, Utc};
use opsdesk_core::{AppError, AppResult};
use rusqlite::params;
use std::path::Path;

/// Handle over the internal record tables.
#[derive(Clone)]
pub struct RecordStore {
    conn: SharedConnection,
}

impl RecordStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// All employees, ordered by id.
    pub fn employees(&self) -> AppResult<Vec<Employee>> {
        let guard = lock(&self.conn)?;
        let mut stmt = guard.prepare(
            "SELECT id, name, email, role, team, tracker_username FROM employees ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Employee {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                role: row.get(3)?,
                team: row.get(4)?,
                tracker_username: row.get(5)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
    }

    /// All tickets, ordered by id.
    pub fn tickets(&self) -> AppResult<Vec<Ticket>> {
        let guard = lock(&self.conn)?;
        let mut stmt = guard
            .prepare("SELECT id, summary, assignee, status, priority FROM tickets ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(Ticket {
                id: row.get(0)?,
                summary: row.get(1)?,
                assignee: row.get(2)?,
                status: row.get(3)?,
                priority: row.get(4)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
    }

    /// All deployments, most recent first.
    pub fn deployments(&self) -> AppResult<Vec<Deployment>> {
        let guard = lock(&self.conn)?;
        let mut stmt = guard
            .prepare("SELECT service, version, date, status FROM deployments ORDER BY date DESC")?;

        let rows = stmt.query_map([], |row| {
            let date_str: String = row.get(2)?;
            let date = parse_timestamp(&date_str)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            Ok(Deployment {
                service: row.get(0)?,
                version: row.get(1)?,
                date,
                status: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
    }

    /// Insert or replace an employee.
    pub fn insert_employee(&self, employee: &Employee) -> AppResult<()> {
        let guard = lock(&self.conn)?;
        guard.execute(
            "INSERT OR REPLACE INTO employees (id, name, email, role, team, tracker_username)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                employee.id,
                employee.name,
                employee.email,
                employee.role,
                employee.team,
                employee.tracker_username,
            ],
        )?;
        Ok(())
    }

    /// Insert or replace a ticket.
    pub fn insert_ticket(&self, ticket: &Ticket) -> AppResult<()> {
        let guard = lock(&self.conn)?;
        guard.execute(
            "INSERT OR REPLACE INTO tickets (id, summary, assignee, status, priority)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                ticket.id,
                ticket.summary,
                ticket.assignee,
                ticket.status,
                ticket.priority,
            ],
        )?;
        Ok(())
    }

    /// Insert a deployment.
    pub fn insert_deployment(&self, deployment: &Deployment) -> AppResult<()> {
        let guard = lock(&self.conn)?;
        guard.execute(
            "INSERT INTO deployments (service, version, date, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                deployment.service,
                deployment.version,
                deployment.date.to_rfc3339(),
                deployment.status,
            ],
        )?;
        Ok(())
    }

    /// Load sample records from JSON files in a directory.
    ///
    /// Looks for `employees.json`, `tickets.json`, and `deployments.json`;
    /// missing files are skipped. Returns the number of records loaded per
    /// kind, in that order.
    pub fn seed_from_dir(&self, dir: &Path) -> AppResult<(u32, u32, u32)> {
        let mut counts = (0u32, 0u32, 0u32);

        let employees_path = dir.join("employees.json");
        if employees_path.exists() {
            let employees: Vec<Employee> = read_json(&employees_path)?;
            for employee in &employees {
                self.insert_employee(employee)?;
            }
            counts.0 = employees.len() as u32;
        }

        let tickets_path = dir.join("tickets.json");
        if tickets_path.exists() {
            let tickets: Vec<Ticket> = read_json(&tickets_path)?;
            for ticket in &tickets {
                self.insert_ticket(ticket)?;
            }
            counts.1 = tickets.len() as u32;
        }

        let deployments_path = dir.join("deployments.json");
        if deployments_path.exists() {
            let deployments: Vec<Deployment> = read_json(&deployments_path)?;
            for deployment in &deployments {
                self.insert_deployment(deployment)?;
            }
            counts.2 = deployments.len() as u32;
        }

        tracing::info!(
            "Seeded {} employees, {} tickets, {} deployments",
            counts.0,
            counts.1,
            counts.2
        );

        Ok(counts)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AppResult<T> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Store(format!("Failed to read {:?}: {}", path, e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| AppError::Store(format!("Failed to parse {:?}: {}", path, e)))
}

fn parse_timestamp(s: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Store(format!("Invalid timestamp '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn sample_employee(id: i64, name: &str, team: &str) -> Employee {
        Employee {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: "Engineer".to_string(),
            team: team.to_string(),
            tracker_username: name.to_lowercase(),
        }
    }

    #[test]
    fn insert_and_read_employees() {
        let store = RecordStore::new(open_in_memory().unwrap());
        store
            .insert_employee(&sample_employee(1, "Alice", "Platform"))
            .unwrap();
        store
            .insert_employee(&sample_employee(2, "Bob", "Payments"))
            .unwrap();

        let employees = store.employees().unwrap();
        assert_eq!(employees.len(), 2);
        assert_eq!(employees[0].name, "Alice");
    }

    #[test]
    fn insert_employee_replaces_by_id() {
        let store = RecordStore::new(open_in_memory().unwrap());
        store
            .insert_employee(&sample_employee(1, "Alice", "Platform"))
            .unwrap();
        store
            .insert_employee(&sample_employee(1, "Alicia", "Platform"))
            .unwrap();

        let employees = store.employees().unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].name, "Alicia");
    }

    #[test]
    fn deployments_ordered_most_recent_first() {
        let store = RecordStore::new(open_in_memory().unwrap());
        for (version, date) in [
            ("1.0.0", "2026-01-01T00:00:00Z"),
            ("1.2.0", "2026-03-01T00:00:00Z"),
            ("1.1.0", "2026-02-01T00:00:00Z"),
        ] {
            store
                .insert_deployment(&Deployment {
                    service: "payments".to_string(),
                    version: version.to_string(),
                    date: parse_timestamp(date).unwrap(),
                    status: "success".to_string(),
                })
                .unwrap();
        }

        let deployments = store.deployments().unwrap();
        assert_eq!(deployments[0].version, "1.2.0");
        assert_eq!(deployments[2].version, "1.0.0");
    }

    #[test]
    fn seed_from_dir_loads_json_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("employees.json"),
            r#"[{"id": 1, "name": "Alice", "email": "alice@example.com",
                 "role": "Engineer", "team": "Platform", "tracker_username": "alice"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("tickets.json"),
            r#"[{"id": "OPS-1", "summary": "Fix login", "assignee": "alice",
                 "status": "Open", "priority": "High"}]"#,
        )
        .unwrap();

        let store = RecordStore::new(open_in_memory().unwrap());
        let (employees, tickets, deployments) = store.seed_from_dir(dir.path()).unwrap();

        assert_eq!((employees, tickets, deployments), (1, 1, 0));
        assert_eq!(store.tickets().unwrap()[0].id, "OPS-1");
    }

    #[test]
    fn empty_tables_read_as_empty() {
        let store = RecordStore::new(open_in_memory().unwrap());
        assert!(store.employees().unwrap().is_empty());
        assert!(store.tickets().unwrap().is_empty());
        assert!(store.deployments().unwrap().is_empty());
    }
}
