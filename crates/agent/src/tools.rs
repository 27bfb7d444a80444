//! The fixed tool registry and its local executor.
//!
//! Three tools over internal records are offered to the LLM. The model only
//! ever chooses tools and arguments; execution always happens here, against
//! the record store. The LLM never touches storage directly: that is a
//! trust boundary, and it keeps filtering and error shaping in one place.

use opsdesk_llm::ToolSpec;
use opsdesk_store::RecordStore;
use serde_json::{json, Value};

/// Static definitions for the three internal-data tools.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "get_employees",
            "Get employee information including names, roles, contact info, and team membership",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Employee name to filter by"},
                    "id": {"type": "string", "description": "Employee ID to filter by"},
                    "email": {"type": "string", "description": "Employee email to filter by"},
                    "role": {"type": "string", "description": "Employee role to filter by"},
                    "team": {"type": "string", "description": "Team name to filter by"},
                    "tracker_username": {"type": "string", "description": "Issue tracker username to filter by"}
                },
                "required": []
            }),
        ),
        ToolSpec::new(
            "get_deployments",
            "Get deployment information including service names, versions, dates, and status",
            json!({
                "type": "object",
                "properties": {
                    "service": {"type": "string", "description": "Service name to filter by"},
                    "version": {"type": "string", "description": "Version to filter by"},
                    "status": {"type": "string", "description": "Deployment status to filter by"},
                    "date": {"type": "string", "description": "Deployment date to filter by"}
                },
                "required": []
            }),
        ),
        ToolSpec::new(
            "get_tickets",
            "Get ticket information including summaries, assignees, status, and priority",
            json!({
                "type": "object",
                "properties": {
                    "id": {"type": "string", "description": "Ticket ID to filter by"},
                    "summary": {"type": "string", "description": "Ticket summary to filter by"},
                    "assignee": {"type": "string", "description": "Assignee name to filter by"},
                    "status": {"type": "string", "description": "Ticket status to filter by"},
                    "priority": {"type": "string", "description": "Ticket priority to filter by"}
                },
                "required": []
            }),
        ),
    ]
}

/// The logical endpoint name a tool's results are labeled with for citation.
fn endpoint(tool_name: &str) -> Option<(&'static str, &'static str, &'static str)> {
    // (label, endpoint path, result key)
    match tool_name {
        "get_employees" => Some(("Employee", "/api/employees", "employees")),
        "get_deployments" => Some(("Deployment", "/api/deployments", "deployments")),
        "get_tickets" => Some(("Ticket", "/api/tickets", "tickets")),
        _ => None,
    }
}

/// Executes tool calls locally against the record store.
#[derive(Clone)]
pub struct ToolExecutor {
    records: RecordStore,
}

impl ToolExecutor {
    pub fn new(records: RecordStore) -> Self {
        Self { records }
    }

    /// Execute a tool by name.
    ///
    /// Always returns a payload: unknown tools and storage failures come
    /// back as `{"error": ...}` objects visible to the synthesis phase, not
    /// as faults.
    pub fn execute(&self, tool_name: &str, args: &Value) -> Value {
        tracing::info!("Executing tool {} with arguments: {}", tool_name, args);

        let result = match tool_name {
            "get_employees" => self
                .records
                .employees()
                .map(|records| filtered_payload("employees", &records, args)),
            "get_deployments" => self
                .records
                .deployments()
                .map(|records| filtered_payload("deployments", &records, args)),
            "get_tickets" => self
                .records
                .tickets()
                .map(|records| filtered_payload("tickets", &records, args)),
            _ => return json!({"error": format!("Unknown tool: {}", tool_name)}),
        };

        match result {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Tool {} failed: {}", tool_name, e);
                json!({"error": e.to_string()})
            }
        }
    }

    /// Format executed tool results into one labeled block for the LLM.
    ///
    /// Known tools are labeled with their logical endpoint so the model can
    /// cite them; error payloads are included verbatim under the tool name.
    pub fn format_results(results: &[(String, Value)]) -> String {
        results
            .iter()
            .map(|(tool_name, result)| {
                let pretty = |v: &Value| {
                    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
                };
                match endpoint(tool_name) {
                    Some((label, path, key)) if result.get(key).is_some() => format!(
                        "{} data (from {} endpoint):\n{}",
                        label,
                        path,
                        pretty(&result[key])
                    ),
                    _ => format!("{} result:\n{}", tool_name, pretty(result)),
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Serialize records, apply the filters, and wrap them under their key.
fn filtered_payload<T: serde::Serialize>(key: &str, records: &[T], args: &Value) -> Value {
    let rows: Vec<Value> = records
        .iter()
        .filter_map(|record| serde_json::to_value(record).ok())
        .filter(|row| record_matches(row, args))
        .collect();

    json!({ key: rows })
}

/// Check a record against a filter object: every provided field must match.
///
/// String fields match by case-insensitive substring; other types require
/// exact equality. Absent or falsy filter values apply no constraint, and a
/// filter key the record doesn't have is ignored.
fn record_matches(record: &Value, filters: &Value) -> bool {
    let Some(filters) = filters.as_object() else {
        return true;
    };

    filters.iter().all(|(key, wanted)| {
        if is_falsy(wanted) {
            return true;
        }
        let Some(actual) = record.get(key) else {
            return true;
        };
        field_matches(actual, wanted)
    })
}

fn field_matches(actual: &Value, wanted: &Value) -> bool {
    match (actual.as_str(), wanted.as_str()) {
        (Some(actual), Some(wanted)) => actual.to_lowercase().contains(&wanted.to_lowercase()),
        _ => actual == wanted,
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(a) => a.is_empty(),
        Value::Object(m) => m.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_store::db::open_in_memory;
    use opsdesk_store::{Employee, Ticket};

    fn executor_with_employees() -> ToolExecutor {
        let records = RecordStore::new(open_in_memory().unwrap());
        for (id, name, team) in [
            (1, "Alice", "Platform"),
            (2, "Bob", "Payments"),
            (3, "Carol", "Platform Infra"),
        ] {
            records
                .insert_employee(&Employee {
                    id,
                    name: name.to_string(),
                    email: format!("{}@example.com", name.to_lowercase()),
                    role: "Engineer".to_string(),
                    team: team.to_string(),
                    tracker_username: name.to_lowercase(),
                })
                .unwrap();
        }
        ToolExecutor::new(records)
    }

    #[test]
    fn tool_specs_cover_the_three_data_sources() {
        let specs = tool_specs();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["get_employees", "get_deployments", "get_tickets"]);
        for spec in &specs {
            assert_eq!(spec.parameters["type"], "object");
        }
    }

    #[test]
    fn team_filter_is_case_insensitive_substring() {
        let executor = executor_with_employees();
        let result = executor.execute("get_employees", &json!({"team": "platform"}));

        let employees = result["employees"].as_array().unwrap();
        assert_eq!(employees.len(), 2);
        assert_eq!(employees[0]["name"], "Alice");
        assert_eq!(employees[1]["name"], "Carol");
    }

    #[test]
    fn empty_filter_returns_all_records() {
        let executor = executor_with_employees();
        let result = executor.execute("get_employees", &json!({}));
        assert_eq!(result["employees"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn falsy_filter_values_are_ignored() {
        let executor = executor_with_employees();
        let result = executor.execute(
            "get_employees",
            &json!({"team": "", "name": null, "role": "engineer"}),
        );
        assert_eq!(result["employees"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn multiple_filters_are_anded() {
        let executor = executor_with_employees();
        let result = executor.execute(
            "get_employees",
            &json!({"team": "platform", "name": "carol"}),
        );
        let employees = result["employees"].as_array().unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0]["name"], "Carol");
    }

    #[test]
    fn non_string_fields_require_exact_equality() {
        let executor = executor_with_employees();

        let exact = executor.execute("get_employees", &json!({"id": 2}));
        assert_eq!(exact["employees"].as_array().unwrap().len(), 1);

        // A string filter against a numeric field is an exact mismatch
        let mismatch = executor.execute("get_employees", &json!({"id": "2"}));
        assert!(mismatch["employees"].as_array().unwrap().is_empty());
    }

    #[test]
    fn unknown_tool_yields_error_payload() {
        let executor = executor_with_employees();
        let result = executor.execute("get_weather", &json!({}));
        assert!(result["error"]
            .as_str()
            .unwrap()
            .contains("Unknown tool: get_weather"));
    }

    #[test]
    fn unknown_filter_key_is_ignored() {
        let executor = executor_with_employees();
        let result = executor.execute("get_employees", &json!({"favorite_color": "blue"}));
        assert_eq!(result["employees"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn format_results_labels_known_endpoints() {
        let executor = executor_with_employees();
        executor
            .records
            .insert_ticket(&Ticket {
                id: "OPS-1".to_string(),
                summary: "Fix login".to_string(),
                assignee: "alice".to_string(),
                status: "Open".to_string(),
                priority: "High".to_string(),
            })
            .unwrap();

        let results = vec![
            (
                "get_employees".to_string(),
                executor.execute("get_employees", &json!({})),
            ),
            (
                "get_tickets".to_string(),
                executor.execute("get_tickets", &json!({})),
            ),
        ];

        let text = ToolExecutor::format_results(&results);
        assert!(text.contains("Employee data (from /api/employees endpoint):"));
        assert!(text.contains("Ticket data (from /api/tickets endpoint):"));
        assert!(text.contains("Alice"));
        assert!(text.contains("OPS-1"));
    }

    #[test]
    fn format_results_includes_error_payloads() {
        let results = vec![(
            "get_weather".to_string(),
            json!({"error": "Unknown tool: get_weather"}),
        )];
        let text = ToolExecutor::format_results(&results);
        assert!(text.contains("get_weather result:"));
        assert!(text.contains("Unknown tool"));
    }
}
