//! Prompt rendering.

use crate::templates::{ASSISTANT_SYSTEM_TEMPLATE, INTENT_TEMPLATE};
use handlebars::Handlebars;
use opsdesk_core::{AppError, AppResult};

/// Render the assistant system prompt.
///
/// `documentation` is the retrieved-context block; `history` is the
/// conversation-memory transcript. Either may be absent (or empty, which is
/// treated the same) and its section is omitted entirely.
pub fn assistant_system_prompt(
    documentation: Option<&str>,
    history: Option<&str>,
) -> AppResult<String> {
    render(
        "assistant_system",
        ASSISTANT_SYSTEM_TEMPLATE,
        &serde_json::json!({
            "documentation": documentation.unwrap_or(""),
            "history": history.unwrap_or(""),
        }),
    )
}

/// Render the intent classification prompt for a query.
pub fn intent_prompt(history: Option<&str>, query: &str) -> AppResult<String> {
    render(
        "intent",
        INTENT_TEMPLATE,
        &serde_json::json!({
            "history": history.unwrap_or(""),
            "query": query,
        }),
    )
}

/// Render a Handlebars template with the given data.
fn render(name: &str, template: &str, data: &serde_json::Value) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text prompts, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string(name, template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template '{}': {}", name, e)))?;

    let rendered = handlebars
        .render(name, data)
        .map_err(|e| AppError::Prompt(format!("Failed to render template '{}': {}", name, e)))?;

    tracing::debug!("Rendered prompt '{}' ({} chars)", name, rendered.len());
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_prompt_requires_sources_footer() {
        let prompt = assistant_system_prompt(None, None).unwrap();
        assert!(prompt.contains("Sources:"));
        assert!(prompt.contains("/api/employees"));
        assert!(!prompt.contains("Relevant documentation:"));
        assert!(!prompt.contains("Relevant conversation history:"));
    }

    #[test]
    fn assistant_prompt_includes_context_blocks_when_present() {
        let prompt = assistant_system_prompt(
            Some("[Source: guide.md]\nContent"),
            Some("User: hi\nAssistant: hello"),
        )
        .unwrap();
        assert!(prompt.contains("Relevant documentation:\n[Source: guide.md]"));
        assert!(prompt.contains("Relevant conversation history:\nUser: hi"));
    }

    #[test]
    fn empty_context_is_treated_as_absent() {
        let prompt = assistant_system_prompt(Some(""), Some("")).unwrap();
        assert!(!prompt.contains("Relevant documentation:"));
        assert!(!prompt.contains("Relevant conversation history:"));
    }

    #[test]
    fn intent_prompt_embeds_query_and_history() {
        let prompt = intent_prompt(Some("User: earlier\nAssistant: reply"), "who is on call?")
            .unwrap();
        assert!(prompt.contains("User: earlier"));
        assert!(prompt.contains("\"who is on call?\""));
        assert!(!prompt.contains("No previous conversation"));
    }

    #[test]
    fn intent_prompt_without_history_says_so() {
        let prompt = intent_prompt(None, "query").unwrap();
        assert!(prompt.contains("No previous conversation"));
    }

    #[test]
    fn prompts_are_not_html_escaped() {
        let prompt = assistant_system_prompt(Some("a < b & c"), None).unwrap();
        assert!(prompt.contains("a < b & c"));
    }
}
