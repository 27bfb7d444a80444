//! Footer-based source extraction.
//!
//! The assistant's system prompt requires every answer to end with a
//! `Sources: ...` footer. This module is the single place that parses that
//! text contract: it pulls the source list out and strips the footer from
//! the answer before anything is persisted or shown. An answer without a
//! footer is valid and yields an empty source list.

use regex::Regex;
use std::sync::OnceLock;

fn footer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)sources:\s*(.+)").expect("footer pattern is a valid regex")
    })
}

/// Split an answer into clean text and its footer-declared sources.
///
/// The footer is terminal: the matched `Sources:` line and everything after
/// it are removed, along with a trailing `---` delimiter line if one
/// precedes it. Sources are comma-split, trimmed, de-duplicated preserving
/// order, with empties dropped.
pub fn extract_sources(answer: &str) -> (String, Vec<String>) {
    let Some(captures) = footer_pattern().captures(answer) else {
        return (answer.to_string(), Vec::new());
    };

    let matched = captures.get(0).map(|m| m.start()).unwrap_or(0);
    let sources_text = captures.get(1).map(|m| m.as_str()).unwrap_or("");

    let mut seen = std::collections::HashSet::new();
    let sources: Vec<String> = sources_text
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect();

    let mut clean = answer[..matched].trim_end();

    // Drop the delimiter rule that conventionally precedes the footer
    if let Some(rest) = clean.strip_suffix("---") {
        clean = rest.trim_end();
    }

    (clean.to_string(), sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_sources_and_strips_footer() {
        let answer = "The on-call engineer is Alice.\n\n---\nSources: escalation_policy.md, /api/employees";
        let (clean, sources) = extract_sources(answer);

        assert_eq!(clean, "The on-call engineer is Alice.");
        assert_eq!(sources, vec!["escalation_policy.md", "/api/employees"]);
        assert!(!clean.contains("Sources:"));
        assert!(!clean.contains("---"));
    }

    #[test]
    fn no_footer_means_no_sources_and_unchanged_text() {
        let answer = "Just an answer with no citations.";
        let (clean, sources) = extract_sources(answer);
        assert_eq!(clean, answer);
        assert!(sources.is_empty());
    }

    #[test]
    fn footer_match_is_case_insensitive() {
        let (clean, sources) = extract_sources("Answer.\n\nSOURCES: a.md");
        assert_eq!(clean, "Answer.");
        assert_eq!(sources, vec!["a.md"]);
    }

    #[test]
    fn footer_spanning_lines_is_captured_whole() {
        let (clean, sources) = extract_sources("Answer.\n\nSources: a.md,\nb.md, c.md");
        assert_eq!(clean, "Answer.");
        assert_eq!(sources, vec!["a.md", "b.md", "c.md"]);
    }

    #[test]
    fn duplicate_sources_are_removed_preserving_order() {
        let (_, sources) = extract_sources("Answer.\n\nSources: b.md, a.md, b.md, a.md");
        assert_eq!(sources, vec!["b.md", "a.md"]);
    }

    #[test]
    fn empty_items_are_dropped() {
        let (_, sources) = extract_sources("Answer.\n\nSources: a.md, , ,b.md,");
        assert_eq!(sources, vec!["a.md", "b.md"]);
    }

    #[test]
    fn footer_only_answer_yields_empty_text() {
        let (clean, sources) = extract_sources("Sources: a.md");
        assert_eq!(clean, "");
        assert_eq!(sources, vec!["a.md"]);
    }
}
