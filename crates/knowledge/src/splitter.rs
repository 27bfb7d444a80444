//! Header-aware markdown splitting.
//!
//! Documents are parsed once into an ordered heading sequence, then split at
//! second/third-level heading boundaries. Each chunk is attributed to its
//! nearest preceding top-level heading, whose title is prepended as a one-line
//! context line so the chunk carries its surroundings into the index. Both
//! passes are pure functions over immutable inputs.

use crate::types::DocumentChunk;

/// A parsed markdown heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    /// Zero-based line offset in the document
    pub line: usize,
    /// Heading level (1-3)
    pub level: usize,
    /// Heading text without the hash markers
    pub title: String,
}

/// Parse level 1-3 headings with their line offsets.
pub fn parse_headings(content: &str) -> Vec<Heading> {
    content
        .lines()
        .enumerate()
        .filter_map(|(line, text)| parse_heading_line(text).map(|(level, title)| Heading {
            line,
            level,
            title,
        }))
        .collect()
}

fn parse_heading_line(line: &str) -> Option<(usize, String)> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if !(1..=3).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    let title = rest.trim();
    if title.is_empty() {
        return None;
    }
    Some((hashes, title.to_string()))
}

/// Document title: first top-level heading, else the filename stem.
pub fn document_title(content: &str, stem: &str) -> String {
    parse_headings(content)
        .into_iter()
        .find(|h| h.level == 1)
        .map(|h| h.title)
        .unwrap_or_else(|| stem.to_string())
}

/// Collapse runs of three or more consecutive blank lines to exactly one.
///
/// Shorter runs are left alone; this is noise reduction for embedding
/// quality, not full whitespace normalization.
pub fn collapse_blank_runs(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blanks = 0usize;

    for line in text.lines() {
        if line.trim().is_empty() {
            blanks += 1;
            continue;
        }
        for _ in 0..blank_emit(blanks) {
            out.push("");
        }
        blanks = 0;
        out.push(line);
    }
    for _ in 0..blank_emit(blanks) {
        out.push("");
    }

    out.join("\n")
}

fn blank_emit(run: usize) -> usize {
    if run >= 3 {
        1
    } else {
        run
    }
}

/// Split content into sections at level-2/3 heading boundaries.
///
/// Returns `(start_line, text)` pairs; heading lines stay verbatim at the
/// start of their section. The leading section (before any subsection
/// heading) starts at line zero and may be empty.
fn split_sections(content: &str) -> Vec<(usize, String)> {
    let mut sections: Vec<(usize, Vec<&str>)> = vec![(0, Vec::new())];

    for (line, text) in content.lines().enumerate() {
        let is_boundary = matches!(parse_heading_line(text), Some((level, _)) if level >= 2);
        if is_boundary {
            sections.push((line, Vec::new()));
        }
        if let Some((_, lines)) = sections.last_mut() {
            lines.push(text);
        }
    }

    sections
        .into_iter()
        .map(|(start, lines)| (start, lines.join("\n")))
        .collect()
}

/// Split content into blank-line-delimited paragraphs (headerless fallback).
fn split_paragraphs(content: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
}

/// Split a document into chunks with deterministic ids and parent context.
pub fn chunk_document(
    stem: &str,
    filename: &str,
    source_path: &str,
    content: &str,
) -> Vec<DocumentChunk> {
    let headings = parse_headings(content);
    let title = headings
        .iter()
        .find(|h| h.level == 1)
        .map(|h| h.title.clone())
        .unwrap_or_else(|| stem.to_string());

    let bodies: Vec<String> = if headings.is_empty() {
        split_paragraphs(content)
    } else {
        split_sections(content)
            .into_iter()
            .filter_map(|(start_line, text)| {
                let body = collapse_blank_runs(text.trim());
                if body.trim().is_empty() {
                    return None;
                }
                // Last top-level heading at or before this section's start
                let parent = headings
                    .iter()
                    .filter(|h| h.level == 1 && h.line <= start_line)
                    .next_back()
                    .map(|h| h.title.as_str());
                Some(match parent {
                    Some(parent) => format!("{}\n\n{}", parent, body),
                    None => body,
                })
            })
            .collect()
    };

    bodies
        .into_iter()
        .enumerate()
        .map(|(sequence, content)| DocumentChunk {
            id: format!("{}_{}", stem, sequence),
            title: title.clone(),
            filename: filename.to_string(),
            content,
            source_path: source_path.to_string(),
        })
        .collect()
}
