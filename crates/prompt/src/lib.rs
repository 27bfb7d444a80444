//! Prompt templates for OpsDesk.
//!
//! The three prompts the pipeline sends to the LLM provider live here as
//! Handlebars templates, rendered with `no_escape` since everything is plain
//! text. Keeping them in one crate means the text contracts with the
//! provider (notably the sources-footer requirement) are versioned together.

mod builder;
mod templates;

pub use builder::{assistant_system_prompt, intent_prompt};
pub use templates::{DECLINE_SYSTEM_PROMPT, INTENT_SYSTEM_PROMPT};
