//! LLM-backed intent gating.
//!
//! Before any retrieval or tool calling, the query is classified as in- or
//! out-of-scope with a strict YES/NO prompt that includes the conversation
//! transcript, so a topic declined once stays declined on follow-ups.
//!
//! The gate fails open: with no classifier configured, or when the provider
//! call fails, the query is treated as in-scope. Answering is preferred over
//! silently refusing when the classifier itself is unavailable; this default
//! is a product decision and must be preserved.

use opsdesk_llm::{ChatClient, ChatMessage, ChatRequest};
use opsdesk_prompt::{intent_prompt, INTENT_SYSTEM_PROMPT};
use std::sync::Arc;

const CLASSIFIER_MAX_TOKENS: u32 = 10;
const CLASSIFIER_TEMPERATURE: f32 = 0.1;

/// YES/NO scope classifier.
pub struct IntentGate {
    client: Option<Arc<dyn ChatClient>>,
    model: String,
}

impl IntentGate {
    pub fn new(client: Option<Arc<dyn ChatClient>>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Classify a query, given the user's conversation transcript.
    pub async fn in_scope(&self, query: &str, history: &str) -> bool {
        let Some(client) = &self.client else {
            tracing::debug!("No classifier configured; allowing query");
            return true;
        };

        let history = if history.is_empty() {
            None
        } else {
            Some(history)
        };

        let prompt = match intent_prompt(history, query) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!("Failed to render intent prompt: {}", e);
                return true;
            }
        };

        let request = ChatRequest::new(&self.model)
            .with_message(ChatMessage::system(INTENT_SYSTEM_PROMPT))
            .with_message(ChatMessage::user(prompt))
            .with_max_tokens(CLASSIFIER_MAX_TOKENS)
            .with_temperature(CLASSIFIER_TEMPERATURE);

        match client.chat(&request).await {
            Ok(response) => {
                let verdict = response.text().trim().to_lowercase();
                let in_scope = verdict.contains("yes");
                tracing::debug!("Intent classifier verdict: '{}' -> {}", verdict, in_scope);
                in_scope
            }
            Err(e) => {
                tracing::error!("Intent classification failed, allowing query: {}", e);
                true
            }
        }
    }
}
