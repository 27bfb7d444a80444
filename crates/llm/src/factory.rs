//! Chat client factory.
//!
//! This module provides a factory for creating chat clients based on
//! application configuration. It handles provider resolution and secret
//! injection.

use crate::client::ChatClient;
use crate::providers::{MockChatClient, OpenAiChatClient};
use std::sync::Arc;

/// Default base URL for Ollama's OpenAI-compatible endpoint.
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Create a chat client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama", "mock")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (required for "openai")
///
/// # Errors
/// Returns an error string if the provider is unknown or a required
/// secret is missing. Callers that want fail-open behavior treat this
/// error as "no classifier available" rather than aborting.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> Result<Arc<dyn ChatClient>, String> {
    match provider.to_lowercase().as_str() {
        "openai" => {
            let key = api_key.ok_or_else(|| "OpenAI provider requires API key".to_string())?;
            let client = match endpoint {
                Some(url) => OpenAiChatClient::with_base_url(url, Some(key.to_string())),
                None => OpenAiChatClient::new(Some(key.to_string())),
            };
            Ok(Arc::new(client))
        }
        "ollama" => {
            let base_url = endpoint.unwrap_or(OLLAMA_BASE_URL);
            let client = OpenAiChatClient::with_base_url(base_url, None);
            Ok(Arc::new(client))
        }
        "mock" => Ok(Arc::new(MockChatClient::new())),
        _ => Err(format!("Unknown provider: {}", provider)),
    }
}
