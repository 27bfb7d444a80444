//! Mock chat provider with scripted responses.
//!
//! Used by tests and for offline runs. Responses are served from a queue in
//! order; when the queue is exhausted the client falls back to a fixed reply.

use crate::client::{ChatClient, ChatRequest, ChatResponse};
use opsdesk_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted mock chat client.
pub struct MockChatClient {
    responses: Mutex<VecDeque<ChatResponse>>,
    fail_with: Option<String>,
}

impl MockChatClient {
    /// Create a mock that always returns a fixed canned reply.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fail_with: None,
        }
    }

    /// Create a mock that serves the given responses in order.
    pub fn with_responses(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fail_with: None,
        }
    }

    /// Create a mock whose every call fails with the given error message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fail_with: Some(message.into()),
        }
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChatClient for MockChatClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        if let Some(ref message) = self.fail_with {
            return Err(AppError::Llm(message.clone()));
        }

        let scripted = self
            .responses
            .lock()
            .map_err(|_| AppError::Llm("Mock response queue poisoned".to_string()))?
            .pop_front();

        Ok(scripted.unwrap_or_else(|| {
            tracing::debug!(
                "Mock client exhausted its script ({} messages in request)",
                request.messages.len()
            );
            ChatResponse::text_response("This is a canned response from the mock provider.")
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ChatMessage, ToolCall};

    #[tokio::test]
    async fn serves_scripted_responses_in_order() {
        let client = MockChatClient::with_responses(vec![
            ChatResponse::tool_call_response(vec![ToolCall {
                id: "call_1".to_string(),
                name: "get_employees".to_string(),
                arguments: "{}".to_string(),
            }]),
            ChatResponse::text_response("final answer"),
        ]);

        let request = ChatRequest::new("test").with_message(ChatMessage::user("hi"));

        let first = client.chat(&request).await.unwrap();
        assert!(first.has_tool_calls());

        let second = client.chat(&request).await.unwrap();
        assert_eq!(second.text(), "final answer");

        // Exhausted queue falls back to the canned reply
        let third = client.chat(&request).await.unwrap();
        assert!(!third.text().is_empty());
    }

    #[tokio::test]
    async fn failing_mock_always_errors() {
        let client = MockChatClient::failing("provider down");
        let request = ChatRequest::new("test").with_message(ChatMessage::user("hi"));
        assert!(client.chat(&request).await.is_err());
    }
}
