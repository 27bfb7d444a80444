//! LLM integration crate for OpsDesk.
//!
//! This crate provides a provider-agnostic abstraction for chat-style LLM
//! completions with structured tool calling. A request carries a message
//! list and an optional set of tool definitions; the response carries either
//! plain text or the tool calls the model chose to make.
//!
//! # Providers
//! - **OpenAI-compatible**: any endpoint speaking the `/chat/completions`
//!   wire format (OpenAI itself, Ollama's `/v1` endpoint, local gateways)
//! - **Mock**: scripted responses for tests and offline runs
//!
//! # Example
//! ```no_run
//! use opsdesk_llm::{ChatClient, ChatMessage, ChatRequest, providers::OpenAiChatClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiChatClient::new(Some("sk-...".to_string()));
//! let request = ChatRequest::new("gpt-4o-mini")
//!     .with_message(ChatMessage::system("You are a helpful assistant."))
//!     .with_message(ChatMessage::user("Hello!"));
//! let response = client.chat(&request).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{
    ChatClient, ChatMessage, ChatRequest, ChatResponse, LlmUsage, Role, ToolCall, ToolSpec,
};
pub use factory::create_client;
pub use providers::{MockChatClient, OpenAiChatClient};
