//! The query processor.
//!
//! Orchestrates one query end to end: intent gate, context retrieval, the
//! two-phase tool-calling loop against the LLM provider, footer-based source
//! extraction, and the interaction log append. Every failure path still
//! produces a well-formed response; callers never see a raw fault.
//!
//! The two phases are strictly sequential per query: the synthesis call's
//! prompt depends on the executed tool results. Tools run in the order the
//! provider returned them.

use crate::footer::extract_sources;
use crate::gate::IntentGate;
use crate::memory::{ConversationMemory, DEFAULT_MAX_CONTEXT_CHARS};
use crate::tools::{tool_specs, ToolExecutor};
use crate::types::QueryResponse;
use opsdesk_core::{AppError, AppResult};
use opsdesk_knowledge::ContextRetriever;
use opsdesk_llm::{ChatClient, ChatMessage, ChatRequest};
use opsdesk_prompt::{assistant_system_prompt, DECLINE_SYSTEM_PROMPT};
use opsdesk_store::{ConversationStats, InteractionLog, LogEntry, NewLogEntry, QueryType};
use std::sync::Arc;
use std::time::Instant;

const DEFAULT_USER: &str = "default";

const ANSWER_MAX_TOKENS: u32 = 1000;
const DECLINE_MAX_TOKENS: u32 = 400;
const ANSWER_TEMPERATURE: f32 = 0.7;

const ANSWER_CONFIDENCE: f32 = 0.8;
const DECLINE_CONFIDENCE: f32 = 0.9;
const FALLBACK_DECLINE_CONFIDENCE: f32 = 0.8;

const ERROR_ANSWER: &str = "I apologize, but I encountered an error processing your query. \
     Please try again or contact support.";

const FALLBACK_DECLINE: &str = "I apologize, but this query is outside my scope. I can help \
     you with information about employees, deployments, tickets, and internal documentation. \
     Please ask me about these topics instead.";

/// What the pipeline decided, before it is logged and returned.
struct Outcome {
    answer: String,
    sources: Vec<String>,
    confidence: f32,
    query_type: QueryType,
}

/// Orchestrates the full question-answering pipeline.
///
/// Constructed once at startup with explicit handles to its collaborators;
/// each call to [`process_query`](Self::process_query) is an independent,
/// stateless unit of work.
pub struct QueryProcessor {
    client: Option<Arc<dyn ChatClient>>,
    model: String,
    retriever: ContextRetriever,
    memory: ConversationMemory,
    gate: IntentGate,
    tools: ToolExecutor,
    log: InteractionLog,
}

impl QueryProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Option<Arc<dyn ChatClient>>,
        model: impl Into<String>,
        retriever: ContextRetriever,
        memory: ConversationMemory,
        gate: IntentGate,
        tools: ToolExecutor,
        log: InteractionLog,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            retriever,
            memory,
            gate,
            tools,
            log,
        }
    }

    /// Process a user query through the complete pipeline.
    ///
    /// Never returns an error: failures degrade to an apologetic response
    /// with `query_type = error` and zero confidence. The interaction is
    /// logged best-effort either way.
    pub async fn process_query(&self, query: &str, user_id: Option<&str>) -> QueryResponse {
        let start = Instant::now();
        let trace_id = uuid::Uuid::new_v4();
        let user = user_id.unwrap_or(DEFAULT_USER);

        tracing::info!("Processing query {}: {}", trace_id, query);

        let outcome = match self.run_pipeline(query, user).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Error processing query {}: {}", trace_id, e);
                Outcome {
                    answer: ERROR_ANSWER.to_string(),
                    sources: Vec::new(),
                    confidence: 0.0,
                    query_type: QueryType::Error,
                }
            }
        };

        let processing_time = start.elapsed().as_secs_f64();

        let log_id = match self.log.append(&NewLogEntry {
            query: query.to_string(),
            response_text: outcome.answer.clone(),
            sources: outcome.sources.clone(),
            query_type: outcome.query_type,
            processing_time_seconds: processing_time,
            user_id: Some(user.to_string()),
        }) {
            Ok(id) => Some(id),
            Err(e) => {
                // Observability must not fail the user-facing path
                tracing::warn!("Failed to log interaction: {}", e);
                None
            }
        };

        tracing::info!(
            "Query {} completed in {:.2}s ({})",
            trace_id,
            processing_time,
            outcome.query_type.as_str()
        );

        QueryResponse {
            answer: outcome.answer,
            sources: outcome.sources,
            confidence: outcome.confidence,
            query_type: outcome.query_type,
            log_id,
        }
    }

    async fn run_pipeline(&self, query: &str, user: &str) -> AppResult<Outcome> {
        let history = self
            .memory
            .context(user, DEFAULT_MAX_CONTEXT_CHARS)
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build conversation context: {}", e);
                String::new()
            });

        if !self.gate.in_scope(query, &history).await {
            tracing::info!("Query determined to be out of scope: {}", query);
            return Ok(self.decline(query, &history).await);
        }

        let documentation = self.retrieve_context(query);

        self.answer_with_tools(query, &history, &documentation)
            .await
    }

    /// Retrieve documentation context, degrading to none on failure.
    fn retrieve_context(&self, query: &str) -> String {
        let started = Instant::now();
        match self.retriever.context_for(query) {
            Ok(context) => {
                self.log.record_action(
                    query,
                    "retrieval_completed",
                    Some(&format!("{} chars of context", context.len())),
                    None,
                    started.elapsed().as_secs_f64(),
                );
                context
            }
            Err(e) => {
                tracing::error!("Context retrieval failed: {}", e);
                self.log.record_action(
                    query,
                    "retrieval_error",
                    None,
                    Some(&e.to_string()),
                    started.elapsed().as_secs_f64(),
                );
                String::new()
            }
        }
    }

    /// The two-phase tool-calling loop.
    async fn answer_with_tools(
        &self,
        query: &str,
        history: &str,
        documentation: &str,
    ) -> AppResult<Outcome> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| AppError::Llm("LLM provider not configured".to_string()))?;

        let system = assistant_system_prompt(non_empty(documentation), non_empty(history))?;

        let mut messages = vec![ChatMessage::system(system), ChatMessage::user(query)];

        // Phase 1: planning call with tools enabled
        let request = ChatRequest::new(&self.model)
            .with_messages(messages.clone())
            .with_tools(tool_specs())
            .with_max_tokens(ANSWER_MAX_TOKENS)
            .with_temperature(ANSWER_TEMPERATURE);

        let started = Instant::now();
        let planning = match client.chat(&request).await {
            Ok(response) => {
                self.log.record_action(
                    query,
                    "planning_call_completed",
                    Some(&format!("{} tool calls", response.tool_calls.len())),
                    None,
                    started.elapsed().as_secs_f64(),
                );
                response
            }
            Err(e) => {
                self.log.record_action(
                    query,
                    "planning_call_error",
                    None,
                    Some(&e.to_string()),
                    started.elapsed().as_secs_f64(),
                );
                return Err(e);
            }
        };

        if !planning.has_tool_calls() {
            // No tools requested: the model answered from static knowledge
            tracing::info!("No tools called; treating as static knowledge");
            self.log.record_action(
                query,
                "no_tools_called",
                Some("static knowledge only"),
                None,
                0.0,
            );

            let (answer, sources) = extract_sources(planning.text());
            return Ok(Outcome {
                answer,
                sources,
                confidence: ANSWER_CONFIDENCE,
                query_type: QueryType::StaticKnowledge,
            });
        }

        // Phase 2: execute the requested tools locally, in return order
        let mut results: Vec<(String, serde_json::Value)> = Vec::new();
        for call in &planning.tool_calls {
            let started = Instant::now();
            let result = match call.parsed_arguments() {
                Ok(args) => {
                    tracing::info!("Tool {} requested with arguments: {}", call.name, args);
                    self.tools.execute(&call.name, &args)
                }
                Err(e) => serde_json::json!({"error": e.to_string()}),
            };

            let error = result.get("error").and_then(|e| e.as_str());
            self.log.record_action(
                query,
                &format!("tool_called_{}", call.name),
                Some(&format!("{} chars returned", result.to_string().len())),
                error,
                started.elapsed().as_secs_f64(),
            );

            results.push((call.name.clone(), result));
        }

        let results_text = ToolExecutor::format_results(&results);

        messages.push(ChatMessage::assistant(
            "I need to call some tools to get the information you requested.",
            planning.tool_calls.clone(),
        ));
        messages.push(ChatMessage::tool(
            results_text,
            planning.tool_calls[0].id.clone(),
        ));

        // Synthesis call: no tools this time, just the final answer
        let synthesis_request = ChatRequest::new(&self.model)
            .with_messages(messages)
            .with_max_tokens(ANSWER_MAX_TOKENS)
            .with_temperature(ANSWER_TEMPERATURE);

        let started = Instant::now();
        let synthesis = match client.chat(&synthesis_request).await {
            Ok(response) => {
                self.log.record_action(
                    query,
                    "synthesis_call_completed",
                    Some(&format!("{} chars", response.text().len())),
                    None,
                    started.elapsed().as_secs_f64(),
                );
                response
            }
            Err(e) => {
                self.log.record_action(
                    query,
                    "synthesis_call_error",
                    None,
                    Some(&e.to_string()),
                    started.elapsed().as_secs_f64(),
                );
                return Err(e);
            }
        };

        let (answer, sources) = extract_sources(synthesis.text());
        Ok(Outcome {
            answer,
            sources,
            confidence: ANSWER_CONFIDENCE,
            query_type: QueryType::DynamicData,
        })
    }

    /// Generate a polite, scope-aware decline.
    async fn decline(&self, query: &str, history: &str) -> Outcome {
        let fallback = || Outcome {
            answer: FALLBACK_DECLINE.to_string(),
            sources: Vec::new(),
            confidence: FALLBACK_DECLINE_CONFIDENCE,
            query_type: QueryType::OutOfScope,
        };

        let Some(client) = &self.client else {
            return fallback();
        };

        let mut messages = vec![ChatMessage::system(DECLINE_SYSTEM_PROMPT)];
        if !history.is_empty() {
            messages.push(ChatMessage::system(format!(
                "Previous conversation context:\n{}",
                history
            )));
        }
        messages.push(ChatMessage::user(format!("Query: {}", query)));

        let request = ChatRequest::new(&self.model)
            .with_messages(messages)
            .with_max_tokens(DECLINE_MAX_TOKENS)
            .with_temperature(ANSWER_TEMPERATURE);

        match client.chat(&request).await {
            Ok(response) => Outcome {
                answer: response.text().to_string(),
                sources: Vec::new(),
                confidence: DECLINE_CONFIDENCE,
                query_type: QueryType::OutOfScope,
            },
            Err(e) => {
                tracing::error!("Decline generation failed: {}", e);
                fallback()
            }
        }
    }

    /// Recent interaction history for a user, most-recent-first.
    pub fn get_conversation_history(&self, user_id: &str, limit: usize) -> AppResult<Vec<LogEntry>> {
        self.log.get(limit, Some(user_id))
    }

    /// Aggregate conversation statistics for a user.
    pub fn get_conversation_stats(&self, user_id: &str) -> AppResult<ConversationStats> {
        self.memory.stats(user_id)
    }

    /// Attach feedback to a logged interaction.
    ///
    /// Returns `Ok(false)` when the log id does not exist.
    pub fn set_feedback(
        &self,
        log_id: i64,
        helpful: bool,
        feedback_text: Option<&str>,
    ) -> AppResult<bool> {
        self.log.set_feedback(log_id, helpful, feedback_text)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_knowledge::SqliteVectorStore;
    use opsdesk_llm::{ChatResponse, MockChatClient, ToolCall};
    use opsdesk_store::db::open_in_memory;
    use opsdesk_store::{Employee, RecordStore};

    fn tool_call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    /// Build a processor over in-memory stores with three seeded employees.
    fn processor_with(
        gate_client: Option<Arc<dyn ChatClient>>,
        client: Option<Arc<dyn ChatClient>>,
    ) -> (QueryProcessor, InteractionLog) {
        let conn = open_in_memory().unwrap();
        let records = RecordStore::new(conn.clone());
        for (id, name) in [(1, "Alice"), (2, "Bob"), (3, "Carol")] {
            records
                .insert_employee(&Employee {
                    id,
                    name: name.to_string(),
                    email: format!("{}@example.com", name.to_lowercase()),
                    role: "Engineer".to_string(),
                    team: "Platform".to_string(),
                    tracker_username: name.to_lowercase(),
                })
                .unwrap();
        }

        let log = InteractionLog::new(conn);
        let store = Arc::new(SqliteVectorStore::open_in_memory().unwrap());

        let processor = QueryProcessor::new(
            client,
            "test-model",
            ContextRetriever::new(store),
            ConversationMemory::new(log.clone()),
            IntentGate::new(gate_client, "test-model"),
            ToolExecutor::new(records),
            log.clone(),
        );

        (processor, log)
    }

    fn scripted(responses: Vec<ChatResponse>) -> Option<Arc<dyn ChatClient>> {
        Some(Arc::new(MockChatClient::with_responses(responses)))
    }

    #[tokio::test]
    async fn dynamic_data_query_end_to_end() {
        let (processor, log) = processor_with(
            None, // gate fails open without a classifier
            scripted(vec![
                ChatResponse::tool_call_response(vec![tool_call("get_employees", "{}")]),
                ChatResponse::text_response(
                    "The team is Alice, Bob, and Carol.\n\n---\nSources: /api/employees",
                ),
            ]),
        );

        let response = processor.process_query("Who are the employees?", None).await;

        assert_eq!(response.query_type, QueryType::DynamicData);
        assert_eq!(response.sources, vec!["/api/employees"]);
        assert!(response.answer.contains("Alice"));
        assert!(!response.answer.contains("Sources:"));
        assert!((response.confidence - 0.8).abs() < f32::EPSILON);
        assert!(response.log_id.is_some());

        // The interaction was logged without the footer, and audit rows exist
        let entries = log.get(50, None).unwrap();
        let interaction = entries
            .iter()
            .find(|e| e.query_type == QueryType::DynamicData)
            .expect("interaction logged");
        assert!(!interaction.response_text.contains("Sources:"));
        assert_eq!(interaction.sources, vec!["/api/employees"]);
        assert!(entries
            .iter()
            .any(|e| e.query_type == QueryType::Log
                && e.response_text == "tool_called_get_employees"));
    }

    #[tokio::test]
    async fn no_tool_calls_means_static_knowledge() {
        let (processor, _log) = processor_with(
            None,
            scripted(vec![ChatResponse::text_response(
                "Escalate to the on-call lead first.\n\n---\nSources: escalation_policy.md",
            )]),
        );

        let response = processor
            .process_query("What is the escalation policy?", Some("alice"))
            .await;

        assert_eq!(response.query_type, QueryType::StaticKnowledge);
        assert_eq!(response.sources, vec!["escalation_policy.md"]);
        assert!(!response.answer.contains("Sources:"));
    }

    #[tokio::test]
    async fn answer_without_footer_keeps_text_and_empty_sources() {
        let (processor, _log) = processor_with(
            None,
            scripted(vec![ChatResponse::text_response("A bare answer.")]),
        );

        let response = processor.process_query("q", None).await;
        assert_eq!(response.answer, "A bare answer.");
        assert!(response.sources.is_empty());
    }

    #[tokio::test]
    async fn out_of_scope_query_is_declined_without_tools() {
        let (processor, _log) = processor_with(
            scripted(vec![ChatResponse::text_response("NO")]),
            scripted(vec![ChatResponse::text_response(
                "I can only help with internal topics like employees and deployments.",
            )]),
        );

        let response = processor
            .process_query("Best pasta recipe?", Some("alice"))
            .await;

        assert_eq!(response.query_type, QueryType::OutOfScope);
        assert!(response.sources.is_empty());
        assert!((response.confidence - 0.9).abs() < f32::EPSILON);
        assert!(response.answer.contains("internal topics"));
    }

    #[tokio::test]
    async fn gate_failure_fails_open_end_to_end() {
        let (processor, _log) = processor_with(
            Some(Arc::new(MockChatClient::failing("classifier down"))),
            scripted(vec![ChatResponse::text_response(
                "Answer anyway.\n\n---\nSources: guide.md",
            )]),
        );

        let response = processor.process_query("Anything?", None).await;

        // Still processed rather than declined
        assert_eq!(response.query_type, QueryType::StaticKnowledge);
        assert_eq!(response.sources, vec!["guide.md"]);
    }

    #[tokio::test]
    async fn decline_falls_back_when_provider_fails() {
        let (processor, _log) = processor_with(
            scripted(vec![ChatResponse::text_response("NO")]),
            Some(Arc::new(MockChatClient::failing("provider down"))),
        );

        let response = processor.process_query("Pasta?", None).await;

        assert_eq!(response.query_type, QueryType::OutOfScope);
        assert!((response.confidence - 0.8).abs() < f32::EPSILON);
        assert!(response.answer.contains("outside my scope"));
    }

    #[tokio::test]
    async fn provider_failure_yields_error_envelope() {
        let (processor, log) = processor_with(
            None,
            Some(Arc::new(MockChatClient::failing("connection refused"))),
        );

        let response = processor.process_query("Who is on call?", Some("alice")).await;

        assert_eq!(response.query_type, QueryType::Error);
        assert_eq!(response.confidence, 0.0);
        assert!(response.sources.is_empty());
        assert!(response.answer.contains("I apologize"));
        // The failed interaction is still logged
        assert!(response.log_id.is_some());
        let entries = log.get(10, Some("alice")).unwrap();
        assert_eq!(entries[0].query_type, QueryType::Error);
    }

    #[tokio::test]
    async fn missing_provider_yields_error_envelope() {
        let (processor, _log) = processor_with(None, None);
        let response = processor.process_query("Who is on call?", None).await;
        assert_eq!(response.query_type, QueryType::Error);
        assert_eq!(response.confidence, 0.0);
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_payload_not_fault() {
        let (processor, _log) = processor_with(
            None,
            scripted(vec![
                ChatResponse::tool_call_response(vec![tool_call("get_weather", "{}")]),
                ChatResponse::text_response("I don't have weather data."),
            ]),
        );

        let response = processor.process_query("Weather?", None).await;

        // Synthesis still ran over the error payload
        assert_eq!(response.query_type, QueryType::DynamicData);
        assert!(response.answer.contains("weather data"));
    }

    #[tokio::test]
    async fn malformed_tool_arguments_degrade_per_tool() {
        let (processor, _log) = processor_with(
            None,
            scripted(vec![
                ChatResponse::tool_call_response(vec![tool_call("get_employees", "not json")]),
                ChatResponse::text_response("Could not look that up."),
            ]),
        );

        let response = processor.process_query("Employees?", None).await;
        assert_eq!(response.query_type, QueryType::DynamicData);
    }

    #[tokio::test]
    async fn history_and_feedback_round_trip_through_processor() {
        let (processor, _log) = processor_with(
            None,
            scripted(vec![ChatResponse::text_response(
                "First answer.\n\n---\nSources: a.md",
            )]),
        );

        let response = processor.process_query("First?", Some("alice")).await;
        let log_id = response.log_id.unwrap();

        let history = processor.get_conversation_history("alice", 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sources, vec!["a.md"]);

        let stats = processor.get_conversation_stats("alice").unwrap();
        assert_eq!(stats.total_conversations, 1);

        assert!(processor.set_feedback(log_id, true, Some("thanks")).unwrap());
        assert!(!processor.set_feedback(log_id + 999, true, None).unwrap());

        let history = processor.get_conversation_history("alice", 10).unwrap();
        assert!(history[0].feedback.as_ref().unwrap().helpful);
    }
}
