//! The plan-and-execute loop implementation.
//!
//! One [`AgentLoop::run`] call processes a single user message on top of
//! prior history: an optional planning round (tool calling disabled),
//! then execute rounds that alternate between streaming the model and
//! dispatching any requested tools, until the model produces a final
//! answer. The caller observes progress through [`RunEvent`]s and receives
//! the compacted history back as the seed for the next call.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::aggregator::{RoundAggregator, RoundOutcome};
use crate::dispatcher::ToolDispatcher;
use crate::events::RunEvent;
use crate::heuristics::should_use_plan;
use crate::history::{ensure_system_message, trim_history};
use crate::prompts::Prompts;
use wayfarer_core::error::Error;
use wayfarer_core::message::{Message, Role};
use wayfarer_core::provider::{FinishReason, Provider, ProviderRequest, ToolChoice};
use wayfarer_core::tool::{ToolKind, ToolRegistry};

/// The agent loop that orchestrates streamed LLM rounds and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Tool registry (schemas + lookup)
    registry: Arc<ToolRegistry>,

    /// Concurrent tool execution
    dispatcher: ToolDispatcher,

    /// Prompt and sentinel text
    prompts: Prompts,

    /// Maximum execute rounds per run
    max_rounds: u32,
}

/// What one `run` call produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// The final answer text.
    pub response: String,

    /// Whether any weather tool was requested during the run.
    pub used_weather: bool,

    /// Whether the places tool was requested during the run.
    pub used_places: bool,

    /// The compacted transcript, ready to seed the next run.
    pub history: Vec<Message>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            dispatcher: ToolDispatcher::new(registry.clone()),
            registry,
            prompts: Prompts::default(),
            max_rounds: 16,
        }
    }

    /// Set the default max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Substitute the prompt set (tests, alternate personas).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the maximum number of execute rounds per run.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max.max(1);
        self
    }

    /// Set the concurrency cap for tool dispatch.
    pub fn with_tool_concurrency(mut self, max: usize) -> Self {
        self.dispatcher = self.dispatcher.with_max_concurrent(max);
        self
    }

    fn request(&self, messages: &[Message], tool_choice: ToolChoice) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.registry.definitions(),
            tool_choice,
        }
    }

    /// Stream one round, forwarding text deltas through `on_delta`.
    ///
    /// `on_delta` receives each non-empty content piece together with
    /// whether any tool-call fragment has been seen so far this round
    /// (tool-call fragments in the same chunk count as seen).
    async fn stream_round<F>(
        &self,
        messages: &[Message],
        tool_choice: ToolChoice,
        mut on_delta: F,
    ) -> Result<RoundOutcome, Error>
    where
        F: FnMut(&str, bool),
    {
        let mut rx = self
            .provider
            .stream(self.request(messages, tool_choice))
            .await?;

        let mut aggregator = RoundAggregator::new();
        while let Some(item) = rx.recv().await {
            let fragment = item?;
            aggregator.ingest(&fragment);
            if let Some(content) = &fragment.content {
                if !content.is_empty() {
                    on_delta(content, aggregator.has_tool_calls());
                }
            }
        }

        Ok(aggregator.finish())
    }

    /// Process one user message and produce the next history seed.
    ///
    /// The incoming `history` is consumed; the compacted successor is
    /// returned in the outcome (and in the final `Result` event), so two
    /// concurrent runs can never alias the same conversation state.
    pub async fn run(
        &self,
        history: Vec<Message>,
        user_message: &str,
        preferences: Option<&str>,
        events: &mpsc::UnboundedSender<RunEvent>,
    ) -> Result<RunOutcome, Error> {
        let mut messages = ensure_system_message(history, &self.prompts);

        // Merge preferences into the system message, never as a new message
        if let Some(prefs) = preferences.map(str::trim).filter(|p| !p.is_empty()) {
            if let Some(first) = messages.first_mut() {
                if first.role == Role::System {
                    first.content = format!(
                        "{}{}{}",
                        first.content, self.prompts.preferences_header, prefs
                    );
                }
            }
        }

        messages.push(Message::user(user_message));

        info!(
            messages = messages.len(),
            model = %self.model,
            "Processing user message"
        );

        // ── Planning round ──
        if should_use_plan(user_message) {
            messages.push(Message::user(&self.prompts.plan_request));

            let outcome = self
                .stream_round(&messages, ToolChoice::None, |delta, _| {
                    let _ = events.send(RunEvent::PlanDelta {
                        content: delta.to_string(),
                    });
                })
                .await?;

            let plan_text = outcome.content;
            debug!(chars = plan_text.len(), "Plan round complete");

            messages.push(Message::assistant(&plan_text));
            messages.push(Message::user(&self.prompts.execute_request));

            let trimmed = plan_text.trim();
            let _ = events.send(RunEvent::Plan {
                content: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            });
        }

        // ── Execute rounds ──
        let mut used_weather = false;
        let mut used_places = false;
        let mut round = 0u32;

        loop {
            round += 1;

            let outcome = self
                .stream_round(&messages, ToolChoice::Auto, |delta, saw_tool_calls| {
                    // Text alongside tool calls is commentary, not the
                    // final answer — never stream it to the caller.
                    if !saw_tool_calls {
                        let _ = events.send(RunEvent::AnswerDelta {
                            content: delta.to_string(),
                        });
                    }
                })
                .await?;

            let wants_tools = outcome.finish_reason == Some(FinishReason::ToolCalls)
                && !outcome.calls.is_empty();

            if wants_tools && round < self.max_rounds {
                let calls = outcome.calls;
                debug!(round, tool_count = calls.len(), "Executing tool calls");
                messages.push(Message::assistant_with_tool_calls(
                    &outcome.content,
                    calls.clone(),
                ));

                let results = self.dispatcher.dispatch(&calls).await;

                // Tool messages are appended in original request order,
                // whatever order execution completed in.
                for call in &calls {
                    match results.get(&call.id) {
                        Some(result) => {
                            match result.kind {
                                ToolKind::Weather => used_weather = true,
                                ToolKind::Places => used_places = true,
                                ToolKind::Other => {}
                            }
                            messages.push(Message::tool_result(&call.id, &result.output));
                        }
                        None => {
                            // dispatch() guarantees every id; this arm is
                            // unreachable but keeps the transcript aligned.
                            messages.push(Message::tool_result(
                                &call.id,
                                "Error: tool produced no result",
                            ));
                        }
                    }
                }
                continue;
            }

            if wants_tools {
                warn!(round, "Max rounds reached, forcing text response");
            } else if outcome.finish_reason != Some(FinishReason::Stop) {
                // Model produced neither a clean stop nor tool calls
                // (length cutoff, zero parsed requests, absent reason);
                // treat it as a stop with whatever text accumulated.
                debug!(reason = ?outcome.finish_reason, "Treating round as stop");
            }

            messages.push(Message::assistant(&outcome.content));
            let history = trim_history(&messages, &self.prompts);

            let _ = events.send(RunEvent::Result {
                content: outcome.content.clone(),
                used_weather,
                used_places,
                history: history.clone(),
            });

            return Ok(RunOutcome {
                response: outcome.content,
                used_weather,
                used_places,
                history,
            });
        }
    }
}
