//! Provider trait — the abstraction over LLM backends.
//!
//! A Provider knows how to send a conversation (plus the available tool
//! schemas and a tool-choice mode) to a model and stream back incremental
//! response fragments. Reassembling fragments into a complete answer or a
//! batch of tool calls is deliberately NOT the provider's job — that lives
//! in the agent's stream aggregator, so the wire adapter stays a thin
//! transport layer.

use crate::error::ProviderError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Tool-choice mode sent with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model must not call tools this round (plan rounds).
    None,
    /// The model decides whether to call tools.
    Auto,
}

impl ToolChoice {
    /// The wire-format string for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Auto => "auto",
        }
    }
}

/// Why the model stopped producing output for a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Clean end of a text answer.
    Stop,
    /// The model is requesting tool invocations.
    ToolCalls,
    /// Anything else the backend reports (length, content filter, ...).
    Other(String),
}

impl FinishReason {
    /// Map a wire-format finish reason string.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "stop" => Self::Stop,
            "tool_calls" => Self::ToolCalls,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Whether the model may call tools this round
    pub tool_choice: ToolChoice,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A partial tool call as it arrives on the wire.
///
/// Fields carry only what was present in that fragment: the `id` often
/// arrives only with the first fragment for an `index`, and `arguments`
/// arrives as string pieces to be concatenated in stream order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallFragment {
    /// Which call in the batch this fragment belongs to
    pub index: u32,

    /// Call ID, if present in this fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Tool name, if present in this fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// A piece of the arguments JSON string, if present in this fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// One increment of a streamed model response.
///
/// Produced by the provider, consumed immediately by the stream
/// aggregator, never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamFragment {
    /// Partial text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Partial tool call deltas
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallFragment>,

    /// Terminal reason, typically on the last meaningful fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl StreamFragment {
    /// A fragment carrying only a text delta.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// A fragment carrying only a finish reason.
    pub fn finish(reason: FinishReason) -> Self {
        Self {
            finish_reason: Some(reason),
            ..Self::default()
        }
    }
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The agent loop calls
/// `stream()` without knowing which backend is in use — pure polymorphism.
/// A transport fault mid-stream arrives as an `Err` item on the channel
/// and fails the whole round; there is no partial state to recover into.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a stream of response fragments.
    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<StreamFragment, ProviderError>>,
        ProviderError,
    >;
}
