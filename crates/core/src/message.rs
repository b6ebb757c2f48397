//! Message domain types.
//!
//! These are the core value objects that flow through the entire system:
//! the user sends a message → the agent loop streams it to the model →
//! tool calls and results are appended → the compacted history seeds the
//! next turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (assistant behavior, tool policy)
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// Tool execution result
    Tool,
}

/// A single message in a conversation.
///
/// Role-specific invariants are enforced at construction: only the
/// [`Message::tool_result`] constructor sets `tool_call_id`, and only
/// [`Message::assistant_with_tool_calls`] sets `tool_calls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content (may be empty for tool-calling assistant turns)
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message carrying tool-call requests.
    pub fn assistant_with_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        let mut msg = Self::new(Role::Assistant, content);
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a tool result message linked to the originating request.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }
}

/// One tool invocation requested by the model.
///
/// `index` is the position hint from the streaming wire format; argument
/// fragments are accumulated by `index` because the `id` may arrive after
/// the first fragment for that call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Unique ID for this tool call (opaque, unique within a turn)
    pub id: String,

    /// Stream position of this call within the batch
    pub index: u32,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a raw JSON string
    pub arguments: String,
}
