//! Run-level events.
//!
//! `RunEvent` is the sole output contract between the agent loop and any
//! presentation layer (terminal REPL, chat UI, API endpoint). Consumers
//! must handle partial sequences — zero plan events, zero or many delta
//! events — without assuming fixed counts.

use serde::{Deserialize, Serialize};
use wayfarer_core::message::Message;

/// Events emitted by the agent loop during one run.
///
/// - `plan_delta`   — partial plan text from the planning round
/// - `plan`         — the full plan (absent if the model produced none)
/// - `answer_delta` — partial answer text from an execute round
/// - `result`       — the final answer plus the compacted history seed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// Partial plan text.
    PlanDelta { content: String },

    /// The complete plan, trimmed; `None` if it was empty.
    Plan { content: Option<String> },

    /// Partial answer text.
    AnswerDelta { content: String },

    /// The run finished — final answer, capability usage, and the
    /// compacted history to seed the next run.
    Result {
        content: String,
        used_weather: bool,
        used_places: bool,
        history: Vec<Message>,
    },
}

impl RunEvent {
    /// Wire event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PlanDelta { .. } => "plan_delta",
            Self::Plan { .. } => "plan",
            Self::AnswerDelta { .. } => "answer_delta",
            Self::Result { .. } => "result",
        }
    }
}
