//! The core agent loop — the heart of Wayfarer.
//!
//! The agent follows a **plan-and-execute** cycle per user turn:
//!
//! 1. **Receive** the user message and merge stored preferences into the
//!    system prompt
//! 2. **Plan** (optional, decided by a heuristic): one round with tool
//!    calling disabled, streamed back as plan text
//! 3. **Execute**: stream a round with tool calling enabled; if the model
//!    requests tools, run them concurrently, append the results, and loop
//! 4. **Finish**: on a clean stop, compact the transcript and hand it back
//!    as the seed for the next turn
//!
//! Consumers observe the run through a typed [`RunEvent`] stream — plan
//! deltas, answer deltas, and a final result.

pub mod aggregator;
pub mod dispatcher;
pub mod events;
pub mod heuristics;
pub mod history;
pub mod prompts;
pub mod runner;

pub use aggregator::{RoundAggregator, RoundOutcome};
pub use dispatcher::{ToolDispatcher, ToolOutcome};
pub use events::RunEvent;
pub use heuristics::should_use_plan;
pub use history::{ensure_system_message, trim_history};
pub use prompts::Prompts;
pub use runner::{AgentLoop, RunOutcome};
