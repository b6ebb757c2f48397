//! # Wayfarer Core
//!
//! Domain types, traits, and error definitions for the Wayfarer travel
//! assistant runtime. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{Message, Role, ToolCallRequest};
pub use provider::{
    FinishReason, Provider, ProviderRequest, StreamFragment, ToolCallFragment, ToolChoice,
    ToolDefinition,
};
pub use tool::{Tool, ToolCall, ToolKind, ToolRegistry, ToolResult};
