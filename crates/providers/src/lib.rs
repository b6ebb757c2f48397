//! LLM provider implementations for Wayfarer.
//!
//! Everything here speaks the OpenAI `/v1/chat/completions` wire format,
//! which covers OpenAI itself plus OpenRouter, Ollama, vLLM, and most
//! other hosted or local backends.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
