// Generation Client: interview questions and role suggestions.
// All LLM calls go through llm_client, no direct Anthropic SDK calls here.

pub mod client;
pub mod prompts;
pub mod schema;

pub use client::{GenerationClient, GenerationError, ScreeningGenerator};
