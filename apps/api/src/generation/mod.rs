// Generation: request validation, prompt building, and the quota-gated pipeline.
// All completion calls go through llm_client; nothing here talks HTTP to the provider.

pub mod builder;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod request;
