use crate::config::Config;
use crate::generation::builder::PromptBuilder;
use crate::generation::pipeline::GenerationPipeline;
use crate::llm_client::CompletionClient;
use crate::usage::UsagePolicy;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: GenerationPipeline,
    /// Same store the pipeline charges; read by the usage endpoint and the prune task.
    pub usage: UsagePolicy,
}

impl AppState {
    pub fn new(config: Config, completion: CompletionClient) -> Self {
        let usage = UsagePolicy::new();
        let pipeline = GenerationPipeline::new(
            PromptBuilder::new(config.prompt_soft_limit_chars),
            completion,
            usage.clone(),
            config.daily_request_limit,
            config.model.clone(),
        );
        Self {
            config,
            pipeline,
            usage,
        }
    }
}
