//! End-to-end generation: validate, build the prompt, gate on the daily quota,
//! call the completion client, then settle the quota.

use chrono::NaiveDate;
use tracing::info;

use crate::config::ModelSettings;
use crate::errors::AppError;
use crate::generation::builder::{PromptBuilder, PromptWarning};
use crate::generation::request::{GenerationKind, GenerationRequest, GenerationResult};
use crate::llm_client::{ApiKey, CompletionClient};
use crate::usage::UsagePolicy;

/// Whose API key pays for the call.
#[derive(Debug, Clone)]
pub enum Credential {
    /// The operator's configured key; subject to the per-session daily limit.
    Server,
    /// A key supplied by the caller; never counted against the daily limit.
    Caller(ApiKey),
}

/// Caller-facing input for one generation.
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub resume_text: String,
    pub job_description: String,
    pub kind: GenerationKind,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub result: GenerationResult,
    pub warnings: Vec<PromptWarning>,
    /// Server-billed calls left today; `None` when the caller paid with their own key.
    pub remaining_today: Option<u32>,
}

#[derive(Clone)]
pub struct GenerationPipeline {
    builder: PromptBuilder,
    completion: CompletionClient,
    usage: UsagePolicy,
    daily_limit: u32,
    model: ModelSettings,
}

impl GenerationPipeline {
    pub fn new(
        builder: PromptBuilder,
        completion: CompletionClient,
        usage: UsagePolicy,
        daily_limit: u32,
        model: ModelSettings,
    ) -> Self {
        Self {
            builder,
            completion,
            usage,
            daily_limit,
            model,
        }
    }

    pub async fn run(
        &self,
        input: GenerationInput,
        session_id: &str,
        credential: Credential,
        day: NaiveDate,
    ) -> Result<GenerationOutcome, AppError> {
        let request = GenerationRequest {
            resume_text: input.resume_text,
            job_description: input.job_description,
            kind: input.kind,
            model_params: self.model.params_for(input.kind),
        };
        request.validate()?;

        let prompt = self.builder.build(&request);

        let (client, reservation) = match credential {
            Credential::Server => {
                let reservation = self.usage.try_reserve(session_id, day, self.daily_limit)?;
                (self.completion.clone(), Some(reservation))
            }
            Credential::Caller(key) => (self.completion.with_api_key(key), None),
        };

        // A failed call drops the reservation, so it costs no quota.
        let text = client
            .generate(prompt.system_role, &prompt.user_prompt, &request.model_params)
            .await?;

        let remaining_today = reservation.map(|r| r.commit());
        info!(
            session_id,
            kind = %request.kind,
            "Generation complete; remaining today: {remaining_today:?}"
        );

        Ok(GenerationOutcome {
            result: GenerationResult {
                text,
                kind: request.kind,
            },
            warnings: prompt.warnings,
            remaining_today,
        })
    }
}
