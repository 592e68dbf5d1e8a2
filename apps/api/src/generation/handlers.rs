//! Axum route handlers for the Generation API.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::TextStats;
use crate::generation::builder::PromptWarning;
use crate::generation::pipeline::{Credential, GenerationInput};
use crate::generation::request::GenerationKind;
use crate::llm_client::ApiKey;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GenerateBody {
    pub resume_text: String,
    pub job_description: String,
    pub kind: GenerationKind,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Caller's own provider key; bypasses the daily limit when non-blank.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub session_id: String,
    pub kind: GenerationKind,
    pub text: String,
    pub warnings: Vec<PromptWarning>,
    pub remaining_today: Option<u32>,
    pub download_file_name: &'static str,
    pub stats: TextStats,
}

#[derive(Debug, Deserialize)]
pub struct DownloadBody {
    pub kind: GenerationKind,
    pub text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/generate
///
/// Runs one generation. Requests without a `session_id` get a fresh one, which the
/// caller should send back on later requests so the daily limit applies.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerateResponse>, AppError> {
    let session_id = body
        .session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let credential = match body.api_key.and_then(ApiKey::new) {
        Some(key) => Credential::Caller(key),
        None => Credential::Server,
    };

    let input = GenerationInput {
        resume_text: body.resume_text,
        job_description: body.job_description,
        kind: body.kind,
    };
    let day = chrono::Local::now().date_naive();

    let outcome = state
        .pipeline
        .run(input, &session_id, credential, day)
        .await?;

    let kind = outcome.result.kind;
    let stats = TextStats::of(&outcome.result.text);
    Ok(Json(GenerateResponse {
        session_id,
        kind,
        text: outcome.result.text,
        warnings: outcome.warnings,
        remaining_today: outcome.remaining_today,
        download_file_name: kind.download_file_name(),
        stats,
    }))
}

/// POST /api/v1/download
///
/// Returns the submitted text unchanged as a plain-text attachment named for its kind.
pub async fn handle_download(Json(body): Json<DownloadBody>) -> Result<Response, AppError> {
    if body.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let disposition = format!(
        "attachment; filename=\"{}\"",
        body.kind.download_file_name()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body.text,
    )
        .into_response())
}
