//! Axum route handlers for the Extraction API.

use axum::{extract::Multipart, Json};
use serde::Serialize;
use tracing::warn;

use crate::errors::AppError;
use crate::extraction::{extract, DocumentKind, RawDocument, TextStats};

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub file_name: String,
    pub source_kind: DocumentKind,
    pub char_count: usize,
    pub content: String,
    pub stats: TextStats,
}

/// POST /api/v1/extract
///
/// Accepts a multipart upload with a `file` field holding a PDF or DOCX and returns
/// its normalized text. An empty result is still a success.
pub async fn handle_extract(mut multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;

        upload = Some(RawDocument::from_upload(
            bytes,
            content_type.as_deref(),
            file_name,
        ));
        break;
    }

    let document = upload.ok_or_else(|| {
        AppError::Validation(format!("Multipart field '{UPLOAD_FIELD}' is required"))
    })?;

    let file_name = document.file_name.clone();

    // PDF and DOCX parsing is CPU-bound; keep it off the async executor.
    let extracted = tokio::task::spawn_blocking(move || extract(document))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in extraction: {e}")))??;

    if extracted.is_empty() {
        warn!(file_name = %file_name, "No text could be extracted; the document may be scanned images");
    }

    let stats = extracted.stats();
    Ok(Json(ExtractResponse {
        file_name,
        source_kind: extracted.source_kind,
        char_count: extracted.char_count,
        content: extracted.content,
        stats,
    }))
}
