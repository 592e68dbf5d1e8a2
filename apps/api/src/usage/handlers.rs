//! Axum route handlers for the Usage API.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub session_id: String,
    pub day: NaiveDate,
    pub used: u32,
    pub remaining: u32,
    pub limit: u32,
    /// Whether one more server-billed generation would be admitted right now.
    pub allowed: bool,
}

/// GET /api/v1/usage?session_id=
///
/// Reports today's server-billed usage for a session. Never changes a counter.
pub async fn handle_get_usage(
    State(state): State<AppState>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<UsageResponse>, AppError> {
    let session_id = query.session_id.trim();
    if session_id.is_empty() {
        return Err(AppError::Validation("session_id cannot be empty".to_string()));
    }

    let day = chrono::Local::now().date_naive();
    let limit = state.config.daily_request_limit;
    let snapshot = state.usage.snapshot(session_id, day, limit);
    let allowed = state.usage.authorize(session_id, day, limit).is_ok();

    Ok(Json(UsageResponse {
        session_id: session_id.to_string(),
        day,
        used: snapshot.used,
        remaining: snapshot.remaining,
        limit: snapshot.limit,
        allowed,
    }))
}
