//! Feedback inbox.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use bloom_core::chat::Feedback;
use bloom_core::types::{FeedbackId, FeedbackStatus};
use bloom_store::FeedbackRepository;
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<FeedbackStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: FeedbackStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{id}", put(set_status).delete(destroy))
}

/// Feedback entries, newest first, optionally by status.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Feedback>>> {
    Ok(Json(
        FeedbackRepository::new(state.store())
            .list(query.status)
            .await?,
    ))
}

#[instrument(skip(state))]
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<FeedbackId>,
    Json(input): Json<StatusUpdate>,
) -> Result<Json<Feedback>> {
    let feedback = FeedbackRepository::new(state.store())
        .set_status(&id, input.status, Utc::now())
        .await?;
    Ok(Json(feedback))
}

#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<FeedbackId>,
) -> Result<StatusCode> {
    FeedbackRepository::new(state.store()).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
