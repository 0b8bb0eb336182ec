//! Feedback form.

use axum::{Json, extract::State, http::StatusCode};
use bloom_core::chat::{Feedback, NewFeedback};
use bloom_store::FeedbackRepository;
use chrono::Utc;
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

/// Record a feedback submission.
#[instrument(skip(state, input))]
pub async fn submit(
    State(state): State<AppState>,
    Json(input): Json<NewFeedback>,
) -> Result<(StatusCode, Json<Feedback>)> {
    let feedback = FeedbackRepository::new(state.store())
        .create(input, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}
