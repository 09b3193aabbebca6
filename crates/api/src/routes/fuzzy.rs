//! Fuzzy Scoring Route

use axum::{extract::State, Json};
use scoring::{FuzzyScoreRequest, FuzzyScoreResponse};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Score one indicator value against a Gaussian category
pub async fn score(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FuzzyScoreRequest>,
) -> Result<Json<FuzzyScoreResponse>, ApiError> {
    let response = state.scorer.score(&request).await?;
    metrics::counter!("fuzzy_scores_total").increment(1);
    Ok(Json(response))
}
