//! Case Routes

use axum::{
    extract::{Path, State},
    Json,
};
use scoring::{CaseEvaluation, SlotEvaluation, SlotUpdate};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Recompute the slots of a case and apply the threshold rules
pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    Path(case_id): Path<String>,
) -> Result<Json<CaseEvaluation>, ApiError> {
    let evaluation = state.evaluator.evaluate_case(&case_id).await?;
    metrics::counter!("alerts_fired_total").increment(evaluation.alerts.len() as u64);
    Ok(Json(evaluation))
}

/// Record a new value and/or categories for one slot
pub async fn update_slot(
    State(state): State<Arc<AppState>>,
    Path((case_id, slot)): Path<(String, String)>,
    Json(update): Json<SlotUpdate>,
) -> Result<Json<SlotEvaluation>, ApiError> {
    let evaluation = state.evaluator.update_slot(&case_id, &slot, update).await?;
    Ok(Json(evaluation))
}
