//! Symptom Rule Route

use axum::{extract::State, Json};
use graph_store::fetch_symptom_observations;
use scoring::SymptomAlert;
use serde::Serialize;
use std::sync::Arc;

use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct SymptomRuleResponse {
    pub alerts: Vec<SymptomAlert>,
    pub count: usize,
}

/// Apply the exact-match rules to every patient symptom in the graph
pub async fn run_symptom_rules(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SymptomRuleResponse>, ApiError> {
    let observations = fetch_symptom_observations(state.store.as_ref()).await?;
    let alerts = state.evaluator.run_symptom_rules(&observations).await?;
    metrics::counter!("alerts_fired_total").increment(alerts.len() as u64);

    Ok(Json(SymptomRuleResponse {
        count: alerts.len(),
        alerts,
    }))
}
