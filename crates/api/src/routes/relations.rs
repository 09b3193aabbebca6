//! Fuzzy Relation Routes

use axum::{
    extract::{Query, State},
    Json,
};
use graph_store::{fetch_fuzzy_relations, FuzzyRelation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct RelationQuery {
    /// Exclusive lower bound on `mu`; server default when absent
    pub min_membership: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RelationResponse {
    pub data: Vec<FuzzyRelation>,
    pub count: usize,
    pub min_membership: f64,
}

/// Relationships carrying a membership degree above the threshold
pub async fn list_relations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RelationQuery>,
) -> Result<Json<RelationResponse>, ApiError> {
    let min_membership = params.min_membership.unwrap_or(state.relation_threshold);
    if !(0.0..=1.0).contains(&min_membership) {
        return Err(ApiError::BadRequest(format!(
            "min_membership must be within [0, 1], got {}",
            min_membership
        )));
    }

    let data = fetch_fuzzy_relations(state.store.as_ref(), min_membership).await?;

    Ok(Json(RelationResponse {
        count: data.len(),
        data,
        min_membership,
    }))
}
