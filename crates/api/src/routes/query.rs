//! Natural-Language Query Routes

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use graph_store::Record;
use nl_query::QueryProfile;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Query parameters for question endpoints
#[derive(Debug, Deserialize)]
pub struct QuestionParams {
    #[serde(default)]
    pub question: String,
    /// Return the generated query and raw rows too
    #[serde(default)]
    pub explain: bool,
}

/// Answer-only response
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: Option<String>,
    /// Raw rows, only when answer synthesis is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Record>>,
}

async fn ask(state: &AppState, profile: &str, params: QuestionParams) -> Result<Response, ApiError> {
    let pipeline = state
        .pipeline(profile)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown query profile: {}", profile)))?;

    metrics::counter!("queries_total", "profile" => profile.to_string()).increment(1);

    let outcome = match pipeline.ask(&params.question).await {
        Ok(outcome) => outcome,
        Err(e) => {
            metrics::counter!("query_failures_total", "profile" => profile.to_string()).increment(1);
            return Err(e.into());
        }
    };

    if params.explain {
        return Ok(Json(outcome).into_response());
    }

    let response = match outcome.answer {
        Some(answer) => AnswerResponse {
            answer: Some(answer),
            rows: None,
        },
        None => AnswerResponse {
            answer: None,
            rows: Some(outcome.rows),
        },
    };
    Ok(Json(response).into_response())
}

/// Clinical profile (`/query`, `/query_clinico`)
pub async fn ask_clinical(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuestionParams>,
) -> Result<Response, ApiError> {
    ask(&state, QueryProfile::CLINICAL, params).await
}

/// Monitoring/frequency profile (`/query_monitoreo`)
pub async fn ask_monitoring(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuestionParams>,
) -> Result<Response, ApiError> {
    ask(&state, QueryProfile::MONITORING, params).await
}

/// Any configured profile
pub async fn ask_profile(
    State(state): State<Arc<AppState>>,
    Path(profile): Path<String>,
    Query(params): Query<QuestionParams>,
) -> Result<Response, ApiError> {
    ask(&state, &profile, params).await
}
