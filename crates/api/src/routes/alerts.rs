//! Alert Routes

use alerting::{Alert, AlertFilter, Severity};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Query parameters for alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// Filter by severity
    pub severity: Option<String>,
    /// Filter by resolved status
    pub resolved: Option<bool>,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<Alert>,
    pub count: usize,
    pub active_count: usize,
}

/// Get alerts, newest first
pub async fn get_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AlertQuery>,
) -> Result<Json<AlertResponse>, ApiError> {
    let severity = params
        .severity
        .as_deref()
        .map(str::parse::<Severity>)
        .transpose()?;

    let filter = AlertFilter {
        severity,
        resolved: params.resolved,
    };

    let mut alerts = state.alerts.list(&filter).await?;
    alerts.truncate(params.limit);

    let active = alerts.iter().filter(|a| !a.resolved).count();

    Ok(Json(AlertResponse {
        count: alerts.len(),
        active_count: active,
        data: alerts,
    }))
}

/// Mark an alert as resolved
pub async fn resolve_alert(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Alert>, ApiError> {
    Ok(Json(state.alerts.resolve(&code).await?))
}
