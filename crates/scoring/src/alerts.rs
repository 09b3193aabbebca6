//! Graph-backed Alert Store
//!
//! Alerts are `(:Alerta {codigo})` nodes created with `MERGE ... ON CREATE SET`
//! so repeated firings never reset creation time or resolution. Subjects are
//! linked with `-[:REQUIERE_ATENCION]->`.

use alerting::{Alert, AlertDecision, AlertError, AlertFilter, AlertStore, Severity, UpsertOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use graph_store::{params, GraphStore, QueryError, Record};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

const ALERT_COLUMNS: &str = "\
RETURN a.codigo AS codigo,
       a.severidad AS severidad,
       a.descripcion AS descripcion,
       coalesce(a.resuelta, false) AS resuelta,
       toString(a.created_at) AS created_at,
       toString(coalesce(a.last_fired_at, a.created_at)) AS last_fired_at,
       coalesce(a.fire_count, 1) AS fire_count,
       [(x)-[:REQUIERE_ATENCION]->(a) | x.id] AS sujetos";

fn upsert_query() -> String {
    format!(
        "\
MERGE (a:Alerta {{codigo: $code}})
ON CREATE SET a.severidad = $severity,
              a.descripcion = $description,
              a.resuelta = false,
              a.created_at = datetime($now),
              a.fire_count = 0
SET a.last_fired_at = datetime($now),
    a.fire_count = coalesce(a.fire_count, 0) + 1
WITH a
OPTIONAL MATCH (p) WHERE (p:Paciente OR p:FrameInstance) AND p.id = $subject
FOREACH (_ IN CASE WHEN p IS NULL THEN [] ELSE [1] END | MERGE (p)-[:REQUIERE_ATENCION]->(a))
WITH DISTINCT a
{},
       coalesce(a.created_at = datetime($now), false) AS creada",
        ALERT_COLUMNS
    )
}

fn resolve_query() -> String {
    format!(
        "MATCH (a:Alerta {{codigo: $code}})\nSET a.resuelta = true\n{}",
        ALERT_COLUMNS
    )
}

fn get_query() -> String {
    format!("MATCH (a:Alerta {{codigo: $code}})\n{}", ALERT_COLUMNS)
}

fn list_query() -> String {
    format!(
        "\
MATCH (a:Alerta)
WHERE ($severity IS NULL OR a.severidad = $severity)
  AND ($resolved IS NULL OR coalesce(a.resuelta, false) = $resolved)
{}
ORDER BY created_at DESC",
        ALERT_COLUMNS
    )
}

fn storage_error(e: QueryError) -> AlertError {
    AlertError::Storage(e.to_string())
}

fn parse_time(record: &Record, column: &str) -> Result<DateTime<Utc>, AlertError> {
    let raw = record
        .get_str(column)
        .ok_or_else(|| AlertError::Storage(format!("Alert row missing {}", column)))?;

    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AlertError::Storage(format!("Invalid {} '{}': {}", column, raw, e)))
}

fn alert_from_record(record: &Record) -> Result<Alert, AlertError> {
    let code = record
        .get_string("codigo")
        .ok_or_else(|| AlertError::Storage("Alert row missing codigo".to_string()))?;

    let severity: Severity = record.get_str("severidad").unwrap_or("medium").parse()?;

    let subjects: BTreeSet<String> = match record.get("sujetos") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => BTreeSet::new(),
    };

    Ok(Alert {
        severity,
        description: record.get_string("descripcion").unwrap_or_default(),
        resolved: record
            .get("resuelta")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        created_at: parse_time(record, "created_at")?,
        last_fired_at: parse_time(record, "last_fired_at")?,
        fire_count: record.get("fire_count").and_then(Value::as_u64).unwrap_or(1),
        subjects,
        code,
    })
}

/// Alert store over a graph store
pub struct GraphAlertStore {
    store: Arc<dyn GraphStore>,
}

impl GraphAlertStore {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Upsert with an explicit clock
    pub async fn upsert_at(
        &self,
        decision: &AlertDecision,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, AlertError> {
        let parameters = params(json!({
            "code": decision.code,
            "severity": decision.severity.as_str(),
            "description": decision.description,
            "subject": decision.subject,
            "now": now.to_rfc3339(),
        }));

        let rows = self
            .store
            .execute(&upsert_query(), parameters)
            .await
            .map_err(storage_error)?;

        let record = rows
            .first()
            .ok_or_else(|| AlertError::Storage(format!("Upsert of {} returned no row", decision.code)))?;
        let alert = alert_from_record(record)?;
        let created = record.get("creada").and_then(Value::as_bool).unwrap_or(false);

        if created {
            info!("Alert created: {} ({})", alert.code, alert.severity);
        } else {
            debug!("Alert {} fired again (count: {})", alert.code, alert.fire_count);
        }

        Ok(UpsertOutcome { alert, created })
    }
}

#[async_trait]
impl AlertStore for GraphAlertStore {
    async fn upsert(&self, decision: &AlertDecision) -> Result<UpsertOutcome, AlertError> {
        self.upsert_at(decision, Utc::now()).await
    }

    async fn resolve(&self, code: &str) -> Result<Alert, AlertError> {
        let rows = self
            .store
            .execute(&resolve_query(), params(json!({ "code": code })))
            .await
            .map_err(storage_error)?;

        let record = rows.first().ok_or_else(|| AlertError::NotFound(code.to_string()))?;
        info!("Alert resolved: {}", code);
        alert_from_record(record)
    }

    async fn get(&self, code: &str) -> Result<Option<Alert>, AlertError> {
        let rows = self
            .store
            .execute(&get_query(), params(json!({ "code": code })))
            .await
            .map_err(storage_error)?;

        rows.first().map(alert_from_record).transpose()
    }

    async fn list(&self, filter: &AlertFilter) -> Result<Vec<Alert>, AlertError> {
        let parameters = params(json!({
            "severity": filter.severity.map(|s| s.as_str()),
            "resolved": filter.resolved,
        }));

        let rows = self
            .store
            .execute(&list_query(), parameters)
            .await
            .map_err(storage_error)?;

        let mut alerts = Vec::with_capacity(rows.len());
        for record in &rows {
            match alert_from_record(record) {
                Ok(alert) => alerts.push(alert),
                Err(e) => warn!("Skipping unreadable alert: {}", e),
            }
        }
        Ok(alerts)
    }
}
