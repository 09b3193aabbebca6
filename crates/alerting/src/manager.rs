//! Alert Manager Implementation

use crate::error::AlertError;
use crate::rules::{AlertDecision, Severity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use tracing::{debug, info};

/// Lifecycle state of an existing alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Resolved,
}

/// Persisted alert record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert code
    pub code: String,
    pub severity: Severity,
    pub description: String,
    /// Set by an operator, never by rule firing
    pub resolved: bool,
    /// First creation time, never overwritten
    pub created_at: DateTime<Utc>,
    /// Most recent firing
    pub last_fired_at: DateTime<Utc>,
    /// Number of firings, including the first one
    pub fire_count: u64,
    /// Patients/cases linked to this alert
    pub subjects: BTreeSet<String>,
}

impl Alert {
    /// Create a new active alert from a decision
    pub fn from_decision(decision: &AlertDecision, now: DateTime<Utc>) -> Self {
        Self {
            code: decision.code.clone(),
            severity: decision.severity,
            description: decision.description.clone(),
            resolved: false,
            created_at: now,
            last_fired_at: now,
            fire_count: 1,
            subjects: decision.subject.iter().cloned().collect(),
        }
    }

    pub fn status(&self) -> AlertStatus {
        if self.resolved {
            AlertStatus::Resolved
        } else {
            AlertStatus::Active
        }
    }

    /// Register a repeat firing; immutable fields stay untouched
    pub fn record_fire(&mut self, subject: Option<&str>, now: DateTime<Utc>) {
        self.last_fired_at = now;
        self.fire_count += 1;
        if let Some(subject) = subject {
            self.subjects.insert(subject.to_string());
        }
    }
}

/// Result of an upsert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertOutcome {
    pub alert: Alert,
    /// `true` when this firing created the alert
    pub created: bool,
}

/// Alert listing filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertFilter {
    pub severity: Option<Severity>,
    pub resolved: Option<bool>,
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        self.severity.map_or(true, |s| alert.severity == s)
            && self.resolved.map_or(true, |r| alert.resolved == r)
    }
}

/// Storage for alerts keyed by code
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Create the alert on first firing, otherwise only register the firing
    async fn upsert(&self, decision: &AlertDecision) -> Result<UpsertOutcome, AlertError>;

    /// Mark an alert as resolved (operator action)
    async fn resolve(&self, code: &str) -> Result<Alert, AlertError>;

    async fn get(&self, code: &str) -> Result<Option<Alert>, AlertError>;

    async fn list(&self, filter: &AlertFilter) -> Result<Vec<Alert>, AlertError>;
}

/// In-memory alert store
pub struct AlertManager {
    /// Alerts by code
    alerts: Mutex<HashMap<String, Alert>>,
}

impl AlertManager {
    /// Create an empty alert manager
    pub fn new() -> Self {
        info!("Creating in-memory alert manager");
        Self {
            alerts: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Alert>>, AlertError> {
        self.alerts
            .lock()
            .map_err(|e| AlertError::Storage(format!("Lock error: {}", e)))
    }

    /// Upsert with an explicit clock
    pub fn upsert_at(
        &self,
        decision: &AlertDecision,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, AlertError> {
        let mut alerts = self.lock()?;

        if let Some(existing) = alerts.get_mut(&decision.code) {
            existing.record_fire(decision.subject.as_deref(), now);
            debug!("Alert {} fired again (count: {})", decision.code, existing.fire_count);
            return Ok(UpsertOutcome {
                alert: existing.clone(),
                created: false,
            });
        }

        let alert = Alert::from_decision(decision, now);
        alerts.insert(alert.code.clone(), alert.clone());
        info!("Alert created: {} ({})", alert.code, alert.severity);

        Ok(UpsertOutcome {
            alert,
            created: true,
        })
    }

    /// Number of stored alerts
    pub fn len(&self) -> usize {
        self.alerts.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all alerts
    pub fn clear(&self) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.clear();
        }
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertStore for AlertManager {
    async fn upsert(&self, decision: &AlertDecision) -> Result<UpsertOutcome, AlertError> {
        self.upsert_at(decision, Utc::now())
    }

    async fn resolve(&self, code: &str) -> Result<Alert, AlertError> {
        let mut alerts = self.lock()?;
        let alert = alerts
            .get_mut(code)
            .ok_or_else(|| AlertError::NotFound(code.to_string()))?;

        alert.resolved = true;
        info!("Alert resolved: {}", code);
        Ok(alert.clone())
    }

    async fn get(&self, code: &str) -> Result<Option<Alert>, AlertError> {
        Ok(self.lock()?.get(code).cloned())
    }

    async fn list(&self, filter: &AlertFilter) -> Result<Vec<Alert>, AlertError> {
        let alerts = self.lock()?;
        let mut matching: Vec<Alert> = alerts.values().filter(|a| filter.matches(a)).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.code.cmp(&b.code)));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::HIGH_RISK_SPRAIN;
    use chrono::Duration;

    fn decision(subject: &str) -> AlertDecision {
        AlertDecision {
            code: HIGH_RISK_SPRAIN.to_string(),
            severity: Severity::High,
            description: "Dolor severo y baja mejoría".to_string(),
            subject: Some(subject.to_string()),
        }
    }

    #[test]
    fn test_first_firing_creates_active_alert() {
        let manager = AlertManager::new();
        let now = Utc::now();

        let outcome = manager.upsert_at(&decision("Caso-001"), now).unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.alert.status(), AlertStatus::Active);
        assert_eq!(outcome.alert.created_at, now);
        assert_eq!(outcome.alert.fire_count, 1);
    }

    #[test]
    fn test_repeat_firing_is_idempotent() {
        let manager = AlertManager::new();
        let first = Utc::now();
        let later = first + Duration::minutes(5);

        manager.upsert_at(&decision("Caso-001"), first).unwrap();
        let outcome = manager.upsert_at(&decision("Caso-001"), later).unwrap();

        assert!(!outcome.created);
        assert_eq!(manager.len(), 1);
        assert_eq!(outcome.alert.created_at, first);
        assert!(!outcome.alert.resolved);
        assert_eq!(outcome.alert.last_fired_at, later);
        assert_eq!(outcome.alert.fire_count, 2);
    }

    #[test]
    fn test_repeat_firing_links_new_subject() {
        let manager = AlertManager::new();
        manager.upsert_at(&decision("Caso-001"), Utc::now()).unwrap();
        let outcome = manager.upsert_at(&decision("Caso-002"), Utc::now()).unwrap();
        assert_eq!(outcome.alert.subjects.len(), 2);
    }

    #[tokio::test]
    async fn test_resolved_alert_stays_resolved() {
        let manager = AlertManager::new();
        manager.upsert(&decision("Caso-001")).await.unwrap();

        let resolved = manager.resolve(HIGH_RISK_SPRAIN).await.unwrap();
        assert_eq!(resolved.status(), AlertStatus::Resolved);

        let outcome = manager.upsert(&decision("Caso-001")).await.unwrap();
        assert!(outcome.alert.resolved);
        assert_eq!(outcome.alert.created_at, resolved.created_at);
    }

    #[tokio::test]
    async fn test_resolve_unknown_alert() {
        let manager = AlertManager::new();
        let err = manager.resolve("NOPE").await.unwrap_err();
        assert!(matches!(err, AlertError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let manager = AlertManager::new();
        manager.upsert(&decision("Caso-001")).await.unwrap();
        manager
            .upsert(&AlertDecision {
                code: "OTHER".to_string(),
                severity: Severity::Low,
                description: "otra".to_string(),
                subject: None,
            })
            .await
            .unwrap();
        manager.resolve("OTHER").await.unwrap();

        let active = manager
            .list(&AlertFilter {
                resolved: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, HIGH_RISK_SPRAIN);

        let low = manager
            .list(&AlertFilter {
                severity: Some(Severity::Low),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(low.len(), 1);

        assert_eq!(manager.list(&AlertFilter::default()).await.unwrap().len(), 2);
    }
}
