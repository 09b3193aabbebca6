//! Single-indicator Fuzzy Scoring

use crate::ScoringError;
use fuzzy_frames::{membership, round_to, MEMBERSHIP_PRECISION};
use graph_store::{fetch_indicator_value, GraphStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Score an indicator value against one Gaussian category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyScoreRequest {
    /// Indicator/category name (e.g. "escala_dolor")
    pub category_name: String,
    /// Crisp value; looked up in the graph when absent
    #[serde(default)]
    pub value: Option<f64>,
    pub mean: f64,
    pub sigma: f64,
    /// Patient/case identifier for the lookup
    #[serde(default)]
    pub case_id: Option<String>,
    /// Symptom name for the lookup
    #[serde(default)]
    pub symptom_name: Option<String>,
}

/// Where the scored value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Request,
    Graph,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyScoreResponse {
    pub category_name: String,
    pub resolved_value: f64,
    pub mean: f64,
    pub sigma: f64,
    /// Rounded to four decimal places
    pub membership_degree: f64,
    pub value_source: ValueSource,
}

/// Resolves crisp values and scores them
pub struct FuzzyScorer {
    store: Arc<dyn GraphStore>,
}

impl FuzzyScorer {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    async fn resolve_value(&self, request: &FuzzyScoreRequest) -> Result<(f64, ValueSource), ScoringError> {
        if let Some(value) = request.value {
            return Ok((value, ValueSource::Request));
        }

        let (case_id, symptom) = match (&request.case_id, &request.symptom_name) {
            (Some(case_id), Some(symptom)) => (case_id, symptom),
            _ => return Err(ScoringError::InputUnresolved),
        };

        debug!("Looking up {} for {}/{}", request.category_name, case_id, symptom);
        fetch_indicator_value(self.store.as_ref(), case_id, symptom, &request.category_name)
            .await?
            .map(|v| (v, ValueSource::Graph))
            .ok_or(ScoringError::InputUnresolved)
    }

    /// Membership degree of the resolved value.
    ///
    /// Lookup failures from the graph store are returned unchanged.
    pub async fn score(&self, request: &FuzzyScoreRequest) -> Result<FuzzyScoreResponse, ScoringError> {
        let (value, value_source) = self.resolve_value(request).await?;
        let degree = round_to(membership(value, request.mean, request.sigma), MEMBERSHIP_PRECISION);

        info!(
            "Fuzzy score {}: x={} mean={} sigma={} -> {}",
            request.category_name, value, request.mean, request.sigma, degree
        );

        Ok(FuzzyScoreResponse {
            category_name: request.category_name.clone(),
            resolved_value: value,
            mean: request.mean,
            sigma: request.sigma,
            membership_degree: degree,
            value_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_store::MockGraphStore;
    use serde_json::json;

    fn request(value: Option<f64>) -> FuzzyScoreRequest {
        FuzzyScoreRequest {
            category_name: "escala_dolor".to_string(),
            value,
            mean: 8.0,
            sigma: 1.2,
            case_id: None,
            symptom_name: None,
        }
    }

    #[tokio::test]
    async fn test_score_supplied_value() {
        let store = Arc::new(MockGraphStore::new());
        let scorer = FuzzyScorer::new(store.clone());

        let response = scorer.score(&request(Some(7.5))).await.unwrap();
        assert_eq!(response.membership_degree, round_to(membership(7.5, 8.0, 1.2), 4));
        assert_eq!(response.value_source, ValueSource::Request);
        assert!(store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_score_at_mean() {
        let scorer = FuzzyScorer::new(Arc::new(MockGraphStore::new()));
        let response = scorer
            .score(&FuzzyScoreRequest {
                mean: 5.0,
                sigma: 1.5,
                ..request(Some(5.0))
            })
            .await
            .unwrap();
        assert_eq!(response.membership_degree, 1.0);
    }

    #[tokio::test]
    async fn test_unresolved_without_value_or_keys() {
        let scorer = FuzzyScorer::new(Arc::new(MockGraphStore::new()));
        let err = scorer.score(&request(None)).await.unwrap_err();
        assert!(matches!(err, ScoringError::InputUnresolved));
    }

    #[tokio::test]
    async fn test_partial_lookup_key_is_unresolved() {
        let store = Arc::new(MockGraphStore::new());
        let scorer = FuzzyScorer::new(store.clone());
        let err = scorer
            .score(&FuzzyScoreRequest {
                case_id: Some("P-001".to_string()),
                ..request(None)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::InputUnresolved));
        assert!(store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_value_from_graph() {
        let store = Arc::new(MockGraphStore::new().on("TIENE_INDICADOR", vec![json!({"valor": 6.5})]));
        let scorer = FuzzyScorer::new(store);

        let response = scorer
            .score(&FuzzyScoreRequest {
                case_id: Some("P-001".to_string()),
                symptom_name: Some("Dolor".to_string()),
                ..request(None)
            })
            .await
            .unwrap();
        assert_eq!(response.resolved_value, 6.5);
        assert_eq!(response.value_source, ValueSource::Graph);
    }

    #[tokio::test]
    async fn test_lookup_miss_is_unresolved() {
        let scorer = FuzzyScorer::new(Arc::new(MockGraphStore::new()));
        let err = scorer
            .score(&FuzzyScoreRequest {
                case_id: Some("P-404".to_string()),
                symptom_name: Some("Dolor".to_string()),
                ..request(None)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::InputUnresolved));
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates() {
        let store = MockGraphStore::new().fail_on("TIENE_INDICADOR", "Neo.ClientError", "boom");
        let scorer = FuzzyScorer::new(Arc::new(store));
        let err = scorer
            .score(&FuzzyScoreRequest {
                case_id: Some("P-001".to_string()),
                symptom_name: Some("Dolor".to_string()),
                ..request(None)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::Query(_)));
    }

    #[tokio::test]
    async fn test_degenerate_sigma_scores_zero() {
        let scorer = FuzzyScorer::new(Arc::new(MockGraphStore::new()));
        let response = scorer
            .score(&FuzzyScoreRequest {
                sigma: 0.0,
                ..request(Some(8.0))
            })
            .await
            .unwrap();
        assert_eq!(response.membership_degree, 0.0);
    }
}
