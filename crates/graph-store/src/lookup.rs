//! Domain Lookups

use crate::client::GraphStore;
use crate::record::params;
use crate::QueryError;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

const INDICATOR_VALUE_QUERY: &str = "\
MATCH (p:Paciente {id:$case_id})-[:PRESENTA_SINTOMA]->(s:Sintoma {nombre:$symptom})\
-[:TIENE_INDICADOR]->(i:Indicador {nombre:$indicator}) \
RETURN coalesce(i.valor_num, i.valor) AS valor LIMIT 1";

const SYMPTOM_OBSERVATIONS_QUERY: &str = "\
MATCH (p:Paciente)-[:PRESENTA_SINTOMA]->(s:Sintoma) \
RETURN p.id AS paciente_id, p.nombre AS nombre_paciente, \
s.nombre AS sintoma, s.intensidad AS intensidad";

const FUZZY_RELATIONS_QUERY: &str = "\
MATCH (a)-[r]->(b) \
WHERE r.mu IS NOT NULL AND r.mu > $min_mu \
RETURN properties(a) AS origen, type(r) AS relacion, r.etiqueta AS etiqueta, \
r.mu AS mu, properties(b) AS destino \
ORDER BY r.mu DESC";

/// Crisp value of an indicator recorded for a patient's symptom.
///
/// Returns `None` when no indicator matches or its value is not numeric.
pub async fn fetch_indicator_value<S: GraphStore + ?Sized>(
    store: &S,
    case_id: &str,
    symptom: &str,
    indicator: &str,
) -> Result<Option<f64>, QueryError> {
    let rows = store
        .execute(
            INDICATOR_VALUE_QUERY,
            params(json!({
                "case_id": case_id,
                "symptom": symptom,
                "indicator": indicator,
            })),
        )
        .await?;

    let value = rows.first().and_then(|r| r.get_f64("valor"));
    debug!(
        "Indicator {} for {}/{}: {:?}",
        indicator, case_id, symptom, value
    );
    Ok(value)
}

/// A symptom presented by a patient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomObservation {
    pub patient_id: String,
    pub patient_name: Option<String>,
    pub symptom: String,
    pub intensity: Option<String>,
}

/// Every `(Paciente)-[:PRESENTA_SINTOMA]->(Sintoma)` pair
pub async fn fetch_symptom_observations<S: GraphStore + ?Sized>(
    store: &S,
) -> Result<Vec<SymptomObservation>, QueryError> {
    let rows = store
        .execute(SYMPTOM_OBSERVATIONS_QUERY, params(json!({})))
        .await?;

    Ok(rows
        .iter()
        .filter_map(|r| {
            Some(SymptomObservation {
                patient_id: r.get_string("paciente_id")?,
                patient_name: r.get_string("nombre_paciente"),
                symptom: r.get_string("sintoma")?,
                intensity: r.get_string("intensidad"),
            })
        })
        .collect())
}

/// A relationship carrying a fuzzy membership degree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyRelation {
    pub source: Value,
    pub relation: String,
    pub label: Option<String>,
    pub degree: f64,
    pub target: Value,
}

/// Relationships whose degree `mu` is strictly above `min_degree`
pub async fn fetch_fuzzy_relations<S: GraphStore + ?Sized>(
    store: &S,
    min_degree: f64,
) -> Result<Vec<FuzzyRelation>, QueryError> {
    let rows = store
        .execute(FUZZY_RELATIONS_QUERY, params(json!({ "min_mu": min_degree })))
        .await?;

    Ok(rows
        .iter()
        .filter_map(|r| {
            Some(FuzzyRelation {
                source: r.get("origen").cloned().unwrap_or(Value::Null),
                relation: r.get_string("relacion")?,
                label: r.get_string("etiqueta"),
                degree: r.get_f64("mu")?,
                target: r.get("destino").cloned().unwrap_or(Value::Null),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGraphStore;

    #[tokio::test]
    async fn test_indicator_value_found() {
        let store = MockGraphStore::new().on("TIENE_INDICADOR", vec![json!({"valor": 7.5})]);

        let value = fetch_indicator_value(&store, "P-001", "Dolor", "escala_dolor")
            .await
            .unwrap();
        assert_eq!(value, Some(7.5));

        let executed = store.executed();
        assert_eq!(executed[0].params["case_id"], json!("P-001"));
        assert_eq!(executed[0].params["indicator"], json!("escala_dolor"));
    }

    #[tokio::test]
    async fn test_indicator_value_missing() {
        let store = MockGraphStore::new();
        let value = fetch_indicator_value(&store, "P-404", "Dolor", "escala_dolor")
            .await
            .unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_indicator_lookup_propagates_errors() {
        let store = MockGraphStore::new().fail_on("TIENE_INDICADOR", "Neo.TransientError", "down");
        let err = fetch_indicator_value(&store, "P-001", "Dolor", "x").await.unwrap_err();
        assert!(matches!(err, QueryError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_symptom_observations() {
        let store = MockGraphStore::new().on(
            "PRESENTA_SINTOMA",
            vec![
                json!({"paciente_id": "P-001", "nombre_paciente": "Carlos López", "sintoma": "Dolor", "intensidad": "Intenso"}),
                json!({"paciente_id": null, "sintoma": "Dolor"}),
            ],
        );

        let observations = fetch_symptom_observations(&store).await.unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].intensity.as_deref(), Some("Intenso"));
    }

    #[tokio::test]
    async fn test_fuzzy_relations() {
        let store = MockGraphStore::new().on(
            "r.mu > $min_mu",
            vec![json!({
                "origen": {"id": "P-001"},
                "relacion": "PRESENTA_SINTOMA",
                "etiqueta": "Severo",
                "mu": 0.8,
                "destino": {"tipo": "Dolor tobillo"}
            })],
        );

        let relations = fetch_fuzzy_relations(&store, 0.6).await.unwrap();
        assert_eq!(relations[0].degree, 0.8);
        assert_eq!(store.executed()[0].params["min_mu"], json!(0.6));
    }
}
