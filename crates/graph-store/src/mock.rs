//! Scripted in-memory graph store
//!
//! Answers queries by substring match against registered fragments and keeps
//! a log of every executed statement.

use crate::client::GraphStore;
use crate::record::{Params, Record};
use crate::QueryError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use tracing::debug;

/// A statement received by the mock store
#[derive(Debug, Clone)]
pub struct ExecutedQuery {
    pub query: String,
    pub params: Params,
}

enum Scripted {
    Rows(Vec<Record>),
    Fail(QueryError),
}

/// Graph store returning scripted responses
#[derive(Default)]
pub struct MockGraphStore {
    responses: Mutex<Vec<(String, Scripted)>>,
    executed: Mutex<Vec<ExecutedQuery>>,
}

impl MockGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries containing `fragment` with `rows` (JSON objects)
    pub fn on(self, fragment: &str, rows: Vec<Value>) -> Self {
        let records = rows.into_iter().filter_map(|r| Record::try_from(r).ok()).collect();
        self.push(fragment, Scripted::Rows(records));
        self
    }

    /// Reject queries containing `fragment`
    pub fn fail_on(self, fragment: &str, code: &str, message: &str) -> Self {
        self.push(
            fragment,
            Scripted::Fail(QueryError::Rejected {
                code: code.to_string(),
                message: message.to_string(),
            }),
        );
        self
    }

    fn push(&self, fragment: &str, scripted: Scripted) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push((fragment.to_string(), scripted));
        }
    }

    /// Every statement executed so far, in order
    pub fn executed(&self) -> Vec<ExecutedQuery> {
        self.executed.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Statements containing `fragment`
    pub fn executed_matching(&self, fragment: &str) -> Vec<ExecutedQuery> {
        self.executed()
            .into_iter()
            .filter(|e| e.query.contains(fragment))
            .collect()
    }
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn execute(&self, query: &str, params: Params) -> Result<Vec<Record>, QueryError> {
        debug!("Mock graph store: {}", query);

        self.executed
            .lock()
            .map_err(|e| QueryError::Connection(format!("Lock error: {}", e)))?
            .push(ExecutedQuery {
                query: query.to_string(),
                params,
            });

        let responses = self
            .responses
            .lock()
            .map_err(|e| QueryError::Connection(format!("Lock error: {}", e)))?;

        match responses.iter().find(|(fragment, _)| query.contains(fragment.as_str())) {
            Some((_, Scripted::Rows(rows))) => Ok(rows.clone()),
            Some((_, Scripted::Fail(err))) => Err(err.clone()),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::params;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_rows_and_log() {
        let store = MockGraphStore::new().on("RETURN s.nombre", vec![json!({"sintoma": "Dolor"})]);

        let rows = store
            .execute("MATCH (s:Sintoma) RETURN s.nombre AS sintoma", params(json!({})))
            .await
            .unwrap();
        assert_eq!(rows[0].get_str("sintoma"), Some("Dolor"));

        let unmatched = store.execute("MATCH (n) RETURN n", Params::new()).await.unwrap();
        assert!(unmatched.is_empty());
        assert_eq!(store.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let store = MockGraphStore::new().fail_on("detalle", "Neo.ClientError", "Unknown property");
        let err = store
            .execute("MATCH (m:Monitoreo) RETURN m.detalle", Params::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown property"));
    }
}
