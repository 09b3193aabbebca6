//! Graph Store Client

use crate::record::{Params, Record};
use crate::QueryError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Query execution over the graph schema
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run one statement and return its rows in order
    async fn execute(&self, query: &str, params: Params) -> Result<Vec<Record>, QueryError>;
}

#[async_trait]
impl<T: GraphStore + ?Sized> GraphStore for Arc<T> {
    async fn execute(&self, query: &str, params: Params) -> Result<Vec<Record>, QueryError> {
        (**self).execute(query, params).await
    }
}

/// Connection settings for the graph database
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphEndpoint {
    /// HTTP base URL (e.g. "http://localhost:7474")
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Database name
    pub database: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GraphEndpoint {
    fn default() -> Self {
        Self {
            uri: "http://localhost:7474".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            database: "neo4j".to_string(),
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for GraphEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphEndpoint")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GraphEndpoint {
    /// Transaction commit URL for the configured database
    pub fn commit_url(&self) -> String {
        format!(
            "{}/db/{}/tx/commit",
            self.uri.trim_end_matches('/'),
            self.database
        )
    }
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

impl TxResponse {
    fn into_records(self) -> Result<Vec<Record>, QueryError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(QueryError::Rejected {
                code: err.code,
                message: err.message,
            });
        }

        Ok(self
            .results
            .into_iter()
            .flat_map(|result| {
                let columns = result.columns;
                result
                    .data
                    .into_iter()
                    .map(move |d| Record::from_row(&columns, d.row))
                    .collect::<Vec<_>>()
            })
            .collect())
    }
}

/// Neo4j client over the HTTP transaction endpoint
pub struct Neo4jHttpStore {
    client: Client,
    endpoint: GraphEndpoint,
}

impl Neo4jHttpStore {
    /// Create a new client; no request is sent until the first query
    pub fn new(endpoint: GraphEndpoint) -> Result<Self, QueryError> {
        info!("Creating graph store client for {}", endpoint.uri);

        let client = Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_secs))
            .build()
            .map_err(|e| QueryError::Connection(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &GraphEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl GraphStore for Neo4jHttpStore {
    async fn execute(&self, query: &str, params: Params) -> Result<Vec<Record>, QueryError> {
        debug!("Executing graph query: {}", query);

        let body = json!({
            "statements": [{ "statement": query, "parameters": params }]
        });

        let response = self
            .client
            .post(self.endpoint.commit_url())
            .basic_auth(&self.endpoint.user, Some(&self.endpoint.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| QueryError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Graph store returned HTTP {}", status);
            return Err(QueryError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let tx: TxResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Decode(e.to_string()))?;

        let records = tx.into_records()?;
        debug!("Graph query returned {} rows", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_url() {
        let endpoint = GraphEndpoint {
            uri: "http://graph:7474/".to_string(),
            database: "lesiones".to_string(),
            ..Default::default()
        };
        assert_eq!(endpoint.commit_url(), "http://graph:7474/db/lesiones/tx/commit");
    }

    #[test]
    fn test_debug_hides_password() {
        let endpoint = GraphEndpoint {
            password: "secret".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", endpoint).contains("secret"));
    }

    #[test]
    fn test_decode_rows() {
        let tx: TxResponse = serde_json::from_value(json!({
            "results": [{
                "columns": ["indicador", "valor"],
                "data": [
                    {"row": ["dolor", 7.5], "meta": [null, null]},
                    {"row": ["edema", null], "meta": [null, null]}
                ]
            }],
            "errors": []
        }))
        .unwrap();

        let records = tx.into_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get_str("indicador"), Some("dolor"));
        assert_eq!(records[1].get_f64("valor"), None);
    }

    #[test]
    fn test_decode_error_keeps_store_text() {
        let tx: TxResponse = serde_json::from_value(json!({
            "results": [],
            "errors": [{
                "code": "Neo.ClientError.Statement.SyntaxError",
                "message": "Invalid input 'MATC'"
            }]
        }))
        .unwrap();

        let err = tx.into_records().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Neo.ClientError.Statement.SyntaxError: Invalid input 'MATC'"
        );
    }
}
