//! API Error Types

use alerting::AlertError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use graph_store::QueryError;
use nl_query::{PipelineError, TranslationError};
use scoring::ScoringError;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Errors returned by handlers, rendered as `{error, query?}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Request was well-formed but no value could be resolved
    #[error("{0}")]
    Unprocessable(String),

    /// A collaborator (graph store, language model) failed
    #[error("{message}")]
    Upstream {
        message: String,
        query: Option<String>,
    },

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed ({}): {}", status, self);
        }

        let query = match &self {
            ApiError::Upstream { query, .. } => query.clone(),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            query,
        };

        (status, Json(body)).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        ApiError::Upstream {
            message: e.to_string(),
            query: None,
        }
    }
}

impl From<TranslationError> for ApiError {
    fn from(e: TranslationError) -> Self {
        ApiError::Upstream {
            message: e.to_string(),
            query: None,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::EmptyQuestion => ApiError::BadRequest(
                "La pregunta 'question' no puede estar vacía. Ingresá una consulta en lenguaje natural."
                    .to_string(),
            ),
            other => ApiError::Upstream {
                query: other.query().map(str::to_string),
                message: other.to_string(),
            },
        }
    }
}

impl From<AlertError> for ApiError {
    fn from(e: AlertError) -> Self {
        match e {
            AlertError::NotFound(_) => ApiError::NotFound(e.to_string()),
            AlertError::InvalidSeverity(_) => ApiError::BadRequest(e.to_string()),
            AlertError::Storage(_) => ApiError::Upstream {
                message: e.to_string(),
                query: None,
            },
        }
    }
}

impl From<ScoringError> for ApiError {
    fn from(e: ScoringError) -> Self {
        match e {
            ScoringError::InputUnresolved => ApiError::Unprocessable(e.to_string()),
            ScoringError::CaseNotFound(_) | ScoringError::SlotNotFound { .. } => {
                ApiError::NotFound(e.to_string())
            }
            ScoringError::InvalidSlot { .. } => ApiError::Internal(e.to_string()),
            ScoringError::Query(inner) => inner.into(),
            ScoringError::Alert(inner) => inner.into(),
        }
    }
}

/// Errors while building or running the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Graph store setup failed: {0}")]
    Graph(#[from] QueryError),

    #[error("Language model setup failed: {0}")]
    Model(#[from] TranslationError),

    #[error("Unknown query profile: {0}")]
    UnknownProfile(String),

    #[error("Metrics recorder error: {0}")]
    Metrics(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_query_failure_keeps_query() {
        let err: ApiError = PipelineError::Query {
            source: QueryError::Rejected {
                code: "Neo.ClientError.Statement.SyntaxError".to_string(),
                message: "Invalid input".to_string(),
            },
            query: "MATCH (n RETURN n".to_string(),
        }
        .into();

        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(matches!(err, ApiError::Upstream { query: Some(ref q), .. } if q == "MATCH (n RETURN n"));
        assert!(err.to_string().contains("Invalid input"));
    }

    #[test]
    fn test_empty_question_is_bad_request() {
        let err: ApiError = PipelineError::EmptyQuestion.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_scoring_statuses() {
        assert_eq!(ApiError::from(ScoringError::InputUnresolved).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            ApiError::from(ScoringError::CaseNotFound("Caso-9".to_string())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ScoringError::Alert(AlertError::NotFound("X".to_string()))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ScoringError::Query(QueryError::Connection("refused".to_string()))).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
