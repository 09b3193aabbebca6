//! Query Pipeline Error Types

use graph_store::QueryError;
use thiserror::Error;

/// Errors from the language model collaborator
#[derive(Debug, Clone, Error)]
pub enum TranslationError {
    /// Model server could not be reached
    #[error("Model connection error: {0}")]
    Connection(String),

    /// Unexpected HTTP status from the model server
    #[error("Model server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response could not be decoded
    #[error("Model response decode error: {0}")]
    Decode(String),

    /// The model produced no query text
    #[error("Model returned an empty query")]
    EmptyOutput,
}

/// Errors from a question → answer run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Blank question, rejected before any model call
    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Translation failed: {0}")]
    Translation(#[from] TranslationError),

    /// The generated query failed in the graph store
    #[error("Query failed: {source}")]
    Query {
        #[source]
        source: QueryError,
        query: String,
    },

    /// Rows were fetched but the answer could not be written
    #[error("Answer synthesis failed: {source}")]
    Answer {
        #[source]
        source: TranslationError,
        query: String,
    },
}

impl PipelineError {
    /// Generated query text, when the failure happened after translation
    pub fn query(&self) -> Option<&str> {
        match self {
            PipelineError::Query { query, .. } | PipelineError::Answer { query, .. } => Some(query),
            _ => None,
        }
    }
}
