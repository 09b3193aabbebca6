//! Graph Store
//!
//! Query execution against the injury knowledge graph. The production
//! backend talks to Neo4j through its HTTP transaction API; a scripted mock
//! store serves tests and offline runs.

mod client;
mod lookup;
pub mod mock;
mod record;
mod script;

pub use client::{GraphEndpoint, GraphStore, Neo4jHttpStore};
pub use lookup::{
    fetch_fuzzy_relations, fetch_indicator_value, fetch_symptom_observations, FuzzyRelation,
    SymptomObservation,
};
pub use mock::MockGraphStore;
pub use record::{params, Params, Record};
pub use script::{run_script, split_statements};

use thiserror::Error;

/// Graph query errors
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Store could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Store rejected the statement (syntax error, constraint violation, ...)
    #[error("{code}: {message}")]
    Rejected { code: String, message: String },

    /// Unexpected HTTP status from the store
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}
