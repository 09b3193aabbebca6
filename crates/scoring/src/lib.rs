//! Scoring and Case Evaluation
//!
//! Glue between the fuzzy kernel, the rule evaluator and the graph store:
//! resolves crisp values, recomputes slot memberships and entropy, persists
//! them, and applies alert decisions.

mod alerts;
mod evaluator;
mod fuzzy_score;
mod seed;
mod slots;

pub use alerts::GraphAlertStore;
pub use evaluator::{CaseEvaluation, CaseEvaluator, SlotEvaluation, SlotUpdate, SymptomAlert};
pub use fuzzy_score::{FuzzyScoreRequest, FuzzyScoreResponse, FuzzyScorer, ValueSource};
pub use seed::{seed_demo_case, DEMO_CASE_ID, DEMO_PATIENT_ID, DEMO_SEED_SCRIPT};
pub use slots::{GraphSlotRepository, InMemorySlotRepository, SlotRepository};

use alerting::AlertError;
use graph_store::QueryError;
use thiserror::Error;

/// Scoring errors
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Neither a value nor a usable lookup key
    #[error("No indicator value available: provide 'value' or both 'case_id' and 'symptom_name'")]
    InputUnresolved,

    #[error("Case not found: {0}")]
    CaseNotFound(String),

    #[error("Slot {slot} not found in case {case_id}")]
    SlotNotFound { case_id: String, slot: String },

    #[error("Invalid data for slot {slot}: {reason}")]
    InvalidSlot { slot: String, reason: String },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Alert(#[from] AlertError),
}
