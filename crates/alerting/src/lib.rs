//! Alerting System
//!
//! Rule evaluation over fuzzy memberships and categorical fields, and
//! idempotent alert upserts keyed by alert code.

mod error;
mod manager;
mod rules;

pub use error::AlertError;
pub use manager::{Alert, AlertFilter, AlertManager, AlertStatus, AlertStore, UpsertOutcome};
pub use rules::{
    AlertDecision, ExactMatchRule, FieldInputs, FieldMatch, MembershipInputs, RuleSet, Severity,
    Threshold, ThresholdRule, HIGH_RISK_SPRAIN, IMMEDIATE_REFERRAL_PAIN,
};
