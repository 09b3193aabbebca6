//! Alert Rules

use crate::error::AlertError;
use fuzzy_frames::Slot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Alert code for severe pain combined with low observed improvement
pub const HIGH_RISK_SPRAIN: &str = "HIGH_RISK_SPRAIN";

/// Alert code for an intense pain symptom requiring immediate referral
pub const IMMEDIATE_REFERRAL_PAIN: &str = "IMMEDIATE_REFERRAL_PAIN";

/// Placeholder replaced by the patient/case identifier in descriptions
const SUBJECT_PLACEHOLDER: &str = "{subject}";

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "baja" => Ok(Severity::Low),
            "medium" | "media" => Ok(Severity::Medium),
            "high" | "alta" => Ok(Severity::High),
            "critical" | "critica" | "crítica" => Ok(Severity::Critical),
            other => Err(AlertError::InvalidSeverity(other.to_string())),
        }
    }
}

/// What to upsert when a rule fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDecision {
    pub code: String,
    pub severity: Severity,
    pub description: String,
    /// Patient/case the decision was taken for
    pub subject: Option<String>,
}

fn render_description(template: &str, subject: Option<&str>) -> String {
    template.replace(SUBJECT_PLACEHOLDER, subject.unwrap_or("desconocido"))
}

/// Membership degrees addressed by `(slot, category)`
#[derive(Debug, Clone, Default)]
pub struct MembershipInputs {
    degrees: HashMap<(String, String), f64>,
}

impl MembershipInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every stored membership of the given slots
    pub fn from_slots<'a>(slots: impl IntoIterator<Item = &'a Slot>) -> Self {
        let mut inputs = Self::new();
        for slot in slots {
            for m in slot.memberships.iter() {
                inputs.insert(&slot.name, &m.label, m.degree);
            }
        }
        inputs
    }

    pub fn insert(&mut self, slot: &str, category: &str, degree: f64) {
        self.degrees
            .insert((slot.to_string(), category.to_string()), degree);
    }

    pub fn with(mut self, slot: &str, category: &str, degree: f64) -> Self {
        self.insert(slot, category, degree);
        self
    }

    /// Degree of `slot` in `category`; absent memberships read as zero
    pub fn membership_of(&self, slot: &str, category: &str) -> f64 {
        self.degrees
            .get(&(slot.to_string(), category.to_string()))
            .copied()
            .unwrap_or(0.0)
    }
}

/// `membership_of(slot, category) >= min_degree`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub slot: String,
    pub category: String,
    pub min_degree: f64,
}

impl Threshold {
    pub fn new(slot: impl Into<String>, category: impl Into<String>, min_degree: f64) -> Self {
        Self {
            slot: slot.into(),
            category: category.into(),
            min_degree,
        }
    }

    pub fn holds(&self, inputs: &MembershipInputs) -> bool {
        inputs.membership_of(&self.slot, &self.category) >= self.min_degree
    }
}

/// Conjunction of membership thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub code: String,
    pub severity: Severity,
    pub description_template: String,
    pub conditions: Vec<Threshold>,
}

impl ThresholdRule {
    /// Severe current pain together with low observed improvement
    pub fn high_risk_sprain(pain_threshold: f64, improvement_threshold: f64) -> Self {
        Self {
            code: HIGH_RISK_SPRAIN.to_string(),
            severity: Severity::High,
            description_template:
                "Dolor severo y baja mejoría en esguince/torcedura (caso {subject})".to_string(),
            conditions: vec![
                Threshold::new("dolor_actual", "severo", pain_threshold),
                Threshold::new("mejora_observada", "baja", improvement_threshold),
            ],
        }
    }

    pub fn holds(&self, inputs: &MembershipInputs) -> bool {
        self.conditions.iter().all(|c| c.holds(inputs))
    }

    pub fn evaluate(&self, inputs: &MembershipInputs, subject: Option<&str>) -> Option<AlertDecision> {
        if !self.holds(inputs) {
            debug!("Rule {} did not fire", self.code);
            return None;
        }

        Some(AlertDecision {
            code: self.code.clone(),
            severity: self.severity,
            description: render_description(&self.description_template, subject),
            subject: subject.map(str::to_string),
        })
    }
}

/// Categorical field values (e.g. symptom name, intensity)
#[derive(Debug, Clone, Default)]
pub struct FieldInputs {
    values: HashMap<String, String>,
}

impl FieldInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.values.insert(field.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }
}

/// `field == expected`, optionally ignoring case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub field: String,
    pub expected: String,
    #[serde(default)]
    pub case_insensitive: bool,
}

impl FieldMatch {
    pub fn exact(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            case_insensitive: false,
        }
    }

    pub fn ignoring_case(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            case_insensitive: true,
            ..Self::exact(field, expected)
        }
    }

    pub fn holds(&self, inputs: &FieldInputs) -> bool {
        match inputs.get(&self.field) {
            Some(value) if self.case_insensitive => value.to_lowercase() == self.expected.to_lowercase(),
            Some(value) => value == self.expected,
            None => false,
        }
    }
}

/// Conjunction of exact matches over categorical fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExactMatchRule {
    pub code: String,
    pub severity: Severity,
    pub description_template: String,
    pub conditions: Vec<FieldMatch>,
}

impl ExactMatchRule {
    /// Field holding the symptom name
    pub const SYMPTOM: &'static str = "sintoma";
    /// Field holding the symptom intensity label
    pub const INTENSITY: &'static str = "intensidad";

    /// Intense pain: immediate referral to a physician
    pub fn immediate_pain_referral() -> Self {
        Self {
            code: IMMEDIATE_REFERRAL_PAIN.to_string(),
            severity: Severity::Critical,
            description_template:
                "Dolor intenso: se recomienda derivación médica inmediata".to_string(),
            conditions: vec![
                FieldMatch::ignoring_case(Self::SYMPTOM, "dolor"),
                FieldMatch::exact(Self::INTENSITY, "Intenso"),
            ],
        }
    }

    pub fn holds(&self, inputs: &FieldInputs) -> bool {
        self.conditions.iter().all(|c| c.holds(inputs))
    }

    pub fn evaluate(&self, inputs: &FieldInputs, subject: Option<&str>) -> Option<AlertDecision> {
        if !self.holds(inputs) {
            return None;
        }

        Some(AlertDecision {
            code: self.code.clone(),
            severity: self.severity,
            description: render_description(&self.description_template, subject),
            subject: subject.map(str::to_string),
        })
    }
}

/// The rules evaluated for a case
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    pub threshold_rules: Vec<ThresholdRule>,
    pub exact_rules: Vec<ExactMatchRule>,
}

impl RuleSet {
    /// Built-in sprain rules with the given membership thresholds
    pub fn sprain_defaults(pain_threshold: f64, improvement_threshold: f64) -> Self {
        Self {
            threshold_rules: vec![ThresholdRule::high_risk_sprain(pain_threshold, improvement_threshold)],
            exact_rules: vec![ExactMatchRule::immediate_pain_referral()],
        }
    }

    pub fn evaluate_memberships(
        &self,
        inputs: &MembershipInputs,
        subject: Option<&str>,
    ) -> Vec<AlertDecision> {
        self.threshold_rules
            .iter()
            .filter_map(|r| r.evaluate(inputs, subject))
            .collect()
    }

    pub fn evaluate_fields(&self, inputs: &FieldInputs, subject: Option<&str>) -> Vec<AlertDecision> {
        self.exact_rules
            .iter()
            .filter_map(|r| r.evaluate(inputs, subject))
            .collect()
    }
}
