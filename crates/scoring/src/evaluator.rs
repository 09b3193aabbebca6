//! Case Evaluation

use crate::slots::SlotRepository;
use crate::ScoringError;
use alerting::{
    AlertStore, ExactMatchRule, FieldInputs, MembershipInputs, RuleSet, UpsertOutcome,
};
use fuzzy_frames::{CategoryDefinition, MembershipVector, Slot};
use graph_store::SymptomObservation;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Per-slot result of an evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotEvaluation {
    pub name: String,
    pub crisp_value: Option<f64>,
    pub memberships: MembershipVector,
    pub entropy: Option<f64>,
    /// Whether memberships were recomputed in this evaluation
    pub recomputed: bool,
}

impl SlotEvaluation {
    fn from_slot(slot: &Slot, recomputed: bool) -> Self {
        Self {
            name: slot.name.clone(),
            crisp_value: slot.crisp_value,
            memberships: slot.memberships.clone(),
            entropy: slot.entropy,
            recomputed,
        }
    }
}

/// Result of evaluating a case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseEvaluation {
    pub case_id: String,
    pub slots: Vec<SlotEvaluation>,
    /// Alerts fired in this evaluation
    pub alerts: Vec<UpsertOutcome>,
}

/// New observed value and/or category set for one slot
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotUpdate {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub categories: Option<Vec<CategoryDefinition>>,
}

/// Alert raised by a symptom rule for one patient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomAlert {
    pub patient_id: String,
    pub patient_name: Option<String>,
    pub code: String,
    pub reason: String,
    pub created: bool,
}

/// Recomputes slot state and applies alert rules
pub struct CaseEvaluator {
    slots: Arc<dyn SlotRepository>,
    alerts: Arc<dyn AlertStore>,
    rules: RuleSet,
}

impl CaseEvaluator {
    pub fn new(slots: Arc<dyn SlotRepository>, alerts: Arc<dyn AlertStore>, rules: RuleSet) -> Self {
        Self { slots, alerts, rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Refresh every fuzzifiable slot of a case, persist it, then evaluate
    /// the threshold rules against the resulting memberships.
    ///
    /// Slots without a crisp value or categories keep their stored
    /// memberships and still take part in rule evaluation.
    pub async fn evaluate_case(&self, case_id: &str) -> Result<CaseEvaluation, ScoringError> {
        let mut slots = self.slots.load_case(case_id).await?;
        let mut evaluated = Vec::with_capacity(slots.len());

        for slot in slots.iter_mut() {
            let recomputed = slot.refresh().is_some();
            if recomputed {
                self.slots.save_slot(case_id, slot).await?;
            }
            evaluated.push(SlotEvaluation::from_slot(slot, recomputed));
        }

        let inputs = MembershipInputs::from_slots(slots.iter());
        let decisions = self.rules.evaluate_memberships(&inputs, Some(case_id));
        debug!("Case {}: {} rule decisions", case_id, decisions.len());

        let mut alerts = Vec::with_capacity(decisions.len());
        for decision in &decisions {
            alerts.push(self.alerts.upsert(decision).await?);
        }

        info!(
            "Evaluated case {}: {} slots, {} alerts",
            case_id,
            evaluated.len(),
            alerts.len()
        );

        Ok(CaseEvaluation {
            case_id: case_id.to_string(),
            slots: evaluated,
            alerts,
        })
    }

    /// Apply a new observed value and/or categories to one slot, recompute
    /// and persist it
    pub async fn update_slot(
        &self,
        case_id: &str,
        slot_name: &str,
        update: SlotUpdate,
    ) -> Result<SlotEvaluation, ScoringError> {
        let mut slot = self
            .slots
            .load_case(case_id)
            .await?
            .into_iter()
            .find(|s| s.name == slot_name)
            .ok_or_else(|| ScoringError::SlotNotFound {
                case_id: case_id.to_string(),
                slot: slot_name.to_string(),
            })?;

        if let Some(value) = update.value {
            slot.crisp_value = Some(value);
        }

        // New categories invalidate manually assigned memberships
        let recomputed = match update.categories {
            Some(categories) => slot.set_categories(categories).is_some(),
            None => slot.refresh().is_some(),
        };
        self.slots.save_slot(case_id, &slot).await?;

        Ok(SlotEvaluation::from_slot(&slot, recomputed))
    }

    /// Apply the exact-match rules to symptom observations, one alert
    /// upsert per matching patient
    pub async fn run_symptom_rules(
        &self,
        observations: &[SymptomObservation],
    ) -> Result<Vec<SymptomAlert>, ScoringError> {
        let mut raised = Vec::new();

        for observation in observations {
            let mut fields = FieldInputs::new().with(ExactMatchRule::SYMPTOM, observation.symptom.as_str());
            if let Some(intensity) = &observation.intensity {
                fields.insert(ExactMatchRule::INTENSITY, intensity.as_str());
            }

            for decision in self.rules.evaluate_fields(&fields, Some(&observation.patient_id)) {
                let outcome = self.alerts.upsert(&decision).await?;
                raised.push(SymptomAlert {
                    patient_id: observation.patient_id.clone(),
                    patient_name: observation.patient_name.clone(),
                    code: decision.code,
                    reason: decision.description,
                    created: outcome.created,
                });
            }
        }

        info!(
            "Symptom rules: {} observations, {} alerts",
            observations.len(),
            raised.len()
        );
        Ok(raised)
    }
}
