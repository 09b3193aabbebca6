//! Slot Persistence
//!
//! Slots live in the graph as `(FrameInstance {id})-[:TIENE_SLOT]->(Slot)`.
//! Categories and memberships are stored as parallel lists
//! (`category_labels`/`category_centers`/`category_spreads` and
//! `membership_labels`/`memberships`), one representation for every slot.

use crate::ScoringError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fuzzy_frames::{CategoryDefinition, MembershipVector, Slot};
use graph_store::{params, GraphStore, Record};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const LOAD_CASE_QUERY: &str = "\
MATCH (c:FrameInstance {id: $case_id})-[:TIENE_SLOT]->(s:Slot)
RETURN s.slot_name AS slot_name,
       s.valor_crisp AS valor_crisp,
       s.category_labels AS category_labels,
       s.category_centers AS category_centers,
       s.category_spreads AS category_spreads,
       s.membership_labels AS membership_labels,
       s.memberships AS memberships,
       s.entropia AS entropia,
       toString(s.fuzzy_last_updated) AS fuzzy_last_updated
ORDER BY slot_name";

const SAVE_SLOT_QUERY: &str = "\
MATCH (c:FrameInstance {id: $case_id})-[:TIENE_SLOT]->(s:Slot {slot_name: $slot_name})
SET s.valor_crisp = $valor_crisp,
    s.funcion_pertenencia = 'gaussiana',
    s.category_labels = $category_labels,
    s.category_centers = $category_centers,
    s.category_spreads = $category_spreads,
    s.membership_labels = $membership_labels,
    s.memberships = $memberships,
    s.entropia = $entropia,
    s.fuzzy_last_updated = CASE WHEN $updated_at IS NULL THEN null ELSE datetime($updated_at) END
RETURN s.slot_name AS slot_name";

/// Load and store the slots of a case
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Every slot of a case; `CaseNotFound` when the case has none
    async fn load_case(&self, case_id: &str) -> Result<Vec<Slot>, ScoringError>;

    /// Overwrite the stored state of one slot
    async fn save_slot(&self, case_id: &str, slot: &Slot) -> Result<(), ScoringError>;
}

/// Slot repository over a graph store
pub struct GraphSlotRepository {
    store: Arc<dyn GraphStore>,
}

impl GraphSlotRepository {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }
}

fn number_list(record: &Record, column: &str, slot: &str) -> Result<Vec<f64>, ScoringError> {
    match record.get(column) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_f64().ok_or_else(|| ScoringError::InvalidSlot {
                    slot: slot.to_string(),
                    reason: format!("{} contains a non-numeric value", column),
                })
            })
            .collect(),
        Some(_) => Err(ScoringError::InvalidSlot {
            slot: slot.to_string(),
            reason: format!("{} is not a list", column),
        }),
    }
}

fn text_list(record: &Record, column: &str, slot: &str) -> Result<Vec<String>, ScoringError> {
    match record.get(column) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect()),
        Some(_) => Err(ScoringError::InvalidSlot {
            slot: slot.to_string(),
            reason: format!("{} is not a list", column),
        }),
    }
}

fn slot_from_record(record: &Record) -> Result<Slot, ScoringError> {
    let name = record
        .get_string("slot_name")
        .ok_or_else(|| ScoringError::InvalidSlot {
            slot: "?".to_string(),
            reason: "missing slot_name".to_string(),
        })?;

    let labels = text_list(record, "category_labels", &name)?;
    let centers = number_list(record, "category_centers", &name)?;
    let spreads = number_list(record, "category_spreads", &name)?;
    if labels.len() != centers.len() || labels.len() != spreads.len() {
        return Err(ScoringError::InvalidSlot {
            slot: name,
            reason: "category lists differ in length".to_string(),
        });
    }

    let membership_labels = text_list(record, "membership_labels", &name)?;
    let degrees = number_list(record, "memberships", &name)?;
    if membership_labels.len() != degrees.len() {
        return Err(ScoringError::InvalidSlot {
            slot: name,
            reason: "membership lists differ in length".to_string(),
        });
    }

    let categories = labels
        .into_iter()
        .zip(centers)
        .zip(spreads)
        .map(|((label, center), spread)| CategoryDefinition::new(label, center, spread))
        .collect();

    let updated_at = record
        .get_str("fuzzy_last_updated")
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));

    Ok(Slot {
        name,
        crisp_value: record.get_f64("valor_crisp"),
        categories,
        memberships: MembershipVector::from_pairs(membership_labels.into_iter().zip(degrees)),
        entropy: record.get_f64("entropia"),
        updated_at,
    })
}

#[async_trait]
impl SlotRepository for GraphSlotRepository {
    async fn load_case(&self, case_id: &str) -> Result<Vec<Slot>, ScoringError> {
        let rows = self
            .store
            .execute(LOAD_CASE_QUERY, params(json!({ "case_id": case_id })))
            .await?;

        if rows.is_empty() {
            return Err(ScoringError::CaseNotFound(case_id.to_string()));
        }

        debug!("Loaded {} slots for case {}", rows.len(), case_id);
        rows.iter().map(slot_from_record).collect()
    }

    async fn save_slot(&self, case_id: &str, slot: &Slot) -> Result<(), ScoringError> {
        let categories = &slot.categories;
        let parameters = params(json!({
            "case_id": case_id,
            "slot_name": slot.name,
            "valor_crisp": slot.crisp_value,
            "category_labels": categories.iter().map(|c| c.label.as_str()).collect::<Vec<_>>(),
            "category_centers": categories.iter().map(|c| c.center).collect::<Vec<_>>(),
            "category_spreads": categories.iter().map(|c| c.spread).collect::<Vec<_>>(),
            "membership_labels": slot.memberships.labels(),
            "memberships": slot.memberships.degrees(),
            "entropia": slot.entropy,
            "updated_at": slot.updated_at.map(|t| t.to_rfc3339()),
        }));

        let rows = self.store.execute(SAVE_SLOT_QUERY, parameters).await?;
        if rows.is_empty() {
            return Err(ScoringError::SlotNotFound {
                case_id: case_id.to_string(),
                slot: slot.name.clone(),
            });
        }

        info!("Saved slot {}/{} (entropy: {:?})", case_id, slot.name, slot.entropy);
        Ok(())
    }
}

/// In-memory slot repository
#[derive(Default)]
pub struct InMemorySlotRepository {
    cases: Mutex<HashMap<String, Vec<Slot>>>,
}

impl InMemorySlotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a case with its slots
    pub fn with_case(self, case_id: &str, slots: Vec<Slot>) -> Self {
        if let Ok(mut cases) = self.cases.lock() {
            cases.insert(case_id.to_string(), slots);
        }
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<Slot>>>, ScoringError> {
        self.cases.lock().map_err(|e| ScoringError::InvalidSlot {
            slot: "*".to_string(),
            reason: format!("Lock error: {}", e),
        })
    }
}

#[async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn load_case(&self, case_id: &str) -> Result<Vec<Slot>, ScoringError> {
        self.lock()?
            .get(case_id)
            .filter(|slots| !slots.is_empty())
            .cloned()
            .ok_or_else(|| ScoringError::CaseNotFound(case_id.to_string()))
    }

    async fn save_slot(&self, case_id: &str, slot: &Slot) -> Result<(), ScoringError> {
        let mut cases = self.lock()?;
        let stored = cases
            .get_mut(case_id)
            .and_then(|slots| slots.iter_mut().find(|s| s.name == slot.name))
            .ok_or_else(|| ScoringError::SlotNotFound {
                case_id: case_id.to_string(),
                slot: slot.name.clone(),
            })?;

        *stored = slot.clone();
        Ok(())
    }
}
