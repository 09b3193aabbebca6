//! Clinical Slots and Membership Vectors

use crate::entropy::fuzzy_entropy;
use crate::membership::{round_to, CategoryDefinition};
use crate::ENTROPY_PRECISION;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Degree of membership of a slot value in one linguistic category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipDegree {
    pub label: String,
    pub degree: f64,
}

/// Ordered label → degree mapping, one entry per category definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipVector(Vec<MembershipDegree>);

impl MembershipVector {
    /// Build a vector from `(label, degree)` pairs, keeping their order
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(label, degree)| MembershipDegree {
                    label: label.into(),
                    degree,
                })
                .collect(),
        )
    }

    /// Degree for `label`, if the category exists
    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|m| m.label == label).map(|m| m.degree)
    }

    /// Degrees in category order
    pub fn degrees(&self) -> Vec<f64> {
        self.0.iter().map(|m| m.degree).collect()
    }

    /// Labels in category order
    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(|m| m.label.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MembershipDegree> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Normalized entropy of this vector
    pub fn entropy(&self) -> f64 {
        fuzzy_entropy(&self.degrees())
    }
}

/// A named clinical measurement context of a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Slot name, unique within a case (e.g. "dolor_actual")
    pub name: String,
    /// Crisp observed value
    pub crisp_value: Option<f64>,
    /// Linguistic categories, fixed during fuzzification
    pub categories: Vec<CategoryDefinition>,
    /// Last computed (or manually assigned) memberships
    pub memberships: MembershipVector,
    /// Normalized entropy, rounded to `ENTROPY_PRECISION` places
    pub entropy: Option<f64>,
    /// Time of the last membership update
    pub updated_at: Option<DateTime<Utc>>,
}

impl Slot {
    /// Create an empty slot
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            crisp_value: None,
            categories: Vec::new(),
            memberships: MembershipVector::default(),
            entropy: None,
            updated_at: None,
        }
    }

    pub fn with_crisp_value(mut self, value: f64) -> Self {
        self.crisp_value = Some(value);
        self
    }

    pub fn with_category(mut self, label: impl Into<String>, center: f64, spread: f64) -> Self {
        self.categories.push(CategoryDefinition::new(label, center, spread));
        self
    }

    /// Assign memberships directly, for slots whose degrees are set by hand
    pub fn with_memberships(mut self, memberships: MembershipVector) -> Self {
        self.memberships = memberships;
        self
    }

    /// Degree of the current value in `label`
    pub fn membership_of(&self, label: &str) -> Option<f64> {
        self.memberships.get(label)
    }

    /// Whether the slot holds enough data to be fuzzified
    pub fn is_fuzzifiable(&self) -> bool {
        self.crisp_value.is_some() && !self.categories.is_empty()
    }

    /// Fuzzify the crisp value against every category.
    ///
    /// Returns `None` and leaves the slot untouched when there is no crisp
    /// value or no category to match against.
    pub fn fuzzify(&mut self) -> Option<MembershipVector> {
        self.fuzzify_at(Utc::now())
    }

    pub fn fuzzify_at(&mut self, now: DateTime<Utc>) -> Option<MembershipVector> {
        let x = match self.crisp_value {
            Some(x) if !self.categories.is_empty() => x,
            _ => {
                debug!("Slot {} skipped: nothing to fuzzify", self.name);
                return None;
            }
        };

        let vector = MembershipVector::from_pairs(
            self.categories
                .iter()
                .map(|c| (c.label.clone(), c.degree(x))),
        );

        self.memberships = vector.clone();
        self.updated_at = Some(now);
        debug!("Slot {} fuzzified: x={} -> {:?}", self.name, x, vector.degrees());
        Some(vector)
    }

    /// Recompute the entropy from the stored memberships, replacing the
    /// previous value
    pub fn update_entropy(&mut self) -> Option<f64> {
        self.entropy = if self.memberships.is_empty() {
            None
        } else {
            Some(round_to(self.memberships.entropy(), ENTROPY_PRECISION))
        };
        self.entropy
    }

    /// Fuzzify and recompute entropy in one step
    pub fn refresh(&mut self) -> Option<MembershipVector> {
        self.refresh_at(Utc::now())
    }

    pub fn refresh_at(&mut self, now: DateTime<Utc>) -> Option<MembershipVector> {
        let vector = self.fuzzify_at(now)?;
        self.update_entropy();
        Some(vector)
    }

    /// Record a new observed value and recompute derived state
    pub fn set_crisp_value(&mut self, value: f64) -> Option<MembershipVector> {
        self.crisp_value = Some(value);
        self.refresh()
    }

    /// Replace the category set and recompute derived state.
    ///
    /// Memberships computed against the old categories no longer apply, so
    /// they are cleared when the new set cannot be fuzzified.
    pub fn set_categories(&mut self, categories: Vec<CategoryDefinition>) -> Option<MembershipVector> {
        self.set_categories_at(categories, Utc::now())
    }

    pub fn set_categories_at(
        &mut self,
        categories: Vec<CategoryDefinition>,
        now: DateTime<Utc>,
    ) -> Option<MembershipVector> {
        self.categories = categories;
        let refreshed = self.refresh_at(now);
        if refreshed.is_none() {
            self.clear_memberships(now);
        }
        refreshed
    }

    /// Drop the memberships and entropy
    pub fn clear_memberships(&mut self, now: DateTime<Utc>) {
        if !self.memberships.is_empty() || self.entropy.is_some() {
            debug!("Slot {} memberships cleared", self.name);
            self.updated_at = Some(now);
        }
        self.memberships = MembershipVector::default();
        self.entropy = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::membership;

    fn pain_slot() -> Slot {
        Slot::new("dolor_actual")
            .with_category("leve", 2.0, 1.5)
            .with_category("moderado", 5.0, 1.5)
            .with_category("severo", 8.0, 1.2)
    }

    #[test]
    fn test_fuzzify_without_value_is_skipped() {
        let mut slot = pain_slot();
        assert!(slot.fuzzify().is_none());
        assert!(slot.memberships.is_empty());
        assert!(slot.updated_at.is_none());
    }

    #[test]
    fn test_fuzzify_pain_value() {
        let mut slot = pain_slot().with_crisp_value(7.5);
        let vector = slot.fuzzify().unwrap();

        assert_eq!(vector.labels(), vec!["leve", "moderado", "severo"]);
        assert_eq!(vector.get("severo"), Some(membership(7.5, 8.0, 1.2)));
        assert_eq!(vector.get("leve"), Some(membership(7.5, 2.0, 1.5)));
        assert_eq!(slot.memberships, vector);
        assert!(slot.updated_at.is_some());
    }

    #[test]
    fn test_fuzzify_without_categories_keeps_manual_memberships() {
        let manual = MembershipVector::from_pairs([("baja", 0.7), ("media", 0.3), ("alta", 0.0)]);
        let mut slot = Slot::new("mejora_observada")
            .with_crisp_value(40.0)
            .with_memberships(manual.clone());

        assert!(slot.fuzzify().is_none());
        assert_eq!(slot.memberships, manual);
    }

    #[test]
    fn test_refresh_replaces_entropy() {
        let mut slot = pain_slot().with_crisp_value(5.0);
        slot.refresh();
        let first = slot.entropy.unwrap();

        slot.set_crisp_value(8.0);
        let second = slot.entropy.unwrap();

        assert_ne!(first, second);
        let expected = round_to(fuzzy_entropy(&slot.memberships.degrees()), ENTROPY_PRECISION);
        assert_eq!(second, expected);
    }

    #[test]
    fn test_entropy_rounded_to_four_places() {
        let mut slot = pain_slot().with_crisp_value(6.3);
        slot.refresh();
        let h = slot.entropy.unwrap();
        assert_eq!(h, round_to(h, 4));
    }

    #[test]
    fn test_set_categories_recomputes() {
        let mut slot = pain_slot().with_crisp_value(2.0);
        slot.refresh();
        assert_eq!(slot.membership_of("leve"), Some(1.0));

        slot.set_categories(vec![
            CategoryDefinition::new("bajo", 0.0, 1.0),
            CategoryDefinition::new("alto", 10.0, 1.0),
        ]);
        assert_eq!(slot.memberships.len(), 2);
        assert!(slot.membership_of("leve").is_none());
    }

    #[test]
    fn test_empty_categories_clear_memberships() {
        let mut slot = pain_slot().with_crisp_value(7.5);
        slot.refresh();
        assert!(slot.entropy.is_some());

        assert!(slot.set_categories(vec![]).is_none());
        assert!(slot.memberships.is_empty());
        assert!(slot.entropy.is_none());
    }

    #[test]
    fn test_new_categories_without_value_clear_memberships() {
        let manual = MembershipVector::from_pairs([("leve", 0.2)]);
        let mut slot = Slot::new("dolor_actual").with_memberships(manual);
        slot.update_entropy();

        let replaced = slot.set_categories(vec![
            CategoryDefinition::new("bajo", 0.0, 1.0),
            CategoryDefinition::new("alto", 10.0, 1.0),
        ]);
        assert!(replaced.is_none());
        assert!(slot.membership_of("leve").is_none());
        assert!(slot.memberships.is_empty());
        assert!(slot.entropy.is_none());
        assert!(slot.updated_at.is_some());
    }

    #[test]
    fn test_vector_serializes_in_order() {
        let v = MembershipVector::from_pairs([("leve", 0.1), ("severo", 0.9)]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"[{"label":"leve","degree":0.1},{"label":"severo","degree":0.9}]"#);
    }
}
