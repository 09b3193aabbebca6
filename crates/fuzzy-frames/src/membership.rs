//! Gaussian Membership Function

use serde::{Deserialize, Serialize};

/// Decimal places kept when a membership degree is reported
pub const MEMBERSHIP_PRECISION: u32 = 4;

/// Gaussian membership degree of `x` in the category centred at `center`.
///
/// A non-positive `spread` can never be matched and yields `0.0`.
pub fn membership(x: f64, center: f64, spread: f64) -> f64 {
    if spread <= 0.0 {
        return 0.0;
    }

    let z = (x - center) / spread;
    (-0.5 * z * z).exp()
}

/// Round `value` to `places` decimal places
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Linguistic category of a slot (e.g. "leve", "moderado", "severo")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    /// Linguistic label
    pub label: String,
    /// Gaussian center (mean)
    pub center: f64,
    /// Gaussian spread (standard deviation)
    pub spread: f64,
}

impl CategoryDefinition {
    /// Create a new category definition
    pub fn new(label: impl Into<String>, center: f64, spread: f64) -> Self {
        Self {
            label: label.into(),
            center,
            spread,
        }
    }

    /// Membership degree of `x` in this category
    pub fn degree(&self, x: f64) -> f64 {
        membership(x, self.center, self.spread)
    }

    /// Whether this category can ever be matched
    pub fn is_degenerate(&self) -> bool {
        self.spread <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_peak_at_center() {
        assert_eq!(membership(5.0, 5.0, 1.5), 1.0);
    }

    #[test]
    fn test_off_center_value() {
        let expected = (-(0.5f64 * 0.5) / (2.0 * 1.2 * 1.2)).exp();
        let mu = membership(7.5, 8.0, 1.2);
        assert!((mu - expected).abs() < 1e-12);
        assert!((mu - 0.9169).abs() < 1e-3);
    }

    #[test]
    fn test_tiny_spread_keeps_exact_peak() {
        assert_eq!(membership(5.0, 5.0, 1e-200), 1.0);
        assert_eq!(membership(5.0 + 1e-6, 5.0, 1e-200), 0.0);
    }

    #[test]
    fn test_huge_operands_stay_finite() {
        let mu = membership(1e200, 0.0, 1e200);
        assert!((mu - (-0.5f64).exp()).abs() < 1e-12);
        assert_eq!(membership(f64::MAX, -f64::MAX, 1.0), 0.0);
    }

    #[test]
    fn test_degenerate_spread() {
        assert_eq!(membership(3.0, 3.0, 0.0), 0.0);
        assert_eq!(membership(3.0, 3.0, -1.0), 0.0);
        assert!(CategoryDefinition::new("x", 1.0, 0.0).is_degenerate());
    }

    #[test]
    fn test_category_degree() {
        let severe = CategoryDefinition::new("severo", 8.0, 1.2);
        assert_eq!(severe.degree(8.0), 1.0);
        assert!(severe.degree(2.0) < 1e-5);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.916_849, 4), 0.9168);
        assert_eq!(round_to(0.123_45, 3), 0.123);
        assert_eq!(round_to(1.0, 4), 1.0);
    }

    proptest! {
        #[test]
        fn prop_symmetric(x in -100.0f64..100.0, c in -50.0f64..50.0, s in 0.01f64..20.0) {
            let a = membership(x, c, s);
            let b = membership(2.0 * c - x, c, s);
            prop_assert!((a - b).abs() < 1e-12);
        }

        #[test]
        fn prop_exact_peak(c in -1e300f64..1e300, s in 1e-300f64..1e300) {
            prop_assert_eq!(membership(c, c, s), 1.0);
        }

        #[test]
        fn prop_non_positive_spread(x in -100.0f64..100.0, c in -100.0f64..100.0, s in -10.0f64..=0.0) {
            prop_assert_eq!(membership(x, c, s), 0.0);
        }

        #[test]
        fn prop_bounded(x in -1e300f64..1e300, c in -1e300f64..1e300, s in -5.0f64..1e300) {
            let mu = membership(x, c, s);
            prop_assert!((0.0..=1.0).contains(&mu));
        }

        #[test]
        fn prop_decreasing_with_distance(d1 in 0.0f64..10.0, extra in 0.0f64..10.0, s in 0.1f64..5.0) {
            let near = membership(d1, 0.0, s);
            let far = membership(d1 + extra, 0.0, s);
            prop_assert!(far <= near);
        }
    }
}
