//! Normalized Fuzzy Entropy
//!
//! Memberships are treated as independent possibility degrees, so the input
//! does not have to sum to one.

/// Raw entropy `H = Σ -m·ln(m)` over the strictly positive degrees
pub fn raw_entropy(memberships: &[f64]) -> f64 {
    memberships
        .iter()
        .filter(|&&m| m > 0.0)
        .map(|&m| -m * m.ln())
        .sum()
}

/// Entropy normalized by `ln(n)` and kept within `[0, 1]`.
///
/// Fewer than two categories carry no uncertainty and yield `0.0`.
pub fn fuzzy_entropy(memberships: &[f64]) -> f64 {
    let n = memberships.len();
    if n < 2 {
        return 0.0;
    }

    // Independent degrees can push H slightly above ln(n) (each term peaks
    // at 1/e), so the normalized value is clamped.
    (raw_entropy(memberships) / (n as f64).ln()).clamp(0.0, 1.0)
}
