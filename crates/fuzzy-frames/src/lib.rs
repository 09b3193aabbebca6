//! Fuzzy Frames
//!
//! Gaussian membership functions, slot fuzzification, and normalized fuzzy
//! entropy for clinical measurement slots (pain level, apparent severity,
//! observed improvement, ...).

mod entropy;
mod membership;
mod slot;

pub use entropy::{fuzzy_entropy, raw_entropy};
pub use membership::{membership, round_to, CategoryDefinition, MEMBERSHIP_PRECISION};
pub use slot::{MembershipVector, Slot};

/// Decimal places kept when an entropy value is persisted
pub const ENTROPY_PRECISION: u32 = 4;
