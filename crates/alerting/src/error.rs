//! Alert Error Types

use thiserror::Error;

/// Errors raised by alert stores
#[derive(Debug, Error)]
pub enum AlertError {
    /// No alert exists for the given code
    #[error("Alert not found: {0}")]
    NotFound(String),

    /// Backing store failure (message kept verbatim)
    #[error("Alert store error: {0}")]
    Storage(String),

    /// Unknown severity label
    #[error("Invalid severity: {0}")]
    InvalidSeverity(String),
}
