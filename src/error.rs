//! Error taxonomy for the planning pipeline.

use thiserror::Error;

/// Errors raised by the planning core.
///
/// The three variants map onto the pipeline's fatality rules: `Validation`
/// and `Infeasible` abort the run, `Degraded` lets the pipeline substitute a
/// neutral default and continue.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlanError {
    /// Malformed or out-of-range input, raised before any computation begins.
    #[error("validation error: {0}")]
    Validation(String),

    /// Constraints cannot be jointly satisfied (e.g. the minimum renewable
    /// fraction is unreachable within the budget). Distinct from `Validation`
    /// so callers can tell "no answer exists" from "the question was bad".
    #[error("infeasible: {0}")]
    Infeasible(String),

    /// A non-critical stage failed. The pipeline records the error with
    /// `recoverable = true` and proceeds with a documented fallback.
    #[error("degraded: {0}")]
    Degraded(String),
}

impl PlanError {
    /// Whether the pipeline may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Configuration error with a dotted field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g. `"constraints.max_budget"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
