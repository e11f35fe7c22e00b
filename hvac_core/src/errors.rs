//! # Error Types
//!
//! Structured error types for hvac_core. Errors carry enough context for a
//! caller (human or program) to understand which input or which reference
//! table caused the failure.
//!
//! Hard failures are [`CalcError`] values. Soft conditions that must not
//! stop the pipeline (an iterative solver running out of iterations, a
//! documented default standing in for a missing field, a selection that is
//! acceptable but outside a recommended ratio) are advisory records embedded
//! in successful results: [`ConvergenceWarning`], [`DefaultApplied`] and
//! [`crate::selection::SelectionWarning`].
//!
//! ## Example
//!
//! ```rust
//! use hvac_core::errors::{CalcError, CalcResult};
//!
//! fn validate_area(area_sqft: f64) -> CalcResult<()> {
//!     if area_sqft < 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "area_sqft",
//!             area_sqft.to_string(),
//!             "Area cannot be negative",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_area(-1.0).unwrap_err().is_input_error());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for hvac_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid, out of range, or contradicts another input
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field (or enough independent fields) is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Key not found in a reference table (city, construction, accessory...)
    #[error("Reference not found in '{table}': {key}")]
    ReferenceNotFound { table: String, key: String },

    /// No catalog equipment combination satisfies the requirement
    #[error("Sizing impossible during {stage}: {reason}")]
    SizingImpossible { stage: String, reason: String },

    /// Reference data or settings document could not be parsed or is inconsistent
    #[error("Reference data error in {source_name}: {reason}")]
    ReferenceData { source_name: String, reason: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create a ReferenceNotFound error
    pub fn reference_not_found(table: impl Into<String>, key: impl Into<String>) -> Self {
        CalcError::ReferenceNotFound {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Create a SizingImpossible error
    pub fn sizing_impossible(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::SizingImpossible {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Create a ReferenceData error
    pub fn reference_data(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::ReferenceData {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// True for the input-error class: missing or contradictory inputs.
    ///
    /// These fail fast and are never retried internally.
    pub fn is_input_error(&self) -> bool {
        matches!(self, CalcError::InvalidInput { .. } | CalcError::MissingField { .. })
    }

    /// True when no equipment combination could satisfy a requirement
    pub fn is_sizing_impossible(&self) -> bool {
        matches!(self, CalcError::SizingImpossible { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::ReferenceNotFound { .. } => "REFERENCE_NOT_FOUND",
            CalcError::SizingImpossible { .. } => "SIZING_IMPOSSIBLE",
            CalcError::ReferenceData { .. } => "REFERENCE_DATA_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: err.to_string(),
        }
    }
}

/// An iterative solver stopped at its iteration cap without reaching tolerance.
///
/// The value it returned is the best estimate found; the pipeline continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceWarning {
    /// Which inversion was being solved (e.g. "relative_humidity_from_wet_bulb")
    pub solver: String,
    /// Iterations performed
    pub iterations: u32,
    /// Residual of the best estimate, in the solver's own units
    pub residual: f64,
    /// Best estimate returned
    pub estimate: f64,
}

/// A documented default stood in for a missing optional input.
///
/// Downstream layers surface these so the user can see the assumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultApplied {
    /// Input field that was missing (e.g. "internal.lighting")
    pub field: String,
    /// Value used in its place
    pub value: f64,
    /// Unit or short description of the value (e.g. "W/sqft")
    pub note: String,
}

impl DefaultApplied {
    pub fn new(field: impl Into<String>, value: f64, note: impl Into<String>) -> Self {
        DefaultApplied {
            field: field.into(),
            value,
            note: note.into(),
        }
    }
}
