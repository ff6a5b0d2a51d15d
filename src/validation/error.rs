//! Structured argument validation errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One schema violation, addressed by JSON Pointer into the arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// JSON Pointer to the offending value (`""` for the root).
    pub path: String,
    /// Human-readable violation message.
    pub message: String,
    /// Schema keyword that rejected the value (`required`, `type`, ...).
    pub keyword: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        message: impl Into<String>,
        keyword: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            keyword: keyword.into(),
        }
    }
}

/// Errors returned by [`super::SchemaValidator`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The tool declares no input schema, so nothing can be accepted.
    #[error("tool declares no input schema")]
    MissingSchema,

    /// The declared schema could not be compiled.
    #[error("input schema failed to compile: {reason}")]
    SchemaInvalid {
        /// Compiler diagnostic.
        reason: String,
    },

    /// The arguments violate the schema; every violation is listed.
    #[error("arguments failed schema validation with {} error(s)", .0.len())]
    Violations(Vec<FieldError>),
}

impl ValidationError {
    /// Returns the field errors describing this failure.
    ///
    /// A missing schema is reported as a single root-level `schema` error so
    /// callers see the same shape for every argument rejection.
    #[must_use]
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Self::MissingSchema => vec![FieldError::new(
                "",
                "tool declares no input schema",
                "schema",
            )],
            Self::SchemaInvalid { reason } => vec![FieldError::new("", reason.clone(), "schema")],
            Self::Violations(errors) => errors.clone(),
        }
    }
}
