//! Validation errors raised while normalizing search payloads.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Category of a validation failure, reported to callers alongside the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// A field required by the selected variant was absent.
    Missing,
    /// The field held a JSON type that cannot be coerced.
    InvalidType,
    /// The field had the right type but an unusable value.
    InvalidValue,
    /// The value fell outside its permitted bounds.
    OutOfRange,
    /// A lower bound exceeded its matching upper bound.
    InvertedRange,
}

impl ValidationErrorKind {
    /// Wire name of the kind, as used in error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::InvalidType => "invalid_type",
            Self::InvalidValue => "invalid_value",
            Self::OutOfRange => "out_of_range",
            Self::InvertedRange => "inverted_range",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed or missing search input, always naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Payload key that failed validation.
    pub field: String,
    /// What went wrong with it.
    pub kind: ValidationErrorKind,
    /// Human readable description, safe to echo to callers.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, kind: ValidationErrorKind, message: String) -> Self {
        Self {
            field: field.to_string(),
            kind,
            message,
        }
    }

    /// Required field absent from the payload.
    pub fn missing(field: &str) -> Self {
        Self::new(
            field,
            ValidationErrorKind::Missing,
            format!("missing required field `{field}`"),
        )
    }

    /// Field present with a JSON type that cannot be coerced to `expected`.
    pub fn invalid_type(field: &str, expected: &str) -> Self {
        Self::new(
            field,
            ValidationErrorKind::InvalidType,
            format!("field `{field}` must be {expected}"),
        )
    }

    /// Field present with an unusable value.
    pub fn invalid_value(field: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            field,
            ValidationErrorKind::InvalidValue,
            format!("field `{field}` is invalid: {detail}"),
        )
    }

    /// Field value outside its permitted bounds.
    pub fn out_of_range(field: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            field,
            ValidationErrorKind::OutOfRange,
            format!("field `{field}` is out of range: {detail}"),
        )
    }

    /// Lower bound `field` is greater than `upper`.
    pub fn inverted_range(field: &str, upper: &str) -> Self {
        Self::new(
            field,
            ValidationErrorKind::InvertedRange,
            format!("field `{field}` must not exceed `{upper}`"),
        )
    }
}
