//! Error types for the conversion pipeline
//!
//! The pipeline never recovers from an error locally: the first failure of a
//! batch is returned to the caller as one of these values.

use crate::printer::PrinterError;

/// Top-level error returned by the pipeline driver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resource's kind is not one of the seven convertible kinds.
    /// Carries the kind exactly as it was declared.
    #[error("conversion for the resource type '{0}' is not supported")]
    UnsupportedKind(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Printer(#[from] PrinterError),
}

/// A conversion stage rejected the shape of a resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("{kind}: required field '{field}' is missing")]
    MissingField { kind: &'static str, field: String },

    #[error("{kind}: field '{field}' is invalid: {reason}")]
    InvalidField {
        kind: &'static str,
        field: String,
        reason: String,
    },

    #[error("{kind} converter cannot handle {found}")]
    UnexpectedResource { kind: &'static str, found: String },
}

impl ConversionError {
    pub fn missing(kind: &'static str, field: impl Into<String>) -> Self {
        ConversionError::MissingField {
            kind,
            field: field.into(),
        }
    }

    pub fn invalid(kind: &'static str, field: impl Into<String>, reason: impl ToString) -> Self {
        ConversionError::InvalidField {
            kind,
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unexpected(kind: &'static str, found: impl Into<String>) -> Self {
        ConversionError::UnexpectedResource {
            kind,
            found: found.into(),
        }
    }

    /// Name of the kind whose converter raised the error.
    pub fn kind(&self) -> &'static str {
        match self {
            ConversionError::MissingField { kind, .. }
            | ConversionError::InvalidField { kind, .. }
            | ConversionError::UnexpectedResource { kind, .. } => kind,
        }
    }

    /// The offending field, when the error is about a single field.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConversionError::MissingField { field, .. }
            | ConversionError::InvalidField { field, .. } => Some(field),
            ConversionError::UnexpectedResource { .. } => None,
        }
    }
}

/// A decoded document could not be turned into a typed v1 resource.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("resource has no 'kind' field")]
    MissingKind,

    #[error("resource of kind '{kind}' is malformed: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
