//! Error types for editor operations.

use thiserror::Error;

use crate::element::{ElementKind, PropertyFamily};
use crate::validation::ValidationError;

/// Result type for editor operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur in editor operations.
///
/// Referencing a missing element is not an error: mutators report it through
/// their return value and leave the document untouched.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A property variant does not belong to the element's kind.
    #[error("{kind} elements carry {expected} properties, got {found}")]
    FamilyMismatch {
        /// Kind of the element being modified.
        kind: ElementKind,
        /// Family required by the kind.
        expected: PropertyFamily,
        /// Family that was supplied.
        found: PropertyFamily,
    },

    /// A numeric or identifier input failed validation.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Property overrides could not be merged into a typed property set.
    #[error("Invalid properties: {0}")]
    InvalidProperties(String),

    /// Unknown element kind tag.
    #[error("Unknown element kind: {0}")]
    UnknownKind(String),

    /// Malformed XML document.
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
