//! Input validation for numbers and identifiers typed by users.
//!
//! Property panels and imported documents hand numbers over as text. Anything
//! that does not parse to a finite number is rejected here, before it can
//! reach a document.

use thiserror::Error;

/// Maximum length for element IDs.
pub const MAX_ELEMENT_ID_LEN: usize = 64;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Input is not a number at all.
    #[error("{field}: not a number: {input:?}")]
    NotANumber {
        /// Field being parsed.
        field: String,
        /// Raw input.
        input: String,
    },
    /// Input parsed to NaN or infinity.
    #[error("{0}: value must be finite")]
    NotFinite(String),
    /// A size or count that must be strictly positive is not.
    #[error("{0}: value must be positive")]
    NotPositive(String),
    /// Zoom bounds are not finite, not positive, or out of order, or the
    /// zoom step does not exceed 1.
    #[error("invalid zoom range: min {min}, max {max}, step {step}")]
    InvalidZoomRange {
        /// Smallest zoom factor.
        min: f64,
        /// Largest zoom factor.
        max: f64,
        /// Zoom step factor.
        step: f64,
    },
    /// Element ID exceeds maximum length.
    #[error("element_id too long (max {MAX_ELEMENT_ID_LEN} chars)")]
    ElementIdTooLong,
    /// Element ID is empty or contains invalid characters.
    #[error("element_id contains invalid characters")]
    ElementIdInvalidChars,
}

/// Parse a user-typed number for `field`.
///
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`ValidationError::NotANumber`] for unparseable input and
/// [`ValidationError::NotFinite`] for `NaN` or `inf`.
pub fn parse_number(field: &str, input: &str) -> Result<f64, ValidationError> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber {
            field: field.to_string(),
            input: input.to_string(),
        })?;
    if !value.is_finite() {
        return Err(ValidationError::NotFinite(field.to_string()));
    }
    Ok(value)
}

/// Parse a user-typed number and clamp it into `[min, max]`.
///
/// # Errors
///
/// Same as [`parse_number`].
pub fn parse_clamped(field: &str, input: &str, min: f64, max: f64) -> Result<f64, ValidationError> {
    parse_number(field, input).map(|v| v.clamp(min, max))
}

/// Ids are opaque text, but whitespace and control characters would not
/// survive an XML attribute round-trip.
fn is_valid_id_char(c: char) -> bool {
    !c.is_whitespace() && !c.is_control()
}

/// Validate an element ID.
///
/// Every id held by a document passes this check, so every exported
/// document imports again.
///
/// # Errors
///
/// Returns [`ValidationError::ElementIdTooLong`] if the ID exceeds 64 characters.
/// Returns [`ValidationError::ElementIdInvalidChars`] if the ID is empty or
/// contains whitespace or control characters.
pub fn validate_element_id(id: &str) -> Result<(), ValidationError> {
    if id.chars().count() > MAX_ELEMENT_ID_LEN {
        return Err(ValidationError::ElementIdTooLong);
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(ValidationError::ElementIdInvalidChars);
    }
    Ok(())
}
