//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::geometry::{Position, Size};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::validation::ValidationError;

/// Grid spacing used when none is configured.
pub const DEFAULT_GRID_SIZE: f64 = 10.0;

/// Allowed zoom range and the factor used by zoom in/out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    /// Smallest zoom factor.
    pub min: f64,
    /// Largest zoom factor.
    pub max: f64,
    /// Multiplier applied by one zoom step.
    pub step: f64,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 5.0,
            step: 1.2,
        }
    }
}

impl ZoomRange {
    /// Clamp a zoom factor into range. Non-finite input maps to 1.
    ///
    /// Never panics: an invalid range clamps against the default one.
    #[must_use]
    pub fn clamp(&self, zoom: f64) -> f64 {
        let range = if self.validate().is_ok() { *self } else { Self::default() };
        let zoom = if zoom.is_finite() { zoom } else { 1.0 };
        zoom.clamp(range.min, range.max)
    }

    /// Check that the bounds are finite, positive and ordered, and that a
    /// step actually zooms.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidZoomRange`] otherwise.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let finite = self.min.is_finite() && self.max.is_finite() && self.step.is_finite();
        if finite && self.min > 0.0 && self.min <= self.max && self.step > 1.0 {
            Ok(())
        } else {
            Err(ValidationError::InvalidZoomRange {
                min: self.min,
                max: self.max,
                step: self.step,
            })
        }
    }
}

/// Tunables of an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of undoable actions.
    pub history_capacity: usize,
    /// Zoom limits.
    pub zoom: ZoomRange,
    /// Shift applied to duplicated elements.
    pub duplicate_offset: Position,
    /// Initial grid spacing.
    pub grid_size: f64,
    /// Size of elements created by drag and drop.
    pub default_element_size: Size,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            zoom: ZoomRange::default(),
            duplicate_offset: Position::new(20.0, 20.0),
            grid_size: DEFAULT_GRID_SIZE,
            default_element_size: Size::new(200.0, 100.0),
        }
    }
}

/// Finite and strictly positive.
pub(crate) fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl EditorConfig {
    /// Check every tunable.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: an invalid zoom range, a zero
    /// history capacity, a non-positive grid or element size, or a
    /// non-finite duplicate offset.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.zoom.validate()?;
        if self.history_capacity == 0 {
            return Err(ValidationError::NotPositive("historyCapacity".to_string()));
        }
        if !is_positive(self.grid_size) {
            return Err(ValidationError::NotPositive("gridSize".to_string()));
        }
        let size = self.default_element_size;
        if !(is_positive(size.width) && is_positive(size.height)) {
            return Err(ValidationError::NotPositive("defaultElementSize".to_string()));
        }
        if !self.duplicate_offset.is_finite() {
            return Err(ValidationError::NotFinite("duplicateOffset".to_string()));
        }
        Ok(())
    }

    /// Replace every invalid tunable with its default, logging each one.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if let Err(e) = self.zoom.validate() {
            tracing::warn!("Using default zoom range: {e}");
            self.zoom = defaults.zoom;
        }
        if self.history_capacity == 0 {
            tracing::warn!("Using default history capacity instead of 0");
            self.history_capacity = defaults.history_capacity;
        }
        if !is_positive(self.grid_size) {
            tracing::warn!("Using default grid size instead of {}", self.grid_size);
            self.grid_size = defaults.grid_size;
        }
        let size = self.default_element_size;
        if !(is_positive(size.width) && is_positive(size.height)) {
            tracing::warn!("Using default element size instead of {size:?}");
            self.default_element_size = defaults.default_element_size;
        }
        if !self.duplicate_offset.is_finite() {
            tracing::warn!("Using default duplicate offset");
            self.duplicate_offset = defaults.duplicate_offset;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_range_clamp() {
        let range = ZoomRange::default();
        assert!((range.clamp(10.0) - 5.0).abs() < f64::EPSILON);
        assert!((range.clamp(0.01) - 0.1).abs() < f64::EPSILON);
        assert!((range.clamp(f64::NAN) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_inverted_zoom_range_is_rejected() {
        let range = ZoomRange {
            min: 5.0,
            max: 0.1,
            step: 1.2,
        };
        assert!(matches!(range.validate(), Err(ValidationError::InvalidZoomRange { .. })));
        assert!((range.clamp(12.0) - 5.0).abs() < f64::EPSILON);

        let nan = ZoomRange {
            min: f64::NAN,
            ..ZoomRange::default()
        };
        assert!(nan.validate().is_err());
        assert!((nan.clamp(0.5) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_and_sanitize_config() {
        assert!(EditorConfig::default().validate().is_ok());

        let config: EditorConfig =
            serde_json::from_str(r#"{"zoom":{"min":5.0,"max":0.1,"step":1.2},"gridSize":0.0}"#)
                .expect("parse");
        assert!(config.validate().is_err());

        let fixed = config.sanitized();
        assert!(fixed.validate().is_ok());
        assert_eq!(fixed.zoom, ZoomRange::default());
        assert!((fixed.grid_size - DEFAULT_GRID_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_history_capacity_is_invalid() {
        let config = EditorConfig {
            history_capacity: 0,
            ..EditorConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::NotPositive("historyCapacity".to_string()))
        );
        assert_eq!(config.sanitized().history_capacity, DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn test_config_partial_json() {
        let config: EditorConfig =
            serde_json::from_str(r#"{"historyCapacity": 5}"#).expect("parse");
        assert_eq!(config.history_capacity, 5);
        assert!((config.grid_size - 10.0).abs() < f64::EPSILON);
    }
}
