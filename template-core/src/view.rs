//! Viewport state: zoom, pan offset, grid, snapping and guides.

use serde::{Deserialize, Serialize};

use crate::config::{is_positive, ZoomRange, DEFAULT_GRID_SIZE};
use crate::geometry::{Bounds, Position, Size};

/// Active pointer tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Select and manipulate elements.
    #[default]
    Select,
    /// Drag the viewport.
    Pan,
    /// Draw new elements.
    Draw,
}

/// Orientation of a ruler guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideOrientation {
    /// Guide at a fixed y.
    Horizontal,
    /// Guide at a fixed x.
    Vertical,
}

/// Ruler guides, page coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Guides {
    /// Y positions of horizontal guides.
    pub horizontal: Vec<f64>,
    /// X positions of vertical guides.
    pub vertical: Vec<f64>,
}

/// How the page is shown in the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    zoom: f64,
    /// Screen-space pan offset of the page origin.
    pub offset: Position,
    /// Active tool.
    pub mode: EditorMode,
    /// Draw the grid.
    pub show_grid: bool,
    /// Snap positions to the grid.
    pub snap_to_grid: bool,
    grid_size: f64,
    /// Ruler guides.
    pub guides: Guides,
    #[serde(skip)]
    range: ZoomRange,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(ZoomRange::default(), DEFAULT_GRID_SIZE)
    }
}

impl ViewState {
    /// Create a view at 100% zoom with the grid shown and snapping off.
    /// An invalid range or grid size falls back to the default.
    #[must_use]
    pub fn new(range: ZoomRange, grid_size: f64) -> Self {
        let range = if range.validate().is_ok() { range } else { ZoomRange::default() };
        let grid_size = if is_positive(grid_size) { grid_size } else { DEFAULT_GRID_SIZE };
        Self {
            zoom: range.clamp(1.0),
            offset: Position::default(),
            mode: EditorMode::Select,
            show_grid: true,
            snap_to_grid: false,
            grid_size,
            guides: Guides::default(),
            range,
        }
    }

    /// Current zoom factor.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Grid spacing in page units.
    #[must_use]
    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    /// Set the zoom factor, clamped to the configured range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = self.range.clamp(zoom);
    }

    /// Zoom in by one step.
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * self.range.step);
    }

    /// Zoom out by one step.
    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / self.range.step);
    }

    /// Back to 100% with no pan.
    pub fn reset_zoom(&mut self) {
        self.set_zoom(1.0);
        self.offset = Position::default();
    }

    /// Zoom and pan so `content` fits inside `viewport` with `padding` on
    /// every side, centered. Resets the zoom when there is no content.
    pub fn zoom_to_fit(&mut self, content: Option<Bounds>, viewport: Size, padding: f64) {
        let Some(content) = content else {
            self.reset_zoom();
            return;
        };
        let available_w = (viewport.width - 2.0 * padding).max(1.0);
        let available_h = (viewport.height - 2.0 * padding).max(1.0);
        let content_w = content.width().max(1.0);
        let content_h = content.height().max(1.0);
        self.set_zoom((available_w / content_w).min(available_h / content_h));
        self.offset = Position::new(
            (viewport.width - content_w * self.zoom) / 2.0 - content.min_x * self.zoom,
            (viewport.height - content_h * self.zoom) / 2.0 - content.min_y * self.zoom,
        );
    }

    /// Toggle grid display.
    pub fn toggle_grid(&mut self) {
        self.show_grid = !self.show_grid;
    }

    /// Toggle grid snapping.
    pub fn toggle_snap(&mut self) {
        self.snap_to_grid = !self.snap_to_grid;
    }

    /// Set the grid spacing. Non-finite or non-positive sizes are ignored.
    pub fn set_grid_size(&mut self, size: f64) {
        if is_positive(size) {
            self.grid_size = size;
        } else {
            tracing::warn!("Ignoring grid size {size}");
        }
    }

    /// Round a page position to the grid when snapping is on.
    #[must_use]
    pub fn snap(&self, position: Position) -> Position {
        let g = self.grid_size;
        if !self.snap_to_grid || !is_positive(g) {
            return position;
        }
        Position::new((position.x / g).round() * g, (position.y / g).round() * g)
    }

    /// Convert a point relative to the canvas origin on screen into page
    /// coordinates.
    #[must_use]
    pub fn screen_to_page(&self, screen: Position) -> Position {
        Position::new(
            (screen.x - self.offset.x) / self.zoom,
            (screen.y - self.offset.y) / self.zoom,
        )
    }

    /// Add a ruler guide.
    pub fn add_guide(&mut self, orientation: GuideOrientation, at: f64) {
        self.guides_mut(orientation).push(at);
    }

    /// Remove a ruler guide. Returns `false` if none was at `at`.
    pub fn remove_guide(&mut self, orientation: GuideOrientation, at: f64) -> bool {
        let guides = self.guides_mut(orientation);
        let Some(index) = guides.iter().position(|g| (g - at).abs() < f64::EPSILON) else {
            return false;
        };
        guides.remove(index);
        true
    }

    /// Remove every ruler guide.
    pub fn clear_guides(&mut self) {
        self.guides = Guides::default();
    }

    fn guides_mut(&mut self, orientation: GuideOrientation) -> &mut Vec<f64> {
        match orientation {
            GuideOrientation::Horizontal => &mut self.guides.horizontal,
            GuideOrientation::Vertical => &mut self.guides.vertical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_clamps() {
        let mut view = ViewState::default();
        view.set_zoom(100.0);
        assert!((view.zoom() - 5.0).abs() < f64::EPSILON);
        view.set_zoom(0.0);
        assert!((view.zoom() - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_steps() {
        let mut view = ViewState::default();
        view.zoom_in();
        assert!((view.zoom() - 1.2).abs() < 1e-9);
        view.zoom_out();
        assert!((view.zoom() - 1.0).abs() < 1e-9);
        for _ in 0..50 {
            view.zoom_in();
        }
        assert!((view.zoom() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_to_fit_centers_content() {
        let mut view = ViewState::default();
        let content = Bounds::from_box(Position::new(100.0, 100.0), Size::new(200.0, 100.0));
        view.zoom_to_fit(Some(content), Size::new(440.0, 440.0), 20.0);
        assert!((view.zoom() - 2.0).abs() < 1e-9);
        // Content spans 400 screen px horizontally, centered in 440.
        assert!((view.offset.x - (20.0 - 200.0)).abs() < 1e-9);

        view.zoom_to_fit(None, Size::new(440.0, 440.0), 20.0);
        assert!((view.zoom() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_new_falls_back_on_invalid_settings() {
        let inverted = ZoomRange {
            min: 5.0,
            max: 0.1,
            step: 1.2,
        };
        let mut view = ViewState::new(inverted, 0.0);
        assert!((view.zoom() - 1.0).abs() < f64::EPSILON);
        assert!((view.grid_size() - DEFAULT_GRID_SIZE).abs() < f64::EPSILON);

        view.toggle_snap();
        let snapped = view.snap(Position::new(14.0, 26.0));
        assert_eq!(snapped, Position::new(10.0, 30.0));
    }

    #[test]
    fn test_snap_only_when_enabled() {
        let mut view = ViewState::default();
        let p = Position::new(14.0, 26.0);
        assert_eq!(view.snap(p), p);
        view.toggle_snap();
        assert_eq!(view.snap(p), Position::new(10.0, 30.0));
    }

    #[test]
    fn test_screen_to_page_divides_by_zoom() {
        let mut view = ViewState::default();
        view.set_zoom(2.0);
        assert_eq!(view.screen_to_page(Position::new(300.0, 100.0)), Position::new(150.0, 50.0));
    }

    #[test]
    fn test_guides() {
        let mut view = ViewState::default();
        view.add_guide(GuideOrientation::Vertical, 50.0);
        view.add_guide(GuideOrientation::Horizontal, 80.0);
        assert!(view.remove_guide(GuideOrientation::Vertical, 50.0));
        assert!(!view.remove_guide(GuideOrientation::Vertical, 50.0));
        view.clear_guides();
        assert!(view.guides.horizontal.is_empty());
    }

    #[test]
    fn test_grid_size_rejects_invalid() {
        let mut view = ViewState::default();
        view.set_grid_size(-5.0);
        view.set_grid_size(f64::NAN);
        assert!((view.grid_size() - 10.0).abs() < f64::EPSILON);
        view.set_grid_size(25.0);
        assert!((view.grid_size() - 25.0).abs() < f64::EPSILON);
    }
}
