//! Multi-element alignment.
//!
//! Pure functions: they compute target positions and never touch a document.

use serde::{Deserialize, Serialize};

use crate::element::{CanvasElement, ElementId};
use crate::geometry::Position;

/// Alignment modes for multiple elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left edges to the leftmost left edge.
    Left,
    /// Right edges to the rightmost right edge.
    Right,
    /// Top edges to the topmost top edge.
    Top,
    /// Bottom edges to the lowest bottom edge.
    Bottom,
    /// Horizontal centers to the mean horizontal center.
    Center,
    /// Vertical centers to the mean vertical center.
    Middle,
}

/// Compute aligned positions for `elements`.
///
/// Returns one `(id, new_position)` per element, in input order. Empty input
/// yields an empty result. Center and middle collapse every center onto the
/// mean of the centers; they do not distribute.
#[must_use]
pub fn align(elements: &[&CanvasElement], alignment: Alignment) -> Vec<(ElementId, Position)> {
    if elements.is_empty() {
        return Vec::new();
    }

    let boxes: Vec<(Position, f64, f64)> = elements
        .iter()
        .map(|e| (e.position(), e.size().width, e.size().height))
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let count = boxes.len() as f64;

    let targets: Vec<Position> = match alignment {
        Alignment::Left => {
            let min_x = fold_min(boxes.iter().map(|(p, _, _)| p.x));
            boxes.iter().map(|(p, _, _)| Position::new(min_x, p.y)).collect()
        }
        Alignment::Right => {
            let max_right = fold_max(boxes.iter().map(|(p, w, _)| p.x + w));
            boxes
                .iter()
                .map(|(p, w, _)| Position::new(max_right - w, p.y))
                .collect()
        }
        Alignment::Top => {
            let min_y = fold_min(boxes.iter().map(|(p, _, _)| p.y));
            boxes.iter().map(|(p, _, _)| Position::new(p.x, min_y)).collect()
        }
        Alignment::Bottom => {
            let max_bottom = fold_max(boxes.iter().map(|(p, _, h)| p.y + h));
            boxes
                .iter()
                .map(|(p, _, h)| Position::new(p.x, max_bottom - h))
                .collect()
        }
        Alignment::Center => {
            let mean = boxes.iter().map(|(p, w, _)| p.x + w / 2.0).sum::<f64>() / count;
            boxes
                .iter()
                .map(|(p, w, _)| Position::new(mean - w / 2.0, p.y))
                .collect()
        }
        Alignment::Middle => {
            let mean = boxes.iter().map(|(p, _, h)| p.y + h / 2.0).sum::<f64>() / count;
            boxes
                .iter()
                .map(|(p, _, h)| Position::new(p.x, mean - h / 2.0))
                .collect()
        }
    };

    elements
        .iter()
        .map(|e| e.id().clone())
        .zip(targets)
        .collect()
}

fn fold_min(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::INFINITY, f64::min)
}

fn fold_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}
