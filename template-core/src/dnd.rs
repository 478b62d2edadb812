//! Drag-and-drop of toolbox items onto the page.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::element::{CanvasElement, ElementId, ElementKind};
use crate::geometry::{Position, Size};
use crate::session::EditorSession;
use crate::TemplateResult;

/// The JSON object carried by a drag transfer, `{type, label, defaultProps}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    /// Kind of element to create.
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Name given to the new element.
    pub label: String,
    /// Property overrides on top of the kind defaults.
    #[serde(default)]
    pub default_props: Map<String, Value>,
}

impl DragPayload {
    /// Payload for a toolbox entry with no overrides.
    #[must_use]
    pub fn for_kind(kind: ElementKind) -> Self {
        Self {
            kind,
            label: kind.label().to_string(),
            default_props: Map::new(),
        }
    }

    /// Every toolbox entry, in toolbox order.
    #[must_use]
    pub fn toolbox() -> Vec<Self> {
        ElementKind::ALL.into_iter().map(Self::for_kind).collect()
    }

    /// Parse a payload from drag transfer data.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TemplateError::Serialization`] for malformed JSON or
    /// an unknown kind.
    pub fn from_json(json: &str) -> TemplateResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize for a drag transfer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> TemplateResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Build the element this payload creates at a page position.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TemplateError::InvalidProperties`] if `defaultProps`
    /// carries a value of the wrong shape.
    pub fn to_element(&self, position: Position, size: Size) -> TemplateResult<CanvasElement> {
        CanvasElement::new(self.kind, position)
            .with_size(size)
            .with_name(self.label.clone())
            .with_overrides(&self.default_props)
    }
}

impl EditorSession {
    /// Create an element from a dropped payload and add it.
    ///
    /// `screen` is the drop point relative to the canvas origin on screen;
    /// it is converted to page coordinates with the current zoom and pan,
    /// then snapped to the grid when snapping is on.
    ///
    /// # Errors
    ///
    /// See [`DragPayload::to_element`]. Nothing is added on error.
    pub fn drop_payload(
        &mut self,
        payload: &DragPayload,
        screen: Position,
    ) -> TemplateResult<ElementId> {
        let page = self.view().snap(self.view().screen_to_page(screen));
        let element = payload.to_element(page, self.config().default_element_size)?;
        tracing::debug!("Dropped {} at ({}, {})", payload.kind, page.x, page.y);
        Ok(self.add_element(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::VariantProperties;

    #[test]
    fn test_payload_from_json() {
        let payload = DragPayload::from_json(
            r##"{
                "type": "title",
                "label": "Heading",
                "defaultProps": {"content": "Hi", "color": "#ff0000"},
                "icon": "T"
            }"##,
        )
        .expect("parse");
        assert_eq!(payload.kind, ElementKind::Title);
        assert_eq!(payload.default_props.len(), 2);
        assert!(DragPayload::from_json(r#"{"type":"hexagon","label":"?"}"#).is_err());
    }

    #[test]
    fn test_drop_divides_by_zoom() {
        let mut session = EditorSession::new();
        session.set_zoom(2.0);
        let payload = DragPayload::for_kind(ElementKind::Rectangle);
        let id = session
            .drop_payload(&payload, Position::new(300.0, 120.0))
            .expect("drop");
        let element = session.get_element(&id).expect("added");
        assert_eq!(element.position(), Position::new(150.0, 60.0));
        assert_eq!(element.size(), Size::new(200.0, 100.0));
        assert_eq!(element.base().name, "Rectangle");
        assert_eq!(session.selection(), [id]);
    }

    #[test]
    fn test_drop_snaps_when_enabled() {
        let mut session = EditorSession::new();
        session.toggle_snap();
        let payload = DragPayload::for_kind(ElementKind::Text);
        let id = session
            .drop_payload(&payload, Position::new(123.0, 47.0))
            .expect("drop");
        assert_eq!(
            session.get_element(&id).map(CanvasElement::position),
            Some(Position::new(120.0, 50.0))
        );
    }

    #[test]
    fn test_drop_applies_default_props() {
        let mut session = EditorSession::new();
        let payload = DragPayload::from_json(
            r#"{
                "type": "text",
                "label": "Greeting",
                "defaultProps": {"content": "Hello {{name}}", "fontSize": 22}
            }"#,
        )
        .expect("parse");
        let id = session.drop_payload(&payload, Position::new(0.0, 0.0)).expect("drop");
        let element = session.get_element(&id).expect("added");
        assert_eq!(element.base().name, "Greeting");
        let VariantProperties::Text(text) = element.properties().variant() else {
            panic!("text variant expected");
        };
        assert_eq!(text.content, "Hello {{name}}");
        assert!((text.font_size - 22.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drop_bad_props_adds_nothing() {
        let mut session = EditorSession::new();
        let json = r#"{"type":"text","label":"x","defaultProps":{"fontSize":"big"}}"#;
        let payload = DragPayload::from_json(json).expect("parse");
        assert!(session.drop_payload(&payload, Position::new(0.0, 0.0)).is_err());
        assert!(session.document().is_empty());
    }

    #[test]
    fn test_toolbox_covers_every_kind() {
        let toolbox = DragPayload::toolbox();
        assert_eq!(toolbox.len(), ElementKind::ALL.len());
        let json = toolbox[0].to_json().expect("serialize");
        assert!(json.contains(r#""defaultProps":{}"#));
    }
}
