//! The ordered element collection of a template.

use serde::{Deserialize, Serialize};

use crate::element::{CanvasElement, ElementId};
use crate::geometry::{Bounds, Position};
use crate::validation::validate_element_id;
use crate::TemplateResult;

/// The element collection of one template, in insertion order.
///
/// Order is significant for export and for breaking z-index ties when
/// painting. Identifiers are unique within a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    elements: Vec<CanvasElement>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from elements, dropping later duplicates of an id.
    /// Elements whose id fails [`validate_element_id`] get a fresh one.
    #[must_use]
    pub fn from_elements(elements: impl IntoIterator<Item = CanvasElement>) -> Self {
        let mut document = Self::new();
        for element in elements {
            let element = if let Err(e) = validate_element_id(element.id().as_str()) {
                let renamed = element.duplicate(Position::default());
                tracing::warn!(
                    "Renaming element {:?} to {}: {e}",
                    element.id().as_str(),
                    renamed.id()
                );
                renamed
            } else {
                element
            };
            if document.contains(element.id()) {
                tracing::warn!("Dropping duplicate element id {}", element.id());
                continue;
            }
            document.elements.push(element);
        }
        document
    }

    /// Append an element. Returns `false` if the id is already taken.
    pub fn push(&mut self, element: CanvasElement) -> bool {
        if self.contains(element.id()) {
            return false;
        }
        self.elements.push(element);
        true
    }

    /// Insert at `index`, clamped to the current length.
    /// Returns `false` if the id is already taken.
    pub fn insert(&mut self, index: usize, element: CanvasElement) -> bool {
        if self.contains(element.id()) {
            return false;
        }
        let index = index.min(self.elements.len());
        self.elements.insert(index, element);
        true
    }

    /// Remove an element, returning it with the index it occupied.
    pub fn remove(&mut self, id: &ElementId) -> Option<(usize, CanvasElement)> {
        let index = self.index_of(id)?;
        Some((index, self.elements.remove(index)))
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&CanvasElement> {
        self.elements.iter().find(|e| e.id() == id)
    }

    /// Get a mutable reference to an element by ID.
    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut CanvasElement> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    /// Position of an element in the collection.
    #[must_use]
    pub fn index_of(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id() == id)
    }

    /// Whether an element with this id exists.
    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.index_of(id).is_some()
    }

    /// All elements in order.
    #[must_use]
    pub fn elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    /// Iterate over elements in order.
    pub fn iter(&self) -> impl Iterator<Item = &CanvasElement> {
        self.elements.iter()
    }

    /// Identifiers of all elements, in order.
    #[must_use]
    pub fn ids(&self) -> Vec<ElementId> {
        self.elements.iter().map(|e| e.id().clone()).collect()
    }

    /// Get the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the document is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Highest z-index, or `None` for an empty document.
    #[must_use]
    pub fn max_z_index(&self) -> Option<i32> {
        self.elements.iter().map(CanvasElement::z_index).max()
    }

    /// Lowest z-index, or `None` for an empty document.
    #[must_use]
    pub fn min_z_index(&self) -> Option<i32> {
        self.elements.iter().map(CanvasElement::z_index).min()
    }

    /// Union of all element boxes.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.elements
            .iter()
            .map(|e| e.properties().bounds())
            .reduce(Bounds::union)
    }

    /// Topmost visible element containing a page point.
    ///
    /// Ties on z-index go to the element later in the collection.
    #[must_use]
    pub fn element_at(&self, point: Position) -> Option<&CanvasElement> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.base().visible && e.contains_point(point))
            .max_by_key(|(index, e)| (e.z_index(), *index))
            .map(|(_, e)| e)
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> TemplateResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> TemplateResult<Self> {
        let elements: Vec<CanvasElement> = serde_json::from_str(json)?;
        Ok(Self::from_elements(elements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    fn rect(id: &str, x: f64, z: i32) -> CanvasElement {
        CanvasElement::with_id(id.into(), ElementKind::Rectangle, Position::new(x, 0.0))
            .with_z_index(z)
    }

    #[test]
    fn test_document_push_remove() {
        let mut doc = Document::new();
        assert!(doc.push(rect("a", 0.0, 1)));
        assert!(doc.push(rect("b", 10.0, 1)));
        assert!(!doc.push(rect("a", 20.0, 1)));
        assert_eq!(doc.len(), 2);

        let (index, removed) = doc.remove(&"a".into()).expect("present");
        assert_eq!(index, 0);
        assert_eq!(removed.id().as_str(), "a");
        assert!(doc.remove(&"a".into()).is_none());
    }

    #[test]
    fn test_insert_restores_order() {
        let mut doc =
            Document::from_elements([rect("a", 0.0, 1), rect("b", 0.0, 1), rect("c", 0.0, 1)]);
        let (index, b) = doc.remove(&"b".into()).expect("present");
        assert!(doc.insert(index, b));
        let ids: Vec<_> = doc.ids().into_iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_z_index_extremes() {
        let doc = Document::from_elements([rect("a", 0.0, 3), rect("b", 0.0, -2)]);
        assert_eq!(doc.max_z_index(), Some(3));
        assert_eq!(doc.min_z_index(), Some(-2));
        assert_eq!(Document::new().max_z_index(), None);
    }

    #[test]
    fn test_element_at_prefers_top() {
        let doc = Document::from_elements([
            rect("low", 0.0, 1),
            rect("high", 50.0, 5),
            rect("tie", 50.0, 5),
        ]);
        let hit = doc.element_at(Position::new(60.0, 10.0)).expect("hit");
        assert_eq!(hit.id().as_str(), "tie");
        assert!(doc.element_at(Position::new(-10.0, -10.0)).is_none());
    }

    #[test]
    fn test_from_elements_renames_invalid_ids() {
        let doc = Document::from_elements([rect("hdr.1", 0.0, 1), rect("has space", 0.0, 1)]);
        let ids = doc.ids();
        assert_eq!(ids[0].as_str(), "hdr.1");
        assert_ne!(ids[1].as_str(), "has space");
        assert!(validate_element_id(ids[1].as_str()).is_ok());
    }

    #[test]
    fn test_document_json_roundtrip() {
        let doc = Document::from_elements([rect("a", 1.0, 1), rect("b", 2.0, 2)]);
        let json = doc.to_json().expect("serialize");
        let back = Document::from_json(&json).expect("deserialize");
        assert_eq!(back, doc);
    }
}
