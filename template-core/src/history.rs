//! Undo/redo history of reversible document actions.
//!
//! Every action captures complete before/after state for the elements it
//! touches, so reverting or re-applying it never depends on what happened
//! in between. The log is linear: recording a new action drops everything
//! that was undone.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Document;
use crate::element::{CanvasElement, ElementId, ElementProperties};
use crate::template::current_timestamp_ms;

/// Default maximum number of undoable actions.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// What kind of edit an action represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Elements were added.
    Add,
    /// Element properties changed.
    Update,
    /// Elements were removed.
    Delete,
    /// Elements were translated.
    Move,
    /// An element was resized.
    Resize,
    /// An element was rotated.
    Rotate,
    /// Elements were grouped. Never recorded.
    Group,
    /// A group was dissolved. Never recorded.
    Ungroup,
}

/// An element together with the collection index it occupied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedElement {
    /// Index in the document when the snapshot was taken.
    pub index: usize,
    /// The element.
    pub element: CanvasElement,
}

/// State captured on one side of an action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum Snapshot {
    /// The elements did not exist.
    #[default]
    Empty,
    /// Whole elements, ordered by ascending index.
    Elements(Vec<IndexedElement>),
    /// Complete property sets, one per affected element.
    Properties(Vec<ElementProperties>),
}

impl Snapshot {
    /// Number of elements captured.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Elements(entries) => entries.len(),
            Self::Properties(entries) => entries.len(),
        }
    }

    /// Whether nothing is captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Captured element for `id`, if this snapshot holds whole elements.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&CanvasElement> {
        match self {
            Self::Elements(entries) => entries
                .iter()
                .map(|entry| &entry.element)
                .find(|e| e.id() == id),
            _ => None,
        }
    }

    /// Captured properties for `id`, whichever form the snapshot takes.
    #[must_use]
    pub fn properties(&self, id: &ElementId) -> Option<&ElementProperties> {
        match self {
            Self::Empty => None,
            Self::Elements(_) => self.element(id).map(CanvasElement::properties),
            Self::Properties(entries) => entries.iter().find(|p| p.id() == id),
        }
    }
}

/// A recorded, reversible mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryAction {
    /// Unique action identifier.
    pub id: Uuid,
    /// Kind of edit.
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Elements touched, in document order.
    pub element_ids: Vec<ElementId>,
    /// State before the edit.
    pub before: Snapshot,
    /// State after the edit.
    pub after: Snapshot,
}

impl HistoryAction {
    /// Create an action stamped with the current time.
    #[must_use]
    pub fn new(
        kind: ActionKind,
        element_ids: Vec<ElementId>,
        before: Snapshot,
        after: Snapshot,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: current_timestamp_ms(),
            element_ids,
            before,
            after,
        }
    }

    /// Put the document back into the state before this action.
    pub fn revert(&self, document: &mut Document) {
        match self.kind {
            ActionKind::Add => remove_all(document, &self.element_ids),
            ActionKind::Delete => insert_all(document, &self.before),
            ActionKind::Update | ActionKind::Move | ActionKind::Resize | ActionKind::Rotate => {
                restore_properties(document, &self.before);
            }
            ActionKind::Group | ActionKind::Ungroup => {
                tracing::warn!(
                    "Ignoring {:?} action {}: grouping is unsupported",
                    self.kind,
                    self.id
                );
            }
        }
    }

    /// Re-apply this action after it was reverted.
    pub fn reapply(&self, document: &mut Document) {
        match self.kind {
            ActionKind::Add => insert_all(document, &self.after),
            ActionKind::Delete => remove_all(document, &self.element_ids),
            ActionKind::Update | ActionKind::Move | ActionKind::Resize | ActionKind::Rotate => {
                restore_properties(document, &self.after);
            }
            ActionKind::Group | ActionKind::Ungroup => {
                tracing::warn!(
                    "Ignoring {:?} action {}: grouping is unsupported",
                    self.kind,
                    self.id
                );
            }
        }
    }
}

fn remove_all(document: &mut Document, ids: &[ElementId]) {
    for id in ids {
        document.remove(id);
    }
}

fn insert_all(document: &mut Document, snapshot: &Snapshot) {
    if let Snapshot::Elements(entries) = snapshot {
        // Ascending order: earlier entries are in place before later indices are used.
        for entry in entries {
            if !document.insert(entry.index, entry.element.clone()) {
                tracing::warn!("Element {} already present, not reinserted", entry.element.id());
            }
        }
    }
}

fn restore_properties(document: &mut Document, snapshot: &Snapshot) {
    let entries: Vec<&ElementProperties> = match snapshot {
        Snapshot::Empty => Vec::new(),
        Snapshot::Elements(entries) => entries.iter().map(|e| e.element.properties()).collect(),
        Snapshot::Properties(entries) => entries.iter().collect(),
    };
    for properties in entries {
        let Some(element) = document.get_mut(properties.id()) else {
            tracing::warn!("Element {} vanished, properties not restored", properties.id());
            continue;
        };
        if let Err(e) = element.replace_properties(properties.clone()) {
            tracing::warn!("Failed to restore properties: {e}");
        }
    }
}

/// Bounded undo/redo log.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    /// Applied actions, oldest first.
    past: VecDeque<HistoryAction>,
    /// Undone actions, nearest first.
    future: VecDeque<HistoryAction>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// Create an empty history holding at most `capacity` undoable actions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            capacity,
        }
    }

    /// Record an applied action. Evicts the oldest action at capacity and
    /// invalidates everything that could have been redone.
    pub fn record(&mut self, action: HistoryAction) {
        tracing::debug!(
            "Recording {:?} of {} element(s)",
            action.kind,
            action.element_ids.len()
        );
        self.past.push_back(action);
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Revert the most recent action. Returns it, or `None` if there is
    /// nothing to undo.
    pub fn undo(&mut self, document: &mut Document) -> Option<&HistoryAction> {
        let action = self.past.pop_back()?;
        tracing::debug!("Undo {:?} {}", action.kind, action.id);
        action.revert(document);
        self.future.push_front(action);
        self.future.front()
    }

    /// Re-apply the nearest undone action. Returns it, or `None` if there is
    /// nothing to redo.
    pub fn redo(&mut self, document: &mut Document) -> Option<&HistoryAction> {
        let action = self.future.pop_front()?;
        tracing::debug!("Redo {:?} {}", action.kind, action.id);
        action.reapply(document);
        self.past.push_back(action);
        self.past.back()
    }

    /// Whether an action can be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether an action can be redone.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Applied actions, oldest first.
    pub fn past(&self) -> impl Iterator<Item = &HistoryAction> {
        self.past.iter()
    }

    /// Undone actions, nearest first.
    pub fn future(&self) -> impl Iterator<Item = &HistoryAction> {
        self.future.iter()
    }

    /// Most recently applied action.
    #[must_use]
    pub fn last(&self) -> Option<&HistoryAction> {
        self.past.back()
    }

    /// Number of undoable actions.
    #[must_use]
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    /// Number of redoable actions.
    #[must_use]
    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Maximum number of undoable actions.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget every action.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use crate::geometry::Position;

    fn element(id: &str) -> CanvasElement {
        CanvasElement::with_id(id.into(), ElementKind::Text, Position::new(0.0, 0.0))
    }

    fn add_action(doc: &mut Document, id: &str) -> HistoryAction {
        let el = element(id);
        doc.push(el.clone());
        HistoryAction::new(
            ActionKind::Add,
            vec![el.id().clone()],
            Snapshot::Empty,
            Snapshot::Elements(vec![IndexedElement {
                index: doc.len() - 1,
                element: el,
            }]),
        )
    }

    #[test]
    fn test_record_evicts_oldest() {
        let mut history = History::new(3);
        let mut doc = Document::new();
        for i in 0..5 {
            let action = add_action(&mut doc, &format!("e{i}"));
            history.record(action);
        }
        assert_eq!(history.past_len(), 3);
        let first = history.past().next().expect("non-empty");
        assert_eq!(first.element_ids[0].as_str(), "e2");
    }

    #[test]
    fn test_undo_redo_add() {
        let mut history = History::default();
        let mut doc = Document::new();
        let action = add_action(&mut doc, "a");
        history.record(action);

        assert!(history.undo(&mut doc).is_some());
        assert!(doc.is_empty());
        assert!(history.can_redo());

        assert!(history.redo(&mut doc).is_some());
        assert!(doc.contains(&"a".into()));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_clears_future() {
        let mut history = History::default();
        let mut doc = Document::new();
        let first = add_action(&mut doc, "a");
        history.record(first);
        history.undo(&mut doc);
        assert_eq!(history.future_len(), 1);

        let second = add_action(&mut doc, "b");
        history.record(second);
        assert_eq!(history.future_len(), 0);
        assert!(history.redo(&mut doc).is_none());
    }

    #[test]
    fn test_empty_undo_is_noop() {
        let mut history = History::default();
        let mut doc = Document::from_elements([element("x")]);
        assert!(history.undo(&mut doc).is_none());
        assert!(history.redo(&mut doc).is_none());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_snapshot_lookup() {
        let el = element("a");
        let snapshot = Snapshot::Elements(vec![IndexedElement { index: 0, element: el }]);
        assert!(snapshot.properties(&"a".into()).is_some());
        assert!(snapshot.properties(&"b".into()).is_none());
        assert_eq!(snapshot.len(), 1);
        assert!(Snapshot::Empty.is_empty());
    }

    #[test]
    fn test_action_serializes_wire_names() {
        let action = HistoryAction::new(
            ActionKind::Move,
            vec!["a".into()],
            Snapshot::Empty,
            Snapshot::Empty,
        );
        let json = serde_json::to_value(&action).expect("serialize");
        assert_eq!(json["type"], "move");
        assert_eq!(json["elementIds"][0], "a");
        assert_eq!(json["before"]["kind"], "empty");
    }
}
