//! Editing session: the single mutation surface for one open template.
//!
//! An [`EditorSession`] owns the element collection, the selection, the view
//! and the undo/redo history. Every operation that changes elements goes
//! through one of two recording paths: structural edits (add, delete) record
//! whole elements, property edits go through `apply_and_record`, which
//! captures complete before/after property sets. Operations on ids that do
//! not exist are silently skipped.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::align::{align, Alignment};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::element::{CanvasElement, ElementId, ElementProperties, PropertyPatch};
use crate::geometry::{Position, Size, Transform};
use crate::history::{ActionKind, History, HistoryAction, IndexedElement, Snapshot};
use crate::template::{Template, TemplateType};
use crate::validation::{validate_element_id, ValidationError};
use crate::view::{EditorMode, ViewState};
use crate::TemplateResult;

/// One open template with its selection, view and history.
#[derive(Debug, Clone)]
pub struct EditorSession {
    document: Document,
    selection: Vec<ElementId>,
    hovered: Option<ElementId>,
    view: ViewState,
    history: History,
    template: Option<Template>,
    config: EditorConfig,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    /// Create an empty session with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    /// Create an empty session with custom configuration. Invalid tunables
    /// fall back to their defaults; see [`EditorConfig::sanitized`].
    #[must_use]
    pub fn with_config(config: EditorConfig) -> Self {
        let config = config.sanitized();
        Self {
            document: Document::new(),
            selection: Vec::new(),
            hovered: None,
            view: ViewState::new(config.zoom, config.grid_size),
            history: History::new(config.history_capacity),
            template: None,
            config,
        }
    }

    // --- queries ---

    /// The element collection.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// All elements, in document order.
    #[must_use]
    pub fn elements(&self) -> &[CanvasElement] {
        self.document.elements()
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get_element(&self, id: &ElementId) -> Option<&CanvasElement> {
        self.document.get(id)
    }

    /// Selected ids, in selection order.
    #[must_use]
    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }

    /// Selected elements, in selection order.
    #[must_use]
    pub fn selected_elements(&self) -> Vec<&CanvasElement> {
        self.selection
            .iter()
            .filter_map(|id| self.document.get(id))
            .collect()
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.selection.contains(id)
    }

    /// Element under the pointer.
    #[must_use]
    pub fn hovered(&self) -> Option<&ElementId> {
        self.hovered.as_ref()
    }

    /// View state.
    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Mutable view state, for mode, pan offset and guides.
    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    /// Undo/redo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // --- structural edits ---

    /// Add an element and select it. An id already in use, or one that
    /// fails [`validate_element_id`], is replaced by a fresh one. Returns the
    /// id the element ended up with.
    pub fn add_element(&mut self, element: CanvasElement) -> ElementId {
        self.add_elements(vec![element])
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// Add several elements as one undoable action and select them.
    pub fn add_elements(&mut self, elements: Vec<CanvasElement>) -> Vec<ElementId> {
        if elements.is_empty() {
            return Vec::new();
        }
        let mut entries = Vec::with_capacity(elements.len());
        for element in elements {
            let taken = self.document.contains(element.id());
            let element = if taken || validate_element_id(element.id().as_str()).is_err() {
                element.duplicate(Position::default())
            } else {
                element
            };
            let index = self.document.len();
            self.document.push(element.clone());
            entries.push(IndexedElement { index, element });
        }
        let ids: Vec<ElementId> = entries.iter().map(|e| e.element.id().clone()).collect();
        self.history.record(HistoryAction::new(
            ActionKind::Add,
            ids.clone(),
            Snapshot::Empty,
            Snapshot::Elements(entries),
        ));
        self.selection.clone_from(&ids);
        ids
    }

    /// Delete one element. Returns `false` if it does not exist.
    pub fn delete_element(&mut self, id: &ElementId) -> bool {
        self.delete_elements(std::slice::from_ref(id)) > 0
    }

    /// Delete elements as one undoable action. Returns how many were removed.
    pub fn delete_elements(&mut self, ids: &[ElementId]) -> usize {
        let mut entries: Vec<IndexedElement> = self
            .document
            .iter()
            .enumerate()
            .filter(|(_, e)| ids.contains(e.id()))
            .map(|(index, element)| IndexedElement {
                index,
                element: element.clone(),
            })
            .collect();
        if entries.is_empty() {
            return 0;
        }
        entries.sort_by_key(|e| e.index);
        for entry in &entries {
            self.document.remove(entry.element.id());
        }
        let removed: Vec<ElementId> = entries.iter().map(|e| e.element.id().clone()).collect();
        self.history.record(HistoryAction::new(
            ActionKind::Delete,
            removed.clone(),
            Snapshot::Elements(entries),
            Snapshot::Empty,
        ));
        self.prune_references();
        removed.len()
    }

    /// Delete the selected elements.
    pub fn delete_selection(&mut self) -> usize {
        let ids = self.selection.clone();
        self.delete_elements(&ids)
    }

    /// Duplicate one element. Returns the copy's id.
    pub fn duplicate_element(&mut self, id: &ElementId) -> Option<ElementId> {
        self.duplicate_elements(std::slice::from_ref(id)).into_iter().next()
    }

    /// Duplicate elements as one undoable action and select the copies.
    pub fn duplicate_elements(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let offset = self.config.duplicate_offset;
        let copies: Vec<CanvasElement> = ids
            .iter()
            .filter_map(|id| self.document.get(id))
            .map(|e| e.duplicate(offset))
            .collect();
        self.add_elements(copies)
    }

    // --- property edits ---

    /// Shallow-merge a patch into an element's properties.
    ///
    /// Returns `Ok(false)` if the element does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch carries non-finite numbers or a variant
    /// of the wrong family. The document is left untouched.
    pub fn update_element(
        &mut self,
        id: &ElementId,
        patch: &PropertyPatch,
    ) -> TemplateResult<bool> {
        let changed = self.apply_and_record(ActionKind::Update, std::slice::from_ref(id), |props| {
            props.apply_patch(patch)
        })?;
        Ok(changed.is_some())
    }

    /// Merge loosely-typed JSON overrides into an element, as a property
    /// panel edit. Returns the ignored keys, or `None` if the element does
    /// not exist.
    ///
    /// # Errors
    ///
    /// See [`ElementProperties::apply_json`].
    pub fn update_element_json(
        &mut self,
        id: &ElementId,
        overrides: &Map<String, Value>,
    ) -> TemplateResult<Option<Vec<String>>> {
        if !self.document.contains(id) {
            return Ok(None);
        }
        let mut ignored = Vec::new();
        self.apply_and_record(ActionKind::Update, std::slice::from_ref(id), |props| {
            ignored = props.apply_json(overrides)?;
            Ok(())
        })?;
        Ok(Some(ignored))
    }

    /// Translate elements by `delta`. Returns how many moved.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotFinite`] if `delta` is not finite.
    pub fn move_elements(&mut self, ids: &[ElementId], delta: Position) -> TemplateResult<usize> {
        if !delta.is_finite() {
            return Err(ValidationError::NotFinite("delta".to_string()).into());
        }
        let moved = self.apply_and_record(ActionKind::Move, ids, |props| {
            props.base.position = props.base.position.offset(delta);
            Ok(())
        })?;
        Ok(moved.map_or(0, |ids| ids.len()))
    }

    /// Set an element's size.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotFinite`] if `size` is not finite.
    pub fn resize_element(&mut self, id: &ElementId, size: Size) -> TemplateResult<bool> {
        self.update_element(id, &PropertyPatch::size(size))
    }

    /// Set an element's rotation in degrees, resetting its scale.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotFinite`] if `rotation` is not finite.
    pub fn rotate_element(&mut self, id: &ElementId, rotation: f64) -> TemplateResult<bool> {
        self.update_element(id, &PropertyPatch::transform(Transform::rotated(rotation)))
    }

    /// Raise an element above every other. Returns `false` if it does not exist.
    pub fn bring_to_front(&mut self, id: &ElementId) -> bool {
        let top = self.document.max_z_index().unwrap_or(0).max(0).saturating_add(1);
        self.set_z_index(id, top)
    }

    /// Lower an element below every other. Returns `false` if it does not exist.
    pub fn send_to_back(&mut self, id: &ElementId) -> bool {
        let bottom = self.document.min_z_index().unwrap_or(0).min(0).saturating_sub(1);
        self.set_z_index(id, bottom)
    }

    /// Raise an element by one step.
    pub fn bring_forward(&mut self, id: &ElementId) -> bool {
        match self.document.get(id) {
            Some(element) => self.set_z_index(id, element.z_index().saturating_add(1)),
            None => false,
        }
    }

    /// Lower an element by one step.
    pub fn send_backward(&mut self, id: &ElementId) -> bool {
        match self.document.get(id) {
            Some(element) => self.set_z_index(id, element.z_index().saturating_sub(1)),
            None => false,
        }
    }

    fn set_z_index(&mut self, id: &ElementId, z_index: i32) -> bool {
        self.document.contains(id)
            && self
                .apply_and_record(ActionKind::Update, std::slice::from_ref(id), |props| {
                    props.base.z_index = z_index;
                    Ok(())
                })
                .is_ok()
    }

    /// Flip the lock flag. Returns the new value.
    pub fn toggle_lock(&mut self, id: &ElementId) -> Option<bool> {
        let locked = !self.document.get(id)?.base().locked;
        self.apply_and_record(ActionKind::Update, std::slice::from_ref(id), |props| {
            props.base.locked = locked;
            Ok(())
        })
        .ok()?;
        Some(locked)
    }

    /// Flip the visibility flag. Returns the new value.
    pub fn toggle_visibility(&mut self, id: &ElementId) -> Option<bool> {
        let visible = !self.document.get(id)?.base().visible;
        self.apply_and_record(ActionKind::Update, std::slice::from_ref(id), |props| {
            props.base.visible = visible;
            Ok(())
        })
        .ok()?;
        Some(visible)
    }

    /// Align elements. Unknown ids are skipped. Returns how many moved.
    pub fn align_elements(&mut self, ids: &[ElementId], alignment: Alignment) -> usize {
        let elements: Vec<&CanvasElement> =
            ids.iter().filter_map(|id| self.document.get(id)).collect();
        let targets: HashMap<ElementId, Position> =
            align(&elements, alignment).into_iter().collect();
        if targets.is_empty() {
            return 0;
        }
        let ids: Vec<ElementId> = elements.iter().map(|e| e.id().clone()).collect();
        self.apply_and_record(ActionKind::Update, &ids, |props| {
            if let Some(target) = targets.get(props.id()) {
                props.base.position = *target;
            }
            Ok(())
        })
        .ok()
        .flatten()
        .map_or(0, |changed| changed.len())
    }

    /// Align left edges to the leftmost.
    pub fn align_left(&mut self, ids: &[ElementId]) -> usize {
        self.align_elements(ids, Alignment::Left)
    }

    /// Align right edges to the rightmost.
    pub fn align_right(&mut self, ids: &[ElementId]) -> usize {
        self.align_elements(ids, Alignment::Right)
    }

    /// Align top edges to the topmost.
    pub fn align_top(&mut self, ids: &[ElementId]) -> usize {
        self.align_elements(ids, Alignment::Top)
    }

    /// Align bottom edges to the lowest.
    pub fn align_bottom(&mut self, ids: &[ElementId]) -> usize {
        self.align_elements(ids, Alignment::Bottom)
    }

    /// Align horizontal centers to their mean.
    pub fn align_center(&mut self, ids: &[ElementId]) -> usize {
        self.align_elements(ids, Alignment::Center)
    }

    /// Align vertical centers to their mean.
    pub fn align_middle(&mut self, ids: &[ElementId]) -> usize {
        self.align_elements(ids, Alignment::Middle)
    }

    /// Apply `mutate` to a working copy of every existing element in `ids`,
    /// install the results and record one action.
    ///
    /// All-or-nothing: if `mutate` fails for any element, nothing changes.
    /// Returns the ids whose properties changed, `None` if none did. Actions
    /// that change nothing are not recorded.
    fn apply_and_record<F>(
        &mut self,
        kind: ActionKind,
        ids: &[ElementId],
        mut mutate: F,
    ) -> TemplateResult<Option<Vec<ElementId>>>
    where
        F: FnMut(&mut ElementProperties) -> TemplateResult<()>,
    {
        let mut before = Vec::new();
        let mut after = Vec::new();
        for element in self.document.iter().filter(|e| ids.contains(e.id())) {
            let original = element.properties().clone();
            let mut updated = original.clone();
            mutate(&mut updated)?;
            if updated != original {
                before.push(original);
                after.push(updated);
            }
        }
        if after.is_empty() {
            return Ok(None);
        }

        for properties in &after {
            if let Some(element) = self.document.get_mut(properties.id()) {
                element.replace_properties(properties.clone())?;
            }
        }
        let changed: Vec<ElementId> = after.iter().map(|p| p.id().clone()).collect();
        self.history.record(HistoryAction::new(
            kind,
            changed.clone(),
            Snapshot::Properties(before),
            Snapshot::Properties(after),
        ));
        Ok(Some(changed))
    }

    // --- history ---

    /// Revert the most recent action. Returns `false` if there was none.
    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.document).is_some();
        self.prune_references();
        undone
    }

    /// Re-apply the nearest undone action. Returns `false` if there was none.
    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.document).is_some();
        self.prune_references();
        redone
    }

    /// Whether an action can be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether an action can be redone.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Forget every recorded action.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn prune_references(&mut self) {
        let document = &self.document;
        self.selection.retain(|id| document.contains(id));
        if self.hovered.as_ref().is_some_and(|id| !document.contains(id)) {
            self.hovered = None;
        }
    }

    // --- selection ---

    /// Select an element. With `multi`, toggle its membership instead of
    /// replacing the selection. Returns `false` if it does not exist.
    pub fn select_element(&mut self, id: &ElementId, multi: bool) -> bool {
        if !self.document.contains(id) {
            return false;
        }
        if !multi {
            self.selection = vec![id.clone()];
        } else if let Some(index) = self.selection.iter().position(|s| s == id) {
            self.selection.remove(index);
        } else {
            self.selection.push(id.clone());
        }
        true
    }

    /// Replace the selection. Unknown and repeated ids are dropped.
    pub fn select_elements(&mut self, ids: &[ElementId]) {
        self.selection.clear();
        for id in ids {
            if self.document.contains(id) && !self.selection.contains(id) {
                self.selection.push(id.clone());
            }
        }
    }

    /// Empty the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every element.
    pub fn select_all(&mut self) {
        self.selection = self.document.ids();
    }

    /// Set or clear the hovered element. Unknown ids clear it.
    pub fn set_hovered(&mut self, id: Option<ElementId>) {
        self.hovered = id.filter(|id| self.document.contains(id));
    }

    // --- view ---

    /// Set the zoom factor, clamped to the configured range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.view.set_zoom(zoom);
    }

    /// Zoom in one step.
    pub fn zoom_in(&mut self) {
        self.view.zoom_in();
    }

    /// Zoom out one step.
    pub fn zoom_out(&mut self) {
        self.view.zoom_out();
    }

    /// Back to 100% with no pan.
    pub fn reset_zoom(&mut self) {
        self.view.reset_zoom();
    }

    /// Fit every element into a viewport of `viewport` screen pixels.
    pub fn zoom_to_fit(&mut self, viewport: Size, padding: f64) {
        let bounds = self.document.bounds();
        self.view.zoom_to_fit(bounds, viewport, padding);
    }

    /// Toggle grid display.
    pub fn toggle_grid(&mut self) {
        self.view.toggle_grid();
    }

    /// Toggle grid snapping.
    pub fn toggle_snap(&mut self) {
        self.view.toggle_snap();
    }

    /// Set the grid spacing.
    pub fn set_grid_size(&mut self, size: f64) {
        self.view.set_grid_size(size);
    }

    /// Switch the active tool.
    pub fn set_mode(&mut self, mode: EditorMode) {
        self.view.mode = mode;
    }

    // --- template lifecycle ---

    /// Open a template, replacing the current content. Selection and
    /// history are cleared.
    pub fn load_template(&mut self, mut template: Template) {
        let content = std::mem::take(&mut template.content);
        tracing::info!(
            "Loading template {} ({} elements)",
            template.id,
            content.len()
        );
        self.document = Document::from_elements(content);
        self.template = Some(template);
        self.selection.clear();
        self.hovered = None;
        self.history.clear();
    }

    /// Close the current template, leaving an empty session.
    pub fn clear_template(&mut self) {
        self.document.clear();
        self.template = None;
        self.selection.clear();
        self.hovered = None;
        self.history.clear();
    }

    /// Rename the open template. Returns `false` if none is open.
    pub fn set_template_name(&mut self, name: impl Into<String>) -> bool {
        match &mut self.template {
            Some(template) => {
                template.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Change the open template's type. Returns `false` if none is open.
    pub fn set_template_type(&mut self, template_type: TemplateType) -> bool {
        match &mut self.template {
            Some(template) => {
                template.template_type = template_type;
                true
            }
            None => false,
        }
    }

    /// Snapshot of the open template with the current content.
    #[must_use]
    pub fn to_template(&self) -> Option<Template> {
        self.template.as_ref().map(|template| Template {
            content: self.document.elements().to_vec(),
            ..template.clone()
        })
    }
}
