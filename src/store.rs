//! # Element Store
//!
//! The single source of truth for the elements of one label.
//!
//! Elements are kept in insertion order; paint order is derived by sorting
//! on `layer` with insertion order breaking ties. Every mutation except
//! [`ElementStore::replace_all`] (and the explicitly untracked helpers used
//! while dragging) records a history snapshot before touching anything.
//!
//! ## Invariants
//!
//! - ids are unique across the whole tree, group children included; a
//!   colliding id on insert is replaced with a fresh one
//! - width and height never drop below the configured minimums
//! - locked elements ignore geometry edits
//!
//! Canvas bounds are not enforced here: callers pass candidate geometry
//! through [`crate::canvas::Constraint`] before committing it.

use std::collections::HashSet;

use crate::config::StoreConfig;
use crate::element::{Bounds, Element, ElementId, ElementKind, GroupProps};
use crate::error::{LabelError, LabelResult};
use crate::history::History;

/// Keys that move or resize an element.
const GEOMETRY_KEYS: &[&str] = &["x", "y", "width", "height", "rotation"];

/// Ordered element collection with snapshot undo/redo.
#[derive(Debug, Clone)]
pub struct ElementStore {
    elements: Vec<Element>,
    history: History<Vec<Element>>,
    config: StoreConfig,
}

impl Default for ElementStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl ElementStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            elements: Vec::new(),
            history: History::new(config.history_limit),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Top-level elements in insertion order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Top-level elements in paint order (bottom first).
    pub fn paint_order(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        // Stable sort: equal layers keep insertion order.
        ordered.sort_by_key(|el| el.layer);
        ordered
    }

    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|el| &el.id == id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Deep copy of the current elements.
    pub fn snapshot(&self) -> Vec<Element> {
        self.elements.clone()
    }

    /// Highest layer in use, or 0 for an empty store.
    pub fn top_layer(&self) -> i64 {
        self.elements.iter().map(|el| el.layer).max().unwrap_or(0)
    }

    /// Layer that puts a new element above everything else.
    pub fn next_layer(&self) -> i64 {
        if self.elements.is_empty() {
            self.config.layer_gap
        } else {
            self.top_layer() + self.config.layer_gap
        }
    }

    pub fn history(&self) -> &History<Vec<Element>> {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn index_of(&self, id: &ElementId) -> LabelResult<usize> {
        self.elements
            .iter()
            .position(|el| &el.id == id)
            .ok_or_else(|| LabelError::ElementNotFound(id.to_string()))
    }

    fn all_ids(&self) -> HashSet<ElementId> {
        let mut ids = HashSet::new();
        for el in &self.elements {
            el.walk(&mut |e| {
                ids.insert(e.id.clone());
            });
        }
        ids
    }

    /// Replace any id already in `taken` (or repeated inside `element`).
    fn dedupe_ids(element: &mut Element, taken: &mut HashSet<ElementId>) {
        element.walk_mut(&mut |e| {
            if !taken.insert(e.id.clone()) {
                let fresh = ElementId::generate();
                tracing::debug!("id collision on {}, reassigned to {}", e.id, fresh);
                e.id = fresh.clone();
                taken.insert(fresh);
            }
        });
    }

    fn sanitize(&self, element: &mut Element) {
        let (min, line) = (self.config.min_element_size, self.config.min_line_thickness);
        element.walk_mut(&mut |e| e.enforce_min_size(min, line));
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Push the current state onto the undo stack.
    ///
    /// Called by every tracked mutation; exposed for multi-step gestures
    /// (a drag records once at pointer-down, then moves untracked).
    pub fn record(&mut self) {
        self.history.record(self.elements.clone());
    }

    /// Restore the previous snapshot. Returns `false` when there is none.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.elements.clone()) {
            Some(previous) => {
                self.elements = previous;
                true
            }
            None => {
                tracing::debug!("undo: history empty");
                false
            }
        }
    }

    /// Re-apply the next snapshot. Returns `false` when there is none.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.elements.clone()) {
            Some(next) => {
                self.elements = next;
                true
            }
            None => {
                tracing::debug!("redo: nothing to redo");
                false
            }
        }
    }

    /// Return to the last recorded snapshot and forget it, leaving redo
    /// untouched. Used when a gesture is cancelled.
    pub fn revert(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.elements = previous;
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Insert an element. Returns its (possibly reassigned) id.
    pub fn add(&mut self, mut element: Element) -> ElementId {
        self.record();
        let mut taken = self.all_ids();
        Self::dedupe_ids(&mut element, &mut taken);
        self.sanitize(&mut element);
        let id = element.id.clone();
        self.elements.push(element);
        id
    }

    /// Insert several elements under a single history entry.
    pub fn add_many(&mut self, elements: Vec<Element>) -> Vec<ElementId> {
        if elements.is_empty() {
            return Vec::new();
        }
        self.record();
        let mut taken = self.all_ids();
        let mut ids = Vec::with_capacity(elements.len());
        for mut element in elements {
            Self::dedupe_ids(&mut element, &mut taken);
            self.sanitize(&mut element);
            ids.push(element.id.clone());
            self.elements.push(element);
        }
        ids
    }

    /// Replace the element with the same id.
    ///
    /// A locked element keeps its geometry; other fields are replaced.
    pub fn update(&mut self, mut element: Element) -> LabelResult<()> {
        let idx = self.index_of(&element.id)?;
        let current = &self.elements[idx];
        if current.locked && element.locked {
            if current.bounds() != element.bounds() || current.rotation != element.rotation {
                tracing::debug!("update: {} is locked, keeping geometry", element.id);
            }
            element.set_bounds(current.bounds());
            element.rotation = current.rotation;
        }
        self.sanitize(&mut element);
        self.record();
        self.elements[idx] = element;
        Ok(())
    }

    /// Patch a single property by its JSON key (`"x"`, `"fontSize"`, ...).
    ///
    /// The patch goes through the element's serde representation, so any
    /// field of the element's type can be set. `id` and `type` cannot be
    /// patched. Geometry keys on a locked element are ignored.
    pub fn update_property(
        &mut self,
        id: &ElementId,
        key: &str,
        value: serde_json::Value,
    ) -> LabelResult<()> {
        let idx = self.index_of(id)?;
        if key == "id" || key == "type" {
            return Err(LabelError::InvalidProperty {
                key: key.to_string(),
                reason: "cannot be changed".into(),
            });
        }
        if self.elements[idx].locked && GEOMETRY_KEYS.contains(&key) {
            tracing::debug!("update_property: {} is locked, ignoring {}", id, key);
            return Ok(());
        }

        let mut json = serde_json::to_value(&self.elements[idx])?;
        let Some(obj) = json.as_object_mut() else {
            return Err(LabelError::InvalidProperty {
                key: key.to_string(),
                reason: "element is not an object".into(),
            });
        };
        if !obj.contains_key(key) && !Self::is_optional_key(&self.elements[idx], key) {
            return Err(LabelError::InvalidProperty {
                key: key.to_string(),
                reason: format!("not a property of {}", self.elements[idx].type_name()),
            });
        }
        obj.insert(key.to_string(), value);
        let mut patched: Element =
            serde_json::from_value(json).map_err(|e| LabelError::InvalidProperty {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        self.sanitize(&mut patched);

        self.record();
        self.elements[idx] = patched;
        Ok(())
    }

    /// Optional keys that are omitted from JSON while unset.
    fn is_optional_key(element: &Element, key: &str) -> bool {
        matches!((&element.kind, key), (ElementKind::Text(_), "align"))
    }

    pub fn remove(&mut self, id: &ElementId) -> LabelResult<Element> {
        let idx = self.index_of(id)?;
        self.record();
        Ok(self.elements.remove(idx))
    }

    /// Remove every listed element that exists, under one history entry.
    /// Unknown ids are skipped; nothing is recorded if none match.
    pub fn remove_many(&mut self, ids: &[ElementId]) -> Vec<Element> {
        if !self.elements.iter().any(|el| ids.contains(&el.id)) {
            return Vec::new();
        }
        self.record();
        let (removed, kept): (Vec<Element>, Vec<Element>) = std::mem::take(&mut self.elements)
            .into_iter()
            .partition(|el| ids.contains(&el.id));
        self.elements = kept;
        removed
    }

    /// Swap in a whole element list without touching history.
    ///
    /// Used by undo/redo plumbing and by callers that already recorded.
    pub fn replace_all(&mut self, elements: Vec<Element>) {
        let mut taken = HashSet::new();
        self.elements = elements
            .into_iter()
            .map(|mut el| {
                Self::dedupe_ids(&mut el, &mut taken);
                self.sanitize(&mut el);
                el
            })
            .collect();
    }

    /// Template load: replace everything and reset both history stacks.
    pub fn load(&mut self, elements: Vec<Element>) {
        self.replace_all(elements);
        self.history.clear();
    }

    /// Change one element without recording history (drag in progress).
    pub fn modify_untracked(
        &mut self,
        id: &ElementId,
        f: impl FnOnce(&mut Element),
    ) -> LabelResult<()> {
        let idx = self.index_of(id)?;
        let mut el = self.elements[idx].clone();
        f(&mut el);
        el.id = id.clone();
        self.sanitize(&mut el);
        self.elements[idx] = el;
        Ok(())
    }

    /// Clone an element with a fresh id, offset so it is visibly distinct,
    /// and place it on top.
    pub fn duplicate(&mut self, id: &ElementId) -> LabelResult<ElementId> {
        let idx = self.index_of(id)?;
        let mut copy = self.elements[idx].clone();
        copy.regenerate_ids();
        copy.x += self.config.duplicate_offset;
        copy.y += self.config.duplicate_offset;
        copy.layer = self.next_layer();
        let new_id = copy.id.clone();
        self.record();
        self.elements.push(copy);
        Ok(new_id)
    }

    // ------------------------------------------------------------------
    // Layer order
    // ------------------------------------------------------------------

    /// Reorder so `id` sits at `target` in paint order, then renormalize
    /// layers to evenly spaced values and store elements in paint order.
    fn reorder(&mut self, id: &ElementId, target: impl FnOnce(usize, usize) -> usize) -> LabelResult<()> {
        self.index_of(id)?;
        let mut order: Vec<Element> = self.paint_order().into_iter().cloned().collect();
        let from = order
            .iter()
            .position(|el| &el.id == id)
            .ok_or_else(|| LabelError::ElementNotFound(id.to_string()))?;
        let to = target(from, order.len()).min(order.len() - 1);

        let el = order.remove(from);
        order.insert(to, el);
        for (i, el) in order.iter_mut().enumerate() {
            el.layer = (i as i64 + 1) * self.config.layer_gap;
        }
        if order == self.elements {
            tracing::debug!("reorder of {} changes nothing", id);
            return Ok(());
        }
        self.record();
        self.elements = order;
        Ok(())
    }

    pub fn move_to_top(&mut self, id: &ElementId) -> LabelResult<()> {
        self.reorder(id, |_, len| len - 1)
    }

    pub fn move_to_bottom(&mut self, id: &ElementId) -> LabelResult<()> {
        self.reorder(id, |_, _| 0)
    }

    pub fn move_up(&mut self, id: &ElementId) -> LabelResult<()> {
        self.reorder(id, |from, _| from + 1)
    }

    pub fn move_down(&mut self, id: &ElementId) -> LabelResult<()> {
        self.reorder(id, |from, _| from.saturating_sub(1))
    }

    // ------------------------------------------------------------------
    // Grouping
    // ------------------------------------------------------------------

    /// Merge top-level elements into a new group.
    ///
    /// The group box is the union of the members; children are rebased to
    /// the group origin and keep their relative paint order. The group takes
    /// the highest member layer.
    pub fn group(&mut self, ids: &[ElementId]) -> LabelResult<ElementId> {
        let members: Vec<&Element> = self
            .paint_order()
            .into_iter()
            .filter(|el| ids.contains(&el.id))
            .collect();
        if members.len() < 2 {
            return Err(LabelError::InvalidOperation(format!(
                "group needs at least 2 elements, found {}",
                members.len()
            )));
        }

        let bounds = members
            .iter()
            .map(|el| el.bounds())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        let layer = members.iter().map(|el| el.layer).max().unwrap_or(0);
        let children: Vec<Element> = members
            .into_iter()
            .map(|el| {
                let mut child = el.clone();
                child.x -= bounds.x;
                child.y -= bounds.y;
                child
            })
            .collect();

        let mut group = Element::new(ElementKind::Group(GroupProps { elements: children }));
        group.set_bounds(bounds);
        group.layer = layer;
        let group_id = group.id.clone();

        self.record();
        let insert_at = self
            .elements
            .iter()
            .position(|el| ids.contains(&el.id))
            .unwrap_or(self.elements.len());
        self.elements.retain(|el| !ids.contains(&el.id));
        self.elements.insert(insert_at.min(self.elements.len()), group);
        Ok(group_id)
    }

    /// Dissolve a group, re-expressing its children in canvas space.
    ///
    /// Children take the group's slot in insertion order and inherit the
    /// group's layer, so they stay where the group was in paint order.
    pub fn ungroup(&mut self, id: &ElementId) -> LabelResult<Vec<ElementId>> {
        let idx = self.index_of(id)?;
        let group = &self.elements[idx];
        let ElementKind::Group(props) = &group.kind else {
            return Err(LabelError::InvalidOperation(format!("{} is not a group", id)));
        };
        let origin = Bounds::new(group.x, group.y, group.width, group.height);
        let layer = group.layer;
        let children: Vec<Element> = props
            .elements
            .iter()
            .map(|child| {
                let mut c = child.clone();
                c.x += origin.x;
                c.y += origin.y;
                c.layer = layer;
                c
            })
            .collect();
        let ids = children.iter().map(|c| c.id.clone()).collect();

        self.record();
        self.elements.splice(idx..=idx, children);
        Ok(ids)
    }
}
