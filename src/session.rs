//! # Editor Session
//!
//! One operator editing one label. The session owns every piece of mutable
//! editor state and wires the engine components together:
//!
//! ```text
//! user action ──► EditorSession ──► ElementStore (+ History)
//!                      │                 │
//!                      │                 ├─► ImageCache::sync   (after swaps)
//!                      │                 └─► CodeCache::ensure  (refresh_codes)
//!                      └─► Constraint / snap (candidate → constrain → commit)
//! ```
//!
//! All editing is synchronous. Only collaborator I/O and code generation
//! are async; they never run concurrently with an edit because the session
//! is `&mut self` throughout.
//!
//! ## Canvas changes
//!
//! Changing paper size or orientation rescales every element and starts a
//! fresh history, the same as loading a template: snapshots are element
//! lists only and would not fit the new canvas.

use std::collections::{HashSet, VecDeque};

use crate::batch::{Binder, FieldSelection, FlatRecord, RowIdentity, RowMatch, fill_placeholders, select_row};
use crate::canvas::snap::snap_box;
use crate::canvas::{Alignment, CanvasSize, Constraint, Orientation, PaperSize, align_elements, resize_canvas};
use crate::client::{BatchSource, TemplateStore};
use crate::codes::{CodeCache, CodeStatus};
use crate::config::EngineConfig;
use crate::element::{Bounds, Element, ElementId, ElementKind};
use crate::error::{LabelError, LabelResult};
use crate::images::ImageCache;
use crate::store::ElementStore;
use crate::template::Template;
use crate::text_fit::TextFit;

#[derive(Debug, Clone)]
struct DragState {
    origins: Vec<(ElementId, Bounds)>,
    recorded: bool,
}

/// Result of binding a fetched batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub row_index: usize,
    pub row_match: RowMatch,
    pub elements: Vec<ElementId>,
}

/// Editor state for a single label.
#[derive(Debug)]
pub struct EditorSession {
    config: EngineConfig,
    store: ElementStore,
    template: Template,
    canvas: CanvasSize,
    selection: Vec<ElementId>,
    clipboard: Vec<Element>,
    paste_count: u32,
    drag: Option<DragState>,
    constraint: Constraint,
    text_fit: TextFit,
    binder: Binder,
    codes: CodeCache,
    codes_stale: bool,
    images: ImageCache,
    recent_batches: VecDeque<String>,
    row_identity: Option<RowIdentity>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EngineConfig) -> Self {
        let template = Template::default();
        Self {
            store: ElementStore::new(config.store.clone()),
            canvas: template.paper_canvas(),
            template,
            selection: Vec::new(),
            clipboard: Vec::new(),
            paste_count: 0,
            drag: None,
            constraint: Constraint::from(&config.store),
            text_fit: TextFit::new(config.text.clone()),
            binder: Binder::new(config.batch.clone(), TextFit::new(config.text.clone())),
            codes: CodeCache::new(config.codes.clone()),
            codes_stale: false,
            images: ImageCache::new(),
            recent_batches: VecDeque::new(),
            row_identity: None,
            config,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn elements(&self) -> &[Element] {
        self.store.elements()
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.store.get(id)
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn paper_size(&self) -> PaperSize {
        self.template.paper_size
    }

    pub fn orientation(&self) -> Orientation {
        self.template.orientation
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    pub fn codes(&self) -> &CodeCache {
        &self.codes
    }

    pub fn recent_batches(&self) -> impl Iterator<Item = &str> {
        self.recent_batches.iter().map(String::as_str)
    }

    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    fn constrained(&self, element: &Element) -> Element {
        self.constraint.apply(element, &self.canvas)
    }

    /// Re-derive runtime state after the element list changed wholesale.
    fn after_swap(&mut self) {
        self.images.sync(self.store.elements());
        self.codes_stale = true;
        self.selection.retain(|id| self.store.contains(id));
        self.drag = None;
    }

    // ========================================================================
    // CREATION AND DELETION
    // ========================================================================

    /// Add an element on top of the paint order, constrained to the canvas.
    pub fn add_element(&mut self, element: Element) -> ElementId {
        let mut el = self.constrained(&element);
        el.layer = self.store.next_layer();
        let id = self.store.add(el);
        self.images.sync(self.store.elements());
        self.selection = vec![id.clone()];
        id
    }

    /// Drop a new element of `type_name` with its editor defaults,
    /// centered on the canvas.
    pub fn add_new(&mut self, type_name: &str) -> LabelResult<ElementId> {
        let kind = ElementKind::editor_default(type_name).ok_or_else(|| {
            LabelError::InvalidOperation(format!("unknown element type '{}'", type_name))
        })?;
        let mut el = Element::new(kind);
        el.x = (self.canvas.width - el.width) / 2.0;
        el.y = (self.canvas.height - el.height) / 2.0;
        Ok(self.add_element(el))
    }

    pub fn delete_selected(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        let removed = self.store.remove_many(&self.selection);
        self.selection.clear();
        self.images.sync(self.store.elements());
        removed.len()
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }

    pub fn selected_elements(&self) -> Vec<&Element> {
        self.selection.iter().filter_map(|id| self.store.get(id)).collect()
    }

    pub fn select(&mut self, id: &ElementId) -> bool {
        if !self.store.contains(id) {
            return false;
        }
        self.selection = vec![id.clone()];
        true
    }

    /// Add or remove an element from the selection (shift-click).
    pub fn toggle_select(&mut self, id: &ElementId) {
        if let Some(pos) = self.selection.iter().position(|s| s == id) {
            self.selection.remove(pos);
        } else if self.store.contains(id) {
            self.selection.push(id.clone());
        }
    }

    pub fn select_many(&mut self, ids: &[ElementId]) {
        self.selection = ids.iter().filter(|id| self.store.contains(id)).cloned().collect();
    }

    pub fn select_all(&mut self) {
        self.selection = self.store.paint_order().iter().map(|el| el.id.clone()).collect();
    }

    /// Select every element whose box intersects `area` (rubber band).
    pub fn select_in(&mut self, area: Bounds) -> usize {
        self.selection = self
            .store
            .paint_order()
            .iter()
            .filter(|el| el.visible && el.bounds().intersects(&area))
            .map(|el| el.id.clone())
            .collect();
        self.selection.len()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Topmost visible element under a point.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&Element> {
        self.store
            .paint_order()
            .into_iter()
            .rev()
            .find(|el| el.visible && el.bounds().contains_point(x, y))
    }

    // ========================================================================
    // DUPLICATE / CLIPBOARD
    // ========================================================================

    fn insert_copies(&mut self, sources: Vec<Element>, offset: f64) -> Vec<ElementId> {
        if sources.is_empty() {
            return Vec::new();
        }
        let base = self.store.next_layer();
        let gap = self.config.store.layer_gap;
        let copies: Vec<Element> = sources
            .into_iter()
            .enumerate()
            .map(|(i, mut el)| {
                el.regenerate_ids();
                el.x += offset;
                el.y += offset;
                el.layer = base + i as i64 * gap;
                self.constrained(&el)
            })
            .collect();
        let ids = self.store.add_many(copies);
        self.images.sync(self.store.elements());
        self.selection = ids.clone();
        ids
    }

    fn selection_in_paint_order(&self) -> Vec<Element> {
        self.store
            .paint_order()
            .into_iter()
            .filter(|el| self.selection.contains(&el.id))
            .cloned()
            .collect()
    }

    /// Duplicate the selection under one history entry; the copies become
    /// the selection.
    pub fn duplicate_selected(&mut self) -> Vec<ElementId> {
        let sources = self.selection_in_paint_order();
        let offset = self.config.store.duplicate_offset;
        self.insert_copies(sources, offset)
    }

    pub fn copy_selection(&mut self) -> usize {
        self.clipboard = self.selection_in_paint_order();
        self.paste_count = 0;
        self.clipboard.len()
    }

    /// Paste the clipboard. Repeated pastes cascade by the duplicate offset.
    pub fn paste(&mut self) -> Vec<ElementId> {
        self.paste_count += 1;
        let offset = self.config.store.duplicate_offset * self.paste_count as f64;
        self.insert_copies(self.clipboard.clone(), offset)
    }

    // ========================================================================
    // GROUPING AND ORDER
    // ========================================================================

    pub fn group_selection(&mut self) -> LabelResult<ElementId> {
        let id = self.store.group(&self.selection)?;
        self.selection = vec![id.clone()];
        Ok(id)
    }

    pub fn ungroup_selection(&mut self) -> LabelResult<Vec<ElementId>> {
        let [id] = self.selection.as_slice() else {
            return Err(LabelError::InvalidOperation("select exactly one group".into()));
        };
        let id = id.clone();
        let children = self.store.ungroup(&id)?;
        self.selection = children.clone();
        Ok(children)
    }

    pub fn move_to_top(&mut self, id: &ElementId) -> LabelResult<()> {
        self.store.move_to_top(id)
    }

    pub fn move_to_bottom(&mut self, id: &ElementId) -> LabelResult<()> {
        self.store.move_to_bottom(id)
    }

    pub fn move_up(&mut self, id: &ElementId) -> LabelResult<()> {
        self.store.move_up(id)
    }

    pub fn move_down(&mut self, id: &ElementId) -> LabelResult<()> {
        self.store.move_down(id)
    }

    /// Align the selection to its own bounds. Returns how many moved.
    pub fn align_selection(&mut self, alignment: Alignment) -> usize {
        let selected: Vec<Element> = self.selected_elements().into_iter().cloned().collect();
        if selected.len() < 2 {
            return 0;
        }
        let moves = align_elements(&selected, alignment);
        if moves.is_empty() {
            return 0;
        }
        self.store.record();
        let (constraint, canvas) = (self.constraint, self.canvas);
        for (id, x, y) in &moves {
            let result = self.store.modify_untracked(id, |el| {
                el.x = *x;
                el.y = *y;
                *el = constraint.apply(el, &canvas);
            });
            if let Err(e) = result {
                tracing::debug!("align: {}", e);
            }
        }
        moves.len()
    }

    // ========================================================================
    // DRAG
    // ========================================================================

    /// Start dragging the selection. Locked and non-draggable elements are
    /// left behind. Returns the number of elements being dragged.
    pub fn begin_drag(&mut self) -> usize {
        let origins: Vec<(ElementId, Bounds)> = self
            .selected_elements()
            .into_iter()
            .filter(|el| !el.locked && el.draggable)
            .map(|el| (el.id.clone(), el.bounds()))
            .collect();
        let count = origins.len();
        self.drag = (count > 0).then_some(DragState {
            origins,
            recorded: false,
        });
        count
    }

    /// Move the dragged elements by `(dx, dy)` from where the drag began.
    ///
    /// The group snaps to the grid and to edges of elements not being
    /// dragged; positions are only softly constrained until [`Self::end_drag`].
    pub fn drag_to(&mut self, dx: f64, dy: f64) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        if !drag.recorded {
            self.store.record();
            drag.recorded = true;
        }
        let origins = drag.origins.clone();

        let Some(group) = origins.iter().map(|(_, b)| *b).reduce(|a, b| a.union(&b)) else {
            return false;
        };
        let moving: HashSet<&ElementId> = origins.iter().map(|(id, _)| id).collect();
        let others: Vec<Bounds> = self
            .store
            .elements()
            .iter()
            .filter(|el| el.visible && !moving.contains(&el.id))
            .map(Element::bounds)
            .collect();
        let candidate = Bounds::new(group.x + dx, group.y + dy, group.width, group.height);
        let snapped = snap_box(candidate, self.config.snap.grid_size, &others, self.config.snap.tolerance);
        let (sx, sy) = (snapped.x - group.x, snapped.y - group.y);

        let (constraint, canvas) = (self.constraint, self.canvas);
        for (id, origin) in &origins {
            let result = self.store.modify_untracked(id, |el| {
                el.x = origin.x + sx;
                el.y = origin.y + sy;
                let soft = constraint.apply_soft(el, &canvas);
                el.x = soft.x;
                el.y = soft.y;
            });
            if let Err(e) = result {
                tracing::debug!("drag: {}", e);
            }
        }
        true
    }

    /// Finish the drag, hard-constraining every dragged element.
    pub fn end_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let (constraint, canvas) = (self.constraint, self.canvas);
        for (id, _) in &drag.origins {
            let result = self.store.modify_untracked(id, |el| *el = constraint.apply(el, &canvas));
            if let Err(e) = result {
                tracing::debug!("end_drag: {}", e);
            }
        }
        let unmoved = drag
            .origins
            .iter()
            .all(|(id, origin)| self.store.get(id).is_none_or(|el| el.bounds() == *origin));
        if drag.recorded && unmoved {
            tracing::debug!("drag ended where it began");
            self.store.revert();
            return false;
        }
        drag.recorded
    }

    /// Abort the drag and put everything back.
    pub fn cancel_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if drag.recorded {
            self.store.revert();
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // ========================================================================
    // GEOMETRY AND PROPERTIES
    // ========================================================================

    /// Resize or move an element: candidate → constrain → commit.
    pub fn resize_element(&mut self, id: &ElementId, bounds: Bounds) -> LabelResult<()> {
        let current = self
            .store
            .get(id)
            .ok_or_else(|| LabelError::ElementNotFound(id.to_string()))?;
        if current.locked {
            tracing::debug!("resize: {} is locked", id);
            return Ok(());
        }
        let mut candidate = current.clone();
        candidate.set_bounds(bounds);
        let committed = self.constrained(&candidate);
        if committed == *current {
            return Ok(());
        }
        self.store.update(committed)
    }

    pub fn set_rotation(&mut self, id: &ElementId, degrees: f64) -> LabelResult<()> {
        self.update_property(id, "rotation", serde_json::json!(crate::canvas::normalize_rotation(degrees)))
    }

    /// Patch one property, then re-constrain the element unless it is locked.
    pub fn update_property(
        &mut self,
        id: &ElementId,
        key: &str,
        value: serde_json::Value,
    ) -> LabelResult<()> {
        self.store.update_property(id, key, value)?;
        let locked = self.store.get(id).is_some_and(|el| el.locked);
        if !locked {
            let (constraint, canvas) = (self.constraint, self.canvas);
            self.store.modify_untracked(id, |el| *el = constraint.apply(el, &canvas))?;
        }
        if key == "src" {
            self.images.sync(self.store.elements());
        }
        Ok(())
    }

    /// Set a text element's font size to the largest that fits its box.
    pub fn fit_text(&mut self, id: &ElementId) -> LabelResult<f64> {
        let el = self
            .store
            .get(id)
            .ok_or_else(|| LabelError::ElementNotFound(id.to_string()))?;
        let size = self
            .text_fit
            .fit_element(el)
            .ok_or_else(|| LabelError::InvalidOperation(format!("{} is not a text element", id)))?;
        self.store.update_property(id, "fontSize", serde_json::json!(size))?;
        Ok(size)
    }

    /// Resize a text element's box to hold its text at the current size.
    pub fn autosize_text(&mut self, id: &ElementId) -> LabelResult<Bounds> {
        let el = self
            .store
            .get(id)
            .ok_or_else(|| LabelError::ElementNotFound(id.to_string()))?;
        let ElementKind::Text(props) = &el.kind else {
            return Err(LabelError::InvalidOperation(format!("{} is not a text element", id)));
        };
        let size = self.text_fit.autosize(&props.text, props.font_size, &props.font_family);
        let bounds = Bounds::new(el.x, el.y, size.width, size.height);
        self.resize_element(id, bounds)?;
        self.store
            .get(id)
            .map(Element::bounds)
            .ok_or_else(|| LabelError::ElementNotFound(id.to_string()))
    }

    // ========================================================================
    // CANVAS
    // ========================================================================

    /// Rescale everything onto a new canvas and start a fresh history.
    pub fn resize_canvas(&mut self, new: CanvasSize) -> bool {
        if !new.is_valid() {
            tracing::debug!("resize_canvas: ignoring invalid size {}x{}", new.width, new.height);
            return false;
        }
        let scaled = resize_canvas(
            self.store.elements(),
            &self.canvas,
            &new,
            self.config.text.min_font_size,
        );
        let constraint = self.constraint;
        let fitted: Vec<Element> = scaled.iter().map(|el| constraint.apply(el, &new)).collect();
        tracing::info!(
            "canvas {}x{} -> {}x{} ({} elements)",
            self.canvas.width,
            self.canvas.height,
            new.width,
            new.height,
            fitted.len()
        );
        self.canvas = new;
        self.template.canvas_size = new;
        self.store.load(fitted);
        self.after_swap();
        true
    }

    pub fn set_paper(&mut self, paper: PaperSize, orientation: Orientation) -> bool {
        self.template.paper_size = paper;
        self.template.orientation = orientation;
        self.resize_canvas(paper.canvas_size(orientation))
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    pub fn undo(&mut self) -> bool {
        self.drag = None;
        let changed = self.store.undo();
        if changed {
            self.after_swap();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        self.drag = None;
        let changed = self.store.redo();
        if changed {
            self.after_swap();
        }
        changed
    }

    // ========================================================================
    // TEMPLATES
    // ========================================================================

    /// Replace the session contents with a template.
    pub fn load_template(&mut self, template: Template) {
        let canvas = if template.canvas_size.is_valid() {
            template.canvas_size
        } else {
            tracing::warn!("template '{}' has an invalid canvas, using paper size", template.name);
            template.paper_canvas()
        };
        let mut template = template;
        let elements = std::mem::take(&mut template.elements);
        tracing::info!("loaded template '{}' ({} elements)", template.name, elements.len());
        self.canvas = canvas;
        template.canvas_size = canvas;
        self.template = template;
        self.store.load(elements);
        self.selection.clear();
        self.clipboard.clear();
        self.after_swap();
    }

    /// Snapshot the session as a template.
    pub fn to_template(&self) -> Template {
        let mut template = self.template.clone();
        template.elements = self.store.snapshot();
        template.canvas_size = self.canvas;
        template
    }

    pub fn set_metadata(&mut self, name: &str, product_key: &str, customer_key: &str) {
        self.template.name = name.to_string();
        self.template.product_key = product_key.to_string();
        self.template.customer_key = customer_key.to_string();
    }

    /// Fetch and load a template. On failure the session is untouched.
    pub async fn open_template(&mut self, store: &dyn TemplateStore, id: &str) -> LabelResult<()> {
        let template = store.load_template(id).await?;
        self.load_template(template);
        Ok(())
    }

    /// Save through the backend and adopt the returned id and version.
    pub async fn save_template(&mut self, store: &dyn TemplateStore) -> LabelResult<Template> {
        let saved = store.save_template(&self.to_template()).await?;
        self.template.id = saved.id.clone();
        self.template.version = saved.version;
        self.template.updated_at = saved.updated_at;
        Ok(saved)
    }

    // ========================================================================
    // BATCH DATA
    // ========================================================================

    /// Replace the label with elements synthesized from `record`.
    /// Undo restores the previous design.
    pub fn apply_batch(&mut self, record: &FlatRecord, selection: &[FieldSelection]) -> Vec<ElementId> {
        let elements = self.binder.bind(record, selection, &self.canvas);
        self.store.record();
        self.store.replace_all(elements);
        self.after_swap();
        self.selection.clear();
        self.store.elements().iter().map(|el| el.id.clone()).collect()
    }

    /// Fill `{{field}}` tokens of the current design from `record`.
    pub fn fill_from_record(&mut self, record: &FlatRecord) {
        let filled = fill_placeholders(self.store.elements(), record);
        if filled.as_slice() == self.store.elements() {
            return;
        }
        self.store.record();
        self.store.replace_all(filled);
        self.after_swap();
    }

    fn remember_batch(&mut self, batch_no: &str) {
        self.recent_batches.retain(|b| b != batch_no);
        self.recent_batches.push_front(batch_no.to_string());
        self.recent_batches.truncate(self.config.batch.history_limit);
    }

    /// Fetch a batch, pick the row matching the previous choice, and bind it.
    ///
    /// Fetch failures and empty batches leave the session unchanged.
    pub async fn load_batch(
        &mut self,
        source: &dyn BatchSource,
        batch_no: &str,
        selection: &[FieldSelection],
    ) -> LabelResult<BatchOutcome> {
        let batch_no = batch_no.trim();
        let rows = source.fetch_batch_record(batch_no).await?;
        let identity = self.row_identity.clone().unwrap_or_default();
        let (row_index, row, row_match) = select_row(&rows, &identity)
            .ok_or_else(|| LabelError::Fetch(format!("batch {} has no rows", batch_no)))?;
        let row = row.clone();

        let elements = self.apply_batch(&row, selection);
        self.row_identity = Some(RowIdentity::from_record(&row));
        self.remember_batch(batch_no);
        tracing::info!(
            "batch {}: row {} ({:?}), {} elements",
            batch_no,
            row_index,
            row_match,
            elements.len()
        );
        Ok(BatchOutcome {
            row_index,
            row_match,
            elements,
        })
    }

    /// Remember a row identity for the next batch lookup.
    pub fn set_row_identity(&mut self, identity: RowIdentity) {
        self.row_identity = (!identity.is_empty()).then_some(identity);
    }

    // ========================================================================
    // SYMBOLIC CODES
    // ========================================================================

    /// Bring the code cache in line with the store: drop entries for
    /// removed elements and schedule generation for new or changed codes.
    /// Returns the number of generations scheduled.
    pub async fn refresh_codes(&mut self) -> usize {
        if self.codes_stale {
            self.codes.invalidate_all().await;
            self.codes_stale = false;
        }
        let mut live = HashSet::new();
        for el in self.store.elements() {
            el.walk(&mut |e| {
                live.insert(e.id.clone());
            });
        }
        self.codes.retain(&live).await;
        self.codes.ensure_all(self.store.elements()).await
    }

    pub async fn code_status(&self, id: &ElementId) -> Option<CodeStatus> {
        self.codes.status(id).await
    }
}
