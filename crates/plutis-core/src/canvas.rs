//! Canvas document and drawing surface.

use crate::camera::Camera;
use crate::shapes::{Group, GroupOptions, SerializableColor, Shape, ShapeId};
use crate::snap::GuideLine;
use crate::widget::{EditingKind, TextRange, WidgetManager, WidgetState};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Default number of undo states to keep.
pub const DEFAULT_UNDO_HISTORY: usize = 50;

/// Custom attributes attached to one shape.
pub type Attributes = Map<String, Value>;

/// A snapshot of document state for undo/redo.
#[derive(Debug, Clone)]
struct DocumentSnapshot {
    shapes: HashMap<ShapeId, Shape>,
    z_order: Vec<ShapeId>,
    attributes: HashMap<ShapeId, Attributes>,
}

/// A canvas document containing all shapes and their custom attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasDocument {
    /// Unique document identifier.
    pub id: String,
    /// Document name.
    pub name: String,
    /// All shapes in the document, keyed by ID.
    pub shapes: HashMap<ShapeId, Shape>,
    /// Z-order of shapes (back to front).
    pub z_order: Vec<ShapeId>,
    /// Per-shape custom attributes.
    #[serde(default)]
    pub attributes: HashMap<ShapeId, Attributes>,
    #[serde(skip)]
    undo_stack: Vec<DocumentSnapshot>,
    #[serde(skip)]
    redo_stack: Vec<DocumentSnapshot>,
    #[serde(skip, default = "default_history_limit")]
    history_limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_UNDO_HISTORY
}

impl Default for CanvasDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            shapes: HashMap::new(),
            z_order: Vec::new(),
            attributes: HashMap::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            history_limit: DEFAULT_UNDO_HISTORY,
        }
    }

    /// Limit how many undo states are kept.
    pub fn set_history_limit(&mut self, limit: usize) {
        self.history_limit = limit.max(1);
        self.trim_undo();
    }

    fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            shapes: self.shapes.clone(),
            z_order: self.z_order.clone(),
            attributes: self.attributes.clone(),
        }
    }

    fn restore(&mut self, snapshot: DocumentSnapshot) {
        self.shapes = snapshot.shapes;
        self.z_order = snapshot.z_order;
        self.attributes = snapshot.attributes;
    }

    fn trim_undo(&mut self) {
        if self.undo_stack.len() > self.history_limit {
            let excess = self.undo_stack.len() - self.history_limit;
            log::trace!("Dropping {} oldest undo snapshot(s)", excess);
            self.undo_stack.drain(..excess);
        }
    }

    /// Push current state to undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        let snapshot = self.snapshot();
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
        self.trim_undo();
    }

    /// Undo the last change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.redo_stack.push(current);
        self.restore(snapshot);
        log::debug!("Undo: {} step(s) left", self.undo_stack.len());
        true
    }

    /// Redo the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.undo_stack.push(current);
        self.restore(snapshot);
        log::debug!("Redo: {} step(s) left", self.redo_stack.len());
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of states that can be undone.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Forget all undo and redo states.
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Add a shape on top of the document.
    pub fn add_shape(&mut self, shape: Shape) {
        let id = shape.id();
        self.z_order.retain(|&shape_id| shape_id != id);
        self.z_order.push(id);
        self.shapes.insert(id, shape);
    }

    /// Insert a shape at a z-order position (clamped to the stack size).
    pub fn insert_shape(&mut self, index: usize, shape: Shape) {
        let id = shape.id();
        self.z_order.retain(|&shape_id| shape_id != id);
        let index = index.min(self.z_order.len());
        self.z_order.insert(index, id);
        self.shapes.insert(id, shape);
    }

    /// Remove a shape from the document. Its custom attributes are kept.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        self.z_order.retain(|&shape_id| shape_id != id);
        self.shapes.remove(&id)
    }

    /// Clear all shapes and attributes from the document.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.z_order.clear();
        self.attributes.clear();
    }

    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn get_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    /// Position of a shape in the z-order (0 = back).
    pub fn z_index(&self, id: ShapeId) -> Option<usize> {
        self.z_order.iter().position(|&shape_id| shape_id == id)
    }

    /// Get shapes in z-order (back to front).
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Bring a shape to the front (topmost).
    pub fn bring_to_front(&mut self, id: ShapeId) -> bool {
        if self.z_index(id).is_none() {
            return false;
        }
        self.z_order.retain(|&shape_id| shape_id != id);
        self.z_order.push(id);
        true
    }

    /// Send a shape to the back (bottommost).
    pub fn send_to_back(&mut self, id: ShapeId) -> bool {
        if self.z_index(id).is_none() {
            return false;
        }
        self.z_order.retain(|&shape_id| shape_id != id);
        self.z_order.insert(0, id);
        true
    }

    /// Move a shape one layer forward (towards front).
    /// Returns true if the shape was moved, false if already at front.
    pub fn bring_forward(&mut self, id: ShapeId) -> bool {
        if let Some(pos) = self.z_index(id) {
            if pos + 1 < self.z_order.len() {
                self.z_order.swap(pos, pos + 1);
                return true;
            }
        }
        false
    }

    /// Move a shape one layer backward (towards back).
    /// Returns true if the shape was moved, false if already at back.
    pub fn send_backward(&mut self, id: ShapeId) -> bool {
        if let Some(pos) = self.z_index(id) {
            if pos > 0 {
                self.z_order.swap(pos, pos - 1);
                return true;
            }
        }
        false
    }

    /// Get the bounding box of all shapes.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .values()
            .map(Shape::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    /// Find shapes at a point (in world coordinates), front to back.
    pub fn shapes_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .filter(|id| {
                self.shapes
                    .get(id)
                    .is_some_and(|s| s.hit_test(point, tolerance))
            })
            .copied()
            .collect()
    }

    /// Find shapes that intersect a rectangle, back to front.
    pub fn shapes_in_rect(&self, rect: Rect) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .filter(|id| {
                self.shapes
                    .get(id)
                    .is_some_and(|s| rect.intersect(s.bounds()).area() > 0.0)
            })
            .copied()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Group the given shapes into a single group, keeping their z-order.
    /// Returns the new group's ID, or None if less than 2 shapes were found.
    pub fn group_shapes(&mut self, shape_ids: &[ShapeId]) -> Option<ShapeId> {
        let ordered: Vec<ShapeId> = self
            .z_order
            .iter()
            .filter(|id| shape_ids.contains(id))
            .copied()
            .collect();
        if ordered.len() < 2 {
            return None;
        }
        self.group_in_order(&ordered, GroupOptions::default())
    }

    /// Group shapes keeping exactly the given member order.
    ///
    /// The group takes the slot of the frontmost member. Ids that are not in
    /// the document are skipped; returns None when nothing is left to group.
    pub fn group_in_order(&mut self, member_ids: &[ShapeId], options: GroupOptions) -> Option<ShapeId> {
        let front = member_ids.iter().filter_map(|&id| self.z_index(id)).max()?;
        let insert_pos = self.z_order[..front]
            .iter()
            .filter(|id| !member_ids.contains(id))
            .count();

        let members: Vec<Shape> = member_ids
            .iter()
            .filter_map(|&id| self.remove_shape(id))
            .collect();

        let group = Group::with_options(members, options);
        let group_id = group.id;
        log::debug!("Grouped {} shape(s) into {}", group.members().len(), group_id);
        self.insert_shape(insert_pos, Shape::Group(group));
        Some(group_id)
    }

    /// Ungroup a group shape, returning its members to the document in
    /// canvas coordinates at the group's z position.
    /// Returns the member IDs, or None if the shape is not a group.
    pub fn ungroup_shape(&mut self, group_id: ShapeId) -> Option<Vec<ShapeId>> {
        if !self.shapes.get(&group_id).is_some_and(Shape::is_group) {
            return None;
        }
        let z_pos = self.z_index(group_id)?;
        let Some(Shape::Group(group)) = self.remove_shape(group_id) else {
            return None;
        };

        let members = group.restore_members();
        let member_ids: Vec<ShapeId> = members.iter().map(Shape::id).collect();
        for (i, member) in members.into_iter().enumerate() {
            self.insert_shape(z_pos + i, member);
        }
        log::debug!("Ungrouped {} into {} shape(s)", group_id, member_ids.len());
        Some(member_ids)
    }

    /// Custom attributes of a shape.
    pub fn attributes_of(&self, id: ShapeId) -> Option<&Attributes> {
        self.attributes.get(&id)
    }

    /// Mutable custom attributes of a shape, created on first use.
    pub fn attributes_mut(&mut self, id: ShapeId) -> &mut Attributes {
        self.attributes.entry(id).or_default()
    }
}

/// Runtime drawing surface (not persisted).
///
/// Owns the document plus everything needed to interact with it: camera,
/// per-shape widget state, the design frame and render bookkeeping.
#[derive(Debug, Clone)]
pub struct Surface {
    /// The document being edited.
    pub document: CanvasDocument,
    /// Camera for view transform.
    pub camera: Camera,
    /// Widget manager for UI state (selection, hover, editing, locking).
    pub widgets: WidgetManager,
    /// Viewport size in screen pixels.
    pub viewport_size: Size,
    /// Design frame (the page) in world coordinates.
    pub frame: Rect,
    /// Frame background color.
    pub background: SerializableColor,
    /// Alignment guides shown during the current drag.
    pub guides: Vec<GuideLine>,
    render_generation: u64,
    render_requested: bool,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(Size::new(800.0, 600.0))
    }
}

impl Surface {
    /// Default hit tolerance in screen pixels.
    pub const HIT_TOLERANCE: f64 = 4.0;

    /// Create an empty surface with the given viewport.
    pub fn new(viewport_size: Size) -> Self {
        Self::with_document(CanvasDocument::new(), viewport_size)
    }

    /// Create a surface around an existing document.
    pub fn with_document(document: CanvasDocument, viewport_size: Size) -> Self {
        Self {
            document,
            camera: Camera::new(),
            widgets: WidgetManager::new(),
            viewport_size,
            frame: Rect::new(0.0, 0.0, 1200.0, 1200.0),
            background: SerializableColor::white(),
            guides: Vec::new(),
            render_generation: 0,
            render_requested: false,
        }
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Size::new(width, height);
    }

    /// Map a screen-space pointer position into canvas (world) space.
    pub fn get_pointer(&self, screen_point: Point) -> Point {
        self.camera.screen_to_world(screen_point)
    }

    /// Add a shape on top of the stack.
    pub fn add(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.document.add_shape(shape);
        id
    }

    /// Insert a shape at a z-order position.
    pub fn insert(&mut self, index: usize, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.document.insert_shape(index, shape);
        id
    }

    /// Remove a shape and forget its widget state.
    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        self.widgets.remove(id);
        self.document.remove_shape(id)
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.document.get_shape(id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.document.get_shape_mut(id)
    }

    /// Objects in z-order (back to front).
    pub fn objects(&self) -> impl Iterator<Item = &Shape> {
        self.document.shapes_ordered()
    }

    /// Topmost selectable shape under a world-space point.
    pub fn find_target(&self, world_point: Point) -> Option<ShapeId> {
        let tolerance = Self::HIT_TOLERANCE / self.camera.zoom;
        self.document
            .shapes_at_point(world_point, tolerance)
            .into_iter()
            .find(|&id| self.widgets.is_selectable(id))
    }

    /// Make a shape the sole active object.
    pub fn set_active_object(&mut self, id: ShapeId) -> bool {
        if self.document.get_shape(id).is_none() {
            return false;
        }
        self.widgets.select(id);
        true
    }

    /// Clear the active selection, leaving editing mode first.
    pub fn discard_active_object(&mut self) {
        self.widgets.exit_editing();
        self.widgets.clear_selection();
    }

    /// Active objects in selection order.
    pub fn active_objects(&self) -> Vec<ShapeId> {
        self.widgets.selected().to_vec()
    }

    /// Enter in-place editing on an inline-editable shape, caret at the end.
    pub fn enter_editing(&mut self, id: ShapeId) -> bool {
        let Some(text) = self.document.get_shape(id).and_then(Shape::as_text) else {
            return false;
        };
        let caret = TextRange::caret(text.char_count());
        self.widgets
            .enter_editing(id, EditingKind::Text { selection: caret });
        true
    }

    /// Select the whole content of the text being edited.
    pub fn select_all_text(&mut self) -> Option<TextRange> {
        let id = self.widgets.focused()?;
        let len = self.document.get_shape(id)?.as_text()?.char_count();
        let range = TextRange::all(len);
        self.widgets.set_text_selection(range);
        Some(range)
    }

    /// Leave editing mode. Returns the shape that was being edited.
    pub fn exit_editing(&mut self) -> Option<ShapeId> {
        self.widgets.exit_editing()
    }

    /// Shapes whose editing ended since the last call, oldest first.
    pub fn take_ended_edits(&mut self) -> Vec<ShapeId> {
        self.widgets.take_ended_edits()
    }

    pub fn is_editing(&self, id: ShapeId) -> bool {
        self.widgets.is_editing_shape(id)
    }

    /// The shape currently being edited, if any.
    pub fn editing_object(&self) -> Option<ShapeId> {
        self.widgets.focused()
    }

    pub fn text_selection(&self) -> Option<TextRange> {
        self.widgets.text_selection()
    }

    pub fn widget_state(&self, id: ShapeId) -> WidgetState {
        self.widgets.state(id)
    }

    pub fn set_selectable(&mut self, id: ShapeId, selectable: bool) {
        self.widgets.set_selectable(id, selectable);
    }

    pub fn is_selectable(&self, id: ShapeId) -> bool {
        self.widgets.is_selectable(id)
    }

    /// Mark the surface as drawn; bumps the render generation.
    pub fn render_all(&mut self) -> u64 {
        self.render_requested = false;
        self.render_generation += 1;
        self.render_generation
    }

    /// Ask for a redraw on the next frame.
    pub fn request_render(&mut self) {
        self.render_requested = true;
    }

    pub fn render_requested(&self) -> bool {
        self.render_requested
    }

    pub fn render_generation(&self) -> u64 {
        self.render_generation
    }

    /// Replace the document, dropping all UI state.
    pub fn load_document(&mut self, document: CanvasDocument) {
        let limit = self.document.history_limit;
        log::debug!("Loading document with {} shape(s)", document.len());
        self.document = document;
        self.document.set_history_limit(limit);
        self.widgets.clear();
        self.guides.clear();
    }
}
