//! Widget manager for tracking UI state of shapes.

use super::handles::{Handle, HandleKind};
use super::state::{EditingKind, TextRange, WidgetState};
use crate::shapes::{Shape, ShapeId};
use kurbo::Point;
use std::collections::{HashMap, HashSet};

/// Interaction state of every shape: selection, editing focus and locking.
///
/// Editing can end through many calls (an explicit exit, a new selection,
/// removal, a reset). Each ended edit is recorded until the owner drains it
/// with [`WidgetManager::take_ended_edits`].
#[derive(Debug, Clone, Default)]
pub struct WidgetManager {
    /// UI state for each shape.
    states: HashMap<ShapeId, WidgetState>,
    /// Currently selected shapes, in selection order.
    selected: Vec<ShapeId>,
    /// Shape that has keyboard focus (for text editing).
    focused: Option<ShapeId>,
    /// Shapes that left editing since the last drain, oldest first.
    ended_edits: Vec<ShapeId>,
    /// Shapes that pointer targeting must skip.
    locked: HashSet<ShapeId>,
}

impl WidgetManager {
    /// Create a new widget manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the state of a shape.
    pub fn state(&self, id: ShapeId) -> WidgetState {
        self.states.get(&id).cloned().unwrap_or_default()
    }

    /// Set the state of a shape.
    pub fn set_state(&mut self, id: ShapeId, state: WidgetState) {
        let focus_before = self.focused;
        if state.is_selected() {
            if !self.selected.contains(&id) {
                self.selected.push(id);
            }
        } else {
            self.selected.retain(|s| *s != id);
        }

        if state.is_editing() {
            self.focused = Some(id);
        } else if self.focused == Some(id) {
            self.focused = None;
        }

        if state == WidgetState::Normal {
            self.states.remove(&id);
        } else {
            self.states.insert(id, state);
        }
        self.track_focus(focus_before);
    }

    fn track_focus(&mut self, before: Option<ShapeId>) {
        if let Some(old) = before {
            if self.focused != Some(old) && !self.ended_edits.contains(&old) {
                log::trace!("Editing of {} ended", old);
                self.ended_edits.push(old);
            }
        }
        if let Some(now) = self.focused {
            self.ended_edits.retain(|id| *id != now);
        }
    }

    /// Shapes that left editing since the last call, oldest first.
    pub fn take_ended_edits(&mut self) -> Vec<ShapeId> {
        std::mem::take(&mut self.ended_edits)
    }

    /// Check if a shape is selected.
    pub fn is_selected(&self, id: ShapeId) -> bool {
        self.selected.contains(&id)
    }

    /// Get all selected shape IDs, in selection order.
    pub fn selected(&self) -> &[ShapeId] {
        &self.selected
    }

    /// Get the focused shape ID (if any).
    pub fn focused(&self) -> Option<ShapeId> {
        self.focused
    }

    /// Select a single shape (clears other selections).
    pub fn select(&mut self, id: ShapeId) {
        self.clear_selection();
        self.add_to_selection(id);
    }

    /// Add a shape to the selection.
    pub fn add_to_selection(&mut self, id: ShapeId) {
        if !self.is_selected(id) {
            self.set_state(id, WidgetState::Selected);
        }
    }

    /// Remove a shape from the selection.
    pub fn deselect(&mut self, id: ShapeId) {
        if self.is_selected(id) {
            self.set_state(id, WidgetState::Normal);
        }
    }

    /// Clear all selections.
    pub fn clear_selection(&mut self) {
        for id in std::mem::take(&mut self.selected) {
            self.set_state(id, WidgetState::Normal);
        }
    }

    /// Enter editing mode for a shape.
    pub fn enter_editing(&mut self, id: ShapeId, kind: EditingKind) {
        if self.focused.is_some_and(|old_id| old_id != id) {
            self.exit_editing();
        }
        self.set_state(id, WidgetState::Editing(kind));
    }

    /// Exit editing mode. Returns the shape that was being edited.
    pub fn exit_editing(&mut self) -> Option<ShapeId> {
        let id = self.focused?;
        self.set_state(id, WidgetState::Selected);
        Some(id)
    }

    /// Check if currently in editing mode.
    pub fn is_editing(&self) -> bool {
        self.focused.is_some()
    }

    /// Check if a specific shape is being edited.
    pub fn is_editing_shape(&self, id: ShapeId) -> bool {
        self.focused == Some(id)
    }

    /// Text selection of the shape being edited.
    pub fn text_selection(&self) -> Option<TextRange> {
        let id = self.focused?;
        match self.states.get(&id)? {
            WidgetState::Editing(EditingKind::Text { selection }) => Some(*selection),
            _ => None,
        }
    }

    /// Replace the text selection of the shape being edited.
    pub fn set_text_selection(&mut self, selection: TextRange) -> bool {
        let Some(id) = self.focused else {
            return false;
        };
        self.states
            .insert(id, WidgetState::Editing(EditingKind::Text { selection }));
        true
    }

    /// Lock or unlock a shape for pointer targeting.
    pub fn set_selectable(&mut self, id: ShapeId, selectable: bool) {
        if selectable {
            self.locked.remove(&id);
        } else {
            self.locked.insert(id);
        }
    }

    pub fn is_selectable(&self, id: ShapeId) -> bool {
        !self.locked.contains(&id)
    }

    /// Remove state for a deleted shape.
    pub fn remove(&mut self, id: ShapeId) {
        let focus_before = self.focused;
        self.states.remove(&id);
        self.selected.retain(|s| *s != id);
        self.locked.remove(&id);
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.track_focus(focus_before);
    }

    /// Drop every piece of UI state. An edit in progress still counts as ended.
    pub fn clear(&mut self) {
        let focus_before = self.focused;
        let ended = std::mem::take(&mut self.ended_edits);
        *self = Self {
            ended_edits: ended,
            ..Self::default()
        };
        self.track_focus(focus_before);
    }

    /// Get handles for a shape if it is selected and not being edited.
    pub fn get_handles(&self, shape: &Shape) -> Vec<Handle> {
        let id = shape.id();
        if !self.is_selected(id) || self.is_editing_shape(id) {
            return vec![];
        }
        Handle::around(shape.bounds())
    }

    /// Hit test the handles of a selected shape.
    pub fn hit_test_handle(&self, shape: &Shape, point: Point, tolerance: f64) -> Option<HandleKind> {
        self.get_handles(shape)
            .into_iter()
            .find(|handle| {
                let dx = point.x - handle.position.x;
                let dy = point.y - handle.position.y;
                dx * dx + dy * dy <= tolerance * tolerance
            })
            .map(|handle| handle.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Rectangle;
    use uuid::Uuid;

    #[test]
    fn test_select_replaces_selection() {
        let mut widgets = WidgetManager::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        widgets.select(a);
        widgets.select(b);
        assert_eq!(widgets.selected(), &[b]);
        assert_eq!(widgets.state(a), WidgetState::Normal);
    }

    #[test]
    fn test_editing_tracks_focus_and_selection() {
        let mut widgets = WidgetManager::new();
        let id = Uuid::new_v4();
        widgets.enter_editing(
            id,
            EditingKind::Text {
                selection: TextRange::all(4),
            },
        );
        assert!(widgets.is_editing_shape(id));
        assert_eq!(widgets.text_selection(), Some(TextRange::all(4)));

        assert_eq!(widgets.exit_editing(), Some(id));
        assert!(!widgets.is_editing());
        assert!(widgets.is_selected(id));
        assert_eq!(widgets.exit_editing(), None);
        assert_eq!(widgets.take_ended_edits(), vec![id]);
        assert!(widgets.take_ended_edits().is_empty());
    }

    #[test]
    fn test_every_way_out_of_editing_is_recorded() {
        let text = TextRange::all(3);
        let editing = EditingKind::Text { selection: text };
        let mut widgets = WidgetManager::new();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        widgets.enter_editing(a, editing.clone());
        widgets.select(b);
        assert_eq!(widgets.take_ended_edits(), vec![a]);

        widgets.enter_editing(a, editing.clone());
        widgets.clear_selection();
        widgets.enter_editing(b, editing.clone());
        widgets.remove(b);
        widgets.enter_editing(c, editing.clone());
        widgets.clear();
        assert_eq!(widgets.take_ended_edits(), vec![a, b, c]);
        assert!(!widgets.is_editing());
    }

    #[test]
    fn test_reentering_editing_forgets_pending_end() {
        let editing = EditingKind::Text {
            selection: TextRange::caret(0),
        };
        let mut widgets = WidgetManager::new();
        let id = Uuid::new_v4();
        widgets.enter_editing(id, editing.clone());
        widgets.exit_editing();
        widgets.enter_editing(id, editing);
        assert!(widgets.take_ended_edits().is_empty());
    }

    #[test]
    fn test_locking() {
        let mut widgets = WidgetManager::new();
        let id = Uuid::new_v4();
        assert!(widgets.is_selectable(id));
        widgets.set_selectable(id, false);
        assert!(!widgets.is_selectable(id));
        widgets.remove(id);
        assert!(widgets.is_selectable(id));
    }

    #[test]
    fn test_handles_only_when_selected() {
        let mut widgets = WidgetManager::new();
        let shape = Shape::Rectangle(Rectangle::new(Point::ZERO, 100.0, 50.0));
        assert!(widgets.get_handles(&shape).is_empty());

        widgets.select(shape.id());
        assert_eq!(widgets.get_handles(&shape).len(), 5);
        assert_eq!(
            widgets.hit_test_handle(&shape, Point::new(101.0, 49.0), 4.0),
            Some(HandleKind::BottomRight)
        );
    }
}
