//! Shared editor state.

use crate::editor::Editor;
use crate::error::{EditorError, Result};
use kurbo::Point;
use plutis_core::ShapeId;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A pending request to open a context menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMenuRequest {
    /// Object under the pointer, if any.
    pub target: Option<ShapeId>,
    /// Pointer position in screen coordinates.
    pub position: Point,
}

/// Mutable state shared by the editor and every controller.
#[derive(Debug, Default)]
pub struct EditorState {
    editor: Option<Weak<Editor>>,
    context_menu_request: Option<ContextMenuRequest>,
    selection: Vec<ShapeId>,
}

/// Cheap, clonable handle to one [`EditorState`].
#[derive(Debug, Clone, Default)]
pub struct SharedState(Rc<RefCell<EditorState>>);

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the owning editor. Only the first call succeeds.
    pub fn set_editor(&self, editor: Weak<Editor>) -> Result<()> {
        let mut state = self.0.borrow_mut();
        if state.editor.is_some() {
            return Err(EditorError::AlreadyBound);
        }
        state.editor = Some(editor);
        Ok(())
    }

    /// The owning editor, while it is alive.
    pub fn editor(&self) -> Option<Rc<Editor>> {
        self.0.borrow().editor.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_bound(&self) -> bool {
        self.0.borrow().editor.is_some()
    }

    pub fn context_menu_request(&self) -> Option<ContextMenuRequest> {
        self.0.borrow().context_menu_request.clone()
    }

    pub fn set_context_menu_request(&self, request: Option<ContextMenuRequest>) {
        self.0.borrow_mut().context_menu_request = request;
    }

    /// Active selection, in selection order.
    pub fn selection(&self) -> Vec<ShapeId> {
        self.0.borrow().selection.clone()
    }

    pub fn set_selection(&self, selection: Vec<ShapeId>) {
        self.0.borrow_mut().selection = selection;
    }

    /// Whether both handles point at the same state.
    pub fn ptr_eq(&self, other: &SharedState) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_editor_only_once() {
        let state = SharedState::new();
        assert!(!state.is_bound());
        state.set_editor(Weak::new()).unwrap();
        assert!(state.is_bound());
        assert!(matches!(
            state.set_editor(Weak::new()),
            Err(EditorError::AlreadyBound)
        ));
        // A dangling back-reference never upgrades
        assert!(state.editor().is_none());
    }

    #[test]
    fn test_context_menu_request() {
        let state = SharedState::new();
        let request = ContextMenuRequest {
            target: None,
            position: Point::new(10.0, 20.0),
        };
        state.set_context_menu_request(Some(request.clone()));
        assert_eq!(state.context_menu_request(), Some(request));
        state.set_context_menu_request(None);
        assert_eq!(state.context_menu_request(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let state = SharedState::new();
        let other = state.clone();
        let id = uuid::Uuid::new_v4();
        other.set_selection(vec![id]);
        assert_eq!(state.selection(), vec![id]);
        assert!(state.ptr_eq(&other));
        assert!(!state.ptr_eq(&SharedState::new()));
    }
}
