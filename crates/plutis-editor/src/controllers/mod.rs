//! Controllers: one per editing concern, all sharing the same surface,
//! state and configuration.

mod frame;
mod guidelines;
mod history;
mod input;
mod objects;
mod personalization;
mod renderer;
mod scene;
mod zoom;

pub use frame::FrameController;
pub use guidelines::GuidelinesController;
pub use history::HistoryController;
pub use input::InputController;
pub use objects::ObjectsController;
pub use personalization::PersonalizationController;
pub use renderer::{DisplayItem, DisplayList, RenderBackend, RenderContext, RendererController};
pub use scene::{FrameDescription, SceneController, SceneDescription};
pub use zoom::ZoomController;

use crate::canvas::SurfaceHandle;
use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::error::Result;
use crate::events::EditorEvent;
use crate::state::SharedState;
use plutis_core::{ShapeId, Surface};
use std::rc::{Rc, Weak};

/// The bundle every controller is built from.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub canvas: SurfaceHandle,
    /// Back-reference to the owning editor; dangling until construction ends.
    pub editor: Weak<Editor>,
    pub config: Rc<EditorConfig>,
    pub state: SharedState,
}

impl ControllerOptions {
    /// Publish through the owning editor. A no-op while the editor is
    /// still being built.
    pub(crate) fn emit(&self, event: EditorEvent) {
        match self.editor.upgrade() {
            Some(editor) => {
                editor.publish(&event);
            }
            None => log::trace!("Dropping {} emitted before the editor is ready", event.name()),
        }
    }

    /// Copy the surface's active objects into the shared state and announce them.
    pub(crate) fn sync_selection(&self) -> Result<Vec<ShapeId>> {
        let ids = self.canvas.read(|s| s.active_objects())?;
        if ids != self.state.selection() {
            self.state.set_selection(ids.clone());
            self.emit(EditorEvent::SelectionChanged { ids: ids.clone() });
        }
        Ok(ids)
    }

    /// Notify exit listeners of every edit that ended since the last flush.
    /// Without an editor there are no listeners and the ended edits are dropped.
    pub(crate) fn flush_editing_exits(&self) -> Result<()> {
        match self.editor.upgrade() {
            Some(editor) => {
                editor.canvas().flush_editing_exits()?;
            }
            None => {
                let ended = self.canvas.write(Surface::take_ended_edits)?;
                if !ended.is_empty() {
                    log::trace!("No editor to notify of {} ended edit(s)", ended.len());
                }
            }
        }
        Ok(())
    }

    /// Leave in-place editing, letting exit listeners run before returning.
    pub(crate) fn exit_editing(&self) -> Result<Option<ShapeId>> {
        if let Some(editor) = self.editor.upgrade() {
            return editor.canvas().exit_editing();
        }
        let exited = self.canvas.write(|s| {
            let exited = s.exit_editing();
            if exited.is_some() {
                s.request_render();
            }
            exited
        })?;
        self.flush_editing_exits()?;
        Ok(exited)
    }

    /// Announce the undo/redo availability after a document change.
    pub(crate) fn emit_history(&self) -> Result<()> {
        let (can_undo, can_redo) = self
            .canvas
            .read(|s| (s.document.can_undo(), s.document.can_redo()))?;
        self.emit(EditorEvent::HistoryChanged { can_undo, can_redo });
        Ok(())
    }
}
