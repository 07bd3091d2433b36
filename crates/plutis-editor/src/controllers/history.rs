//! History controller: snapshot undo/redo over the document.

use super::ControllerOptions;
use crate::error::Result;
use crate::events::EditorEvent;

#[derive(Debug)]
pub struct HistoryController {
    options: ControllerOptions,
}

impl HistoryController {
    pub fn new(options: ControllerOptions) -> Self {
        Self { options }
    }

    /// Record the current document as an undo point.
    pub fn save(&self) -> Result<()> {
        self.options.canvas.write(|s| s.document.push_undo())?;
        self.options.emit_history()
    }

    pub fn undo(&self) -> Result<bool> {
        self.step(true)
    }

    pub fn redo(&self) -> Result<bool> {
        self.step(false)
    }

    fn step(&self, undo: bool) -> Result<bool> {
        let available = self
            .options
            .canvas
            .read(|s| if undo { s.document.can_undo() } else { s.document.can_redo() })?;
        if !available {
            return Ok(false);
        }
        // Close the edit first so its listeners see the document it belongs to.
        self.options.exit_editing()?;
        let changed = self.options.canvas.write(|s| {
            let changed = if undo { s.document.undo() } else { s.document.redo() };
            if changed {
                // Selection may point at objects that no longer exist.
                s.discard_active_object();
                s.render_all();
            }
            changed
        })?;
        if changed {
            log::debug!("{} applied", if undo { "Undo" } else { "Redo" });
            self.options.flush_editing_exits()?;
            self.options.sync_selection()?;
            self.options.emit(EditorEvent::ObjectsChanged);
            self.options.emit_history()?;
        }
        Ok(changed)
    }

    pub fn can_undo(&self) -> Result<bool> {
        self.options.canvas.read(|s| s.document.can_undo())
    }

    pub fn can_redo(&self) -> Result<bool> {
        self.options.canvas.read(|s| s.document.can_redo())
    }

    /// Forget every undo and redo state.
    pub fn reset(&self) -> Result<()> {
        self.options.canvas.write(|s| s.document.clear_history())?;
        self.options.emit_history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::options;
    use kurbo::Point;
    use plutis_core::shapes::Rectangle;
    use plutis_core::{Shape, Text};

    fn rect() -> Shape {
        Shape::Rectangle(Rectangle::new(Point::ZERO, 10.0, 10.0))
    }

    #[test]
    fn test_undo_redo() {
        let (canvas, options) = options();
        let history = HistoryController::new(options);
        let surface = canvas.surface();

        history.save().unwrap();
        surface.write(|s| s.add(rect())).unwrap();

        assert!(history.can_undo().unwrap());
        assert!(history.undo().unwrap());
        assert_eq!(surface.read(|s| s.document.len()).unwrap(), 0);
        assert!(history.can_redo().unwrap());

        assert!(history.redo().unwrap());
        assert_eq!(surface.read(|s| s.document.len()).unwrap(), 1);
        assert!(!history.redo().unwrap());
    }

    #[test]
    fn test_limit_comes_from_config() {
        let (canvas, options) = options();
        let limit = options.config.history_limit;
        let history = HistoryController::new(options);

        for _ in 0..limit + 10 {
            history.save().unwrap();
        }
        assert_eq!(canvas.surface().read(|s| s.document.undo_depth()).unwrap(), limit);
    }

    #[test]
    fn test_undo_leaves_editing() {
        let (canvas, options) = options();
        let history = HistoryController::new(options);
        let surface = canvas.surface();
        let text = surface
            .write(|s| s.add(Shape::Text(Text::new(Point::ZERO, "Hi".into()))))
            .unwrap();
        history.save().unwrap();
        surface.write(|s| s.enter_editing(text)).unwrap();

        assert!(history.undo().unwrap());
        surface
            .read(|s| {
                assert_eq!(s.editing_object(), None);
                assert!(s.active_objects().is_empty());
            })
            .unwrap();
        assert!(surface.write(|s| s.take_ended_edits()).unwrap().is_empty());
    }

    #[test]
    fn test_reset() {
        let (_canvas, options) = options();
        let history = HistoryController::new(options);
        history.save().unwrap();
        history.reset().unwrap();
        assert!(!history.can_undo().unwrap());
        assert!(!history.undo().unwrap());
    }
}
