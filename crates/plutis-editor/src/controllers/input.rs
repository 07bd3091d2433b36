//! Input controller: pointer and keyboard handling on the canvas.
//!
//! Right press opens a context-menu request, left press selects, left drag
//! moves the selection with alignment guides. Keyboard shortcuts cover
//! undo/redo, delete, select-all and escape.

use super::{ControllerOptions, GuidelinesController, HistoryController, ObjectsController};
use crate::error::Result;
use crate::events::EditorEvent;
use crate::state::ContextMenuRequest;
use kurbo::{Affine, Point, Vec2};
use plutis_core::{Key, KeyEvent, MouseButton, PointerInput, ShapeId};
use std::cell::RefCell;

/// An object being dragged with the left button.
#[derive(Debug, Clone, Copy)]
struct Drag {
    id: ShapeId,
    /// Pointer position at press, world coordinates.
    start: Point,
    /// Translation applied so far.
    applied: Vec2,
    /// Whether an undo point was recorded for this drag.
    saved: bool,
}

#[derive(Debug)]
pub struct InputController {
    options: ControllerOptions,
    history: HistoryController,
    objects: ObjectsController,
    guidelines: GuidelinesController,
    drag: RefCell<Option<Drag>>,
}

impl InputController {
    pub fn new(options: ControllerOptions) -> Self {
        Self {
            history: HistoryController::new(options.clone()),
            objects: ObjectsController::new(options.clone()),
            guidelines: GuidelinesController::new(options.clone()),
            options,
            drag: RefCell::new(None),
        }
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.borrow().is_some()
    }

    pub fn mouse_down(&self, e: &PointerInput) -> Result<()> {
        let (world, target, editing) = self.options.canvas.read(|s| {
            let world = s.get_pointer(e.position);
            (world, s.find_target(world), s.editing_object())
        })?;

        match e.button {
            MouseButton::Right => self.request_context_menu(target, e.position),
            MouseButton::Middle => Ok(()),
            MouseButton::Left => {
                self.cancel_context_menu();
                if let Some(editing) = editing {
                    if target == Some(editing) {
                        // Pointer stays inside the text being edited
                        return Ok(());
                    }
                    self.exit_editing()?;
                }
                self.press(target, world, e.modifiers.shift)
            }
        }
    }

    fn press(&self, target: Option<ShapeId>, world: Point, extend: bool) -> Result<()> {
        let Some(id) = target else {
            log::trace!("Press on empty canvas at {:?}", world);
            *self.drag.borrow_mut() = None;
            return self.objects.deselect();
        };

        let selected = self.objects.selection()?;
        if extend {
            self.objects.add_to_selection(id)?;
        } else if !selected.contains(&id) {
            self.objects.select(id)?;
        }
        *self.drag.borrow_mut() = Some(Drag {
            id,
            start: world,
            applied: Vec2::ZERO,
            saved: false,
        });
        Ok(())
    }

    /// Forget the drag in progress without recording anything. Used when a
    /// press turns into a gesture that replaces the pressed object.
    pub fn cancel_drag(&self) {
        if let Some(drag) = self.drag.borrow_mut().take() {
            log::trace!("Drag of {} cancelled", drag.id);
        }
    }

    pub fn mouse_move(&self, e: &PointerInput) -> Result<()> {
        let Some(mut drag) = *self.drag.borrow() else {
            return Ok(());
        };
        let (world, exists) = self
            .options
            .canvas
            .read(|s| (s.get_pointer(e.position), s.get(drag.id).is_some()))?;
        if !exists {
            log::debug!("Dragged object {} is gone, dropping the drag", drag.id);
            self.cancel_drag();
            return Ok(());
        }
        let wanted = (world - drag.start) - drag.applied;
        if wanted.hypot2() < f64::EPSILON {
            return Ok(());
        }

        let step = self.guidelines.compute(drag.id, wanted)?;
        if !drag.saved {
            self.options.canvas.write(|s| s.document.push_undo())?;
            drag.saved = true;
            *self.drag.borrow_mut() = Some(drag);
        }
        self.options.canvas.write(|s| {
            if let Some(shape) = s.get_mut(drag.id) {
                shape.transform(Affine::translate(step));
            }
            s.request_render();
        })?;
        drag.applied += step;
        *self.drag.borrow_mut() = Some(drag);
        Ok(())
    }

    pub fn mouse_up(&self, _e: &PointerInput) -> Result<()> {
        let drag = self.drag.borrow_mut().take();
        self.guidelines.clear()?;
        if let Some(drag) = drag {
            if drag.saved {
                log::debug!("Moved {} by {:?}", drag.id, drag.applied);
                self.options.emit(EditorEvent::ObjectsChanged);
                self.options.emit_history()?;
            }
        }
        Ok(())
    }

    /// Handle a key press. Returns true when the key was consumed.
    pub fn key_down(&self, event: &KeyEvent) -> Result<bool> {
        let editing = self.options.canvas.read(|s| s.editing_object())?;
        if editing.is_some() {
            // Typing belongs to the text editor; only escape leaves it.
            if event.key == Key::Escape {
                self.exit_editing()?;
                return Ok(true);
            }
            return Ok(false);
        }

        let command = event.modifiers.command();
        let shift = event.modifiers.shift;
        match event.key {
            Key::Character(_) if command && event.key.is_char('z') && shift => self.history.redo().map(|_| true),
            Key::Character(_) if command && event.key.is_char('z') => self.history.undo().map(|_| true),
            Key::Character(_) if command && event.key.is_char('y') => self.history.redo().map(|_| true),
            Key::Character(_) if command && event.key.is_char('a') => {
                self.objects.select_all().map(|_| true)
            }
            Key::Delete | Key::Backspace => Ok(self.objects.remove_selected()? > 0),
            Key::Escape => {
                self.cancel_context_menu();
                self.objects.deselect()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn request_context_menu(&self, target: Option<ShapeId>, position: Point) -> Result<()> {
        if let Some(id) = target {
            let selected = self.objects.selection()?;
            if !selected.contains(&id) {
                self.objects.select(id)?;
            }
        }
        let request = ContextMenuRequest { target, position };
        log::debug!("Context menu requested for {:?}", target);
        self.options.state.set_context_menu_request(Some(request.clone()));
        self.options.emit(EditorEvent::ContextMenuRequested(request));
        Ok(())
    }

    fn cancel_context_menu(&self) {
        self.options.state.set_context_menu_request(None);
    }

    fn exit_editing(&self) -> Result<()> {
        self.options.exit_editing()?;
        self.options.sync_selection()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::controllers::test_support::options;
    use plutis_core::shapes::Rectangle;
    use plutis_core::{Modifiers, SerializableColor, Shape, Text};

    fn rect(x: f64, y: f64) -> Shape {
        Shape::Rectangle(
            Rectangle::new(Point::new(x, y), 50.0, 50.0).with_fill(SerializableColor::black()),
        )
    }

    fn setup() -> (Canvas, InputController) {
        let (canvas, options) = options();
        (canvas, InputController::new(options))
    }

    #[test]
    fn test_left_press_selects_and_empty_press_deselects() {
        let (canvas, input) = setup();
        let id = canvas.surface().write(|s| s.add(rect(100.0, 100.0))).unwrap();

        input.mouse_down(&PointerInput::left(Point::new(120.0, 120.0))).unwrap();
        assert_eq!(canvas.surface().read(|s| s.active_objects()).unwrap(), vec![id]);
        input.mouse_up(&PointerInput::left(Point::new(120.0, 120.0))).unwrap();

        input.mouse_down(&PointerInput::left(Point::new(700.0, 500.0))).unwrap();
        assert!(canvas.surface().read(|s| s.active_objects()).unwrap().is_empty());
    }

    #[test]
    fn test_shift_press_extends_selection() {
        let (canvas, input) = setup();
        let (a, b) = canvas
            .surface()
            .write(|s| (s.add(rect(0.0, 0.0)), s.add(rect(200.0, 0.0))))
            .unwrap();

        input.mouse_down(&PointerInput::left(Point::new(10.0, 10.0))).unwrap();
        let shifted = PointerInput::left(Point::new(210.0, 10.0)).with_modifiers(Modifiers {
            shift: true,
            ..Modifiers::NONE
        });
        input.mouse_down(&shifted).unwrap();
        assert_eq!(canvas.surface().read(|s| s.active_objects()).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_right_press_requests_context_menu() {
        let (canvas, input) = setup();
        let id = canvas.surface().write(|s| s.add(rect(100.0, 100.0))).unwrap();

        let e = PointerInput::left(Point::new(110.0, 110.0)).with_button(MouseButton::Right);
        input.mouse_down(&e).unwrap();

        let request = input.options.state.context_menu_request().unwrap();
        assert_eq!(request.target, Some(id));
        assert_eq!(input.options.state.selection(), vec![id]);

        input.mouse_down(&PointerInput::left(Point::new(700.0, 500.0))).unwrap();
        assert!(input.options.state.context_menu_request().is_none());
    }

    #[test]
    fn test_drag_moves_with_single_undo_point() {
        let (canvas, input) = setup();
        let id = canvas.surface().write(|s| s.add(rect(333.0, 333.0))).unwrap();

        input.mouse_down(&PointerInput::left(Point::new(350.0, 350.0))).unwrap();
        assert!(input.is_dragging());
        input.mouse_move(&PointerInput::left(Point::new(351.0, 351.0))).unwrap();
        input.mouse_move(&PointerInput::left(Point::new(352.0, 352.0))).unwrap();
        input.mouse_up(&PointerInput::left(Point::new(352.0, 352.0))).unwrap();

        assert!(!input.is_dragging());
        let surface = canvas.surface();
        let origin = surface.read(|s| s.get(id).map(|shape| shape.bounds().origin())).unwrap();
        assert_eq!(origin, Some(Point::new(335.0, 335.0)));
        assert_eq!(surface.read(|s| s.document.undo_depth()).unwrap(), 1);
        assert!(surface.read(|s| s.guides.is_empty()).unwrap());
    }

    #[test]
    fn test_drag_of_removed_object_records_nothing() {
        let (canvas, input) = setup();
        let surface = canvas.surface();
        let id = surface.write(|s| s.add(rect(100.0, 100.0))).unwrap();

        input.mouse_down(&PointerInput::left(Point::new(120.0, 120.0))).unwrap();
        surface.write(|s| s.remove(id)).unwrap();
        for x in 121..124 {
            input.mouse_move(&PointerInput::left(Point::new(f64::from(x), 120.0))).unwrap();
        }

        assert!(!input.is_dragging());
        assert_eq!(surface.read(|s| s.document.undo_depth()).unwrap(), 0);
    }

    #[test]
    fn test_cancelled_drag_ignores_moves() {
        let (canvas, input) = setup();
        let surface = canvas.surface();
        let id = surface.write(|s| s.add(rect(100.0, 100.0))).unwrap();

        input.mouse_down(&PointerInput::left(Point::new(120.0, 120.0))).unwrap();
        input.cancel_drag();
        input.mouse_move(&PointerInput::left(Point::new(150.0, 150.0))).unwrap();
        input.mouse_up(&PointerInput::left(Point::new(150.0, 150.0))).unwrap();

        let origin = surface.read(|s| s.get(id).map(|shape| shape.bounds().origin())).unwrap();
        assert_eq!(origin, Some(Point::new(100.0, 100.0)));
        assert_eq!(surface.read(|s| s.document.undo_depth()).unwrap(), 0);
    }

    #[test]
    fn test_keyboard_shortcuts() {
        let (canvas, input) = setup();
        let id = canvas.surface().write(|s| s.add(rect(0.0, 0.0))).unwrap();

        assert!(input.key_down(&KeyEvent::command(Key::Character('a'))).unwrap());
        assert_eq!(canvas.surface().read(|s| s.active_objects()).unwrap(), vec![id]);

        assert!(input.key_down(&KeyEvent::new(Key::Delete)).unwrap());
        assert!(canvas.surface().read(|s| s.document.is_empty()).unwrap());

        assert!(input.key_down(&KeyEvent::command(Key::Character('z'))).unwrap());
        assert!(!canvas.surface().read(|s| s.document.is_empty()).unwrap());

        assert!(input.key_down(&KeyEvent::command(Key::Character('y'))).unwrap());
        assert!(canvas.surface().read(|s| s.document.is_empty()).unwrap());

        assert!(!input.key_down(&KeyEvent::new(Key::Character('q'))).unwrap());
    }

    #[test]
    fn test_escape_leaves_editing() {
        let (canvas, input) = setup();
        let surface = canvas.surface();
        let id = surface
            .write(|s| {
                let id = s.add(Shape::Text(Text::new(Point::ZERO, "abc".into())));
                s.set_active_object(id);
                s.enter_editing(id);
                id
            })
            .unwrap();

        // Shortcuts are ignored while typing
        assert!(!input.key_down(&KeyEvent::new(Key::Delete)).unwrap());
        assert!(input.key_down(&KeyEvent::new(Key::Escape)).unwrap());
        assert!(!surface.read(|s| s.is_editing(id)).unwrap());
        assert_eq!(surface.read(|s| s.active_objects()).unwrap(), vec![id]);
    }
}
