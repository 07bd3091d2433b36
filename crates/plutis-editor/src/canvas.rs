//! Canvas wrapper: owns the drawing surface and its native event listeners.

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use kurbo::{Point, Rect};
use plutis_core::{Camera, ClickTracker, PointerInput, ShapeId, Surface};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Shared handle to the drawing surface.
///
/// Every controller holds a clone. After [`Canvas::destroy`] the surface is
/// gone and all access fails with [`EditorError::Destroyed`].
#[derive(Clone, Default)]
pub struct SurfaceHandle(Rc<RefCell<Option<Surface>>>);

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl SurfaceHandle {
    pub fn new(surface: Surface) -> Self {
        Self(Rc::new(RefCell::new(Some(surface))))
    }

    /// Run `f` with shared access to the surface.
    pub fn read<R>(&self, f: impl FnOnce(&Surface) -> R) -> Result<R> {
        let guard = self.0.borrow();
        let surface = guard.as_ref().ok_or(EditorError::Destroyed)?;
        Ok(f(surface))
    }

    /// Run `f` with exclusive access to the surface.
    pub fn write<R>(&self, f: impl FnOnce(&mut Surface) -> R) -> Result<R> {
        let mut guard = self.0.borrow_mut();
        let surface = guard.as_mut().ok_or(EditorError::Destroyed)?;
        Ok(f(surface))
    }

    pub fn is_alive(&self) -> bool {
        self.0.borrow().is_some()
    }

    pub fn ptr_eq(&self, other: &SurfaceHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn release(&self) -> Option<Surface> {
        self.0.borrow_mut().take()
    }
}

/// Raw events delivered by the drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    MouseDown(PointerInput),
    MouseMove(PointerInput),
    MouseUp(PointerInput),
    /// Double click; `target` is the topmost selectable object under the pointer.
    MouseDblClick {
        target: Option<ShapeId>,
        e: PointerInput,
    },
    /// An object left in-place editing.
    EditingExited { target: ShapeId },
}

/// Discriminant of [`NativeEvent`], used to register listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeEventKind {
    MouseDown,
    MouseMove,
    MouseUp,
    MouseDblClick,
    EditingExited,
}

impl NativeEvent {
    pub fn kind(&self) -> NativeEventKind {
        match self {
            NativeEvent::MouseDown(_) => NativeEventKind::MouseDown,
            NativeEvent::MouseMove(_) => NativeEventKind::MouseMove,
            NativeEvent::MouseUp(_) => NativeEventKind::MouseUp,
            NativeEvent::MouseDblClick { .. } => NativeEventKind::MouseDblClick,
            NativeEvent::EditingExited { .. } => NativeEventKind::EditingExited,
        }
    }
}

/// Handle for removing a native listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

type NativeHandler = Rc<dyn Fn(&NativeEvent)>;

/// The editor's canvas: the surface plus the native listener registry.
pub struct Canvas {
    id: String,
    surface: SurfaceHandle,
    listeners: RefCell<Vec<(ListenerId, NativeEventKind, NativeHandler)>>,
    clicks: RefCell<ClickTracker>,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("id", &self.id)
            .field("surface", &self.surface)
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl Canvas {
    /// Build the surface described by `config`.
    pub fn new(config: &EditorConfig) -> Self {
        let mut surface = Surface::new(config.viewport_size);
        surface.frame = Rect::from_origin_size(Point::ZERO, config.frame_size);
        surface.background = config.background;
        surface.camera = Camera::with_limits(config.min_zoom, config.max_zoom);
        surface.document.set_history_limit(config.history_limit);
        log::debug!("Canvas {} created", config.id);
        Self {
            id: config.id.clone(),
            surface: SurfaceHandle::new(surface),
            listeners: RefCell::new(Vec::new()),
            clicks: RefCell::new(ClickTracker::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Handle to the underlying surface, shared with the controllers.
    pub fn surface(&self) -> SurfaceHandle {
        self.surface.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        !self.surface.is_alive()
    }

    /// Register a listener for one kind of native event.
    pub fn on<F>(&self, kind: NativeEventKind, handler: F) -> ListenerId
    where
        F: Fn(&NativeEvent) + 'static,
    {
        let id = ListenerId(Uuid::new_v4());
        self.listeners.borrow_mut().push((id, kind, Rc::new(handler)));
        id
    }

    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener, _, _)| *listener != id);
        listeners.len() != before
    }

    /// Deliver a native event to its listeners, in registration order.
    /// Returns how many listeners ran.
    pub fn dispatch(&self, event: NativeEvent) -> Result<usize> {
        if !self.surface.is_alive() {
            return Err(EditorError::Destroyed);
        }
        let kind = event.kind();
        let handlers: Vec<NativeHandler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, handler)| Rc::clone(handler))
            .collect();
        log::trace!("Dispatching {:?} to {} listener(s)", kind, handlers.len());
        for handler in &handlers {
            handler(&event);
        }
        Ok(handlers.len())
    }

    /// Host entry point for a pointer press. A second left press close in
    /// time and space also produces a double click.
    pub fn pointer_down(&self, e: PointerInput) -> Result<()> {
        self.dispatch(NativeEvent::MouseDown(e))?;
        if e.button == plutis_core::MouseButton::Left && self.clicks.borrow_mut().click(e.position) {
            self.dispatch_double_click(e)?;
        }
        Ok(())
    }

    pub fn pointer_move(&self, e: PointerInput) -> Result<()> {
        self.dispatch(NativeEvent::MouseMove(e)).map(|_| ())
    }

    pub fn pointer_up(&self, e: PointerInput) -> Result<()> {
        self.dispatch(NativeEvent::MouseUp(e)).map(|_| ())
    }

    /// Deliver a double click at a screen position, targeting the topmost
    /// selectable object there.
    pub fn double_click(&self, screen_point: Point) -> Result<()> {
        self.clicks.borrow_mut().reset();
        self.dispatch_double_click(PointerInput::left(screen_point))
    }

    fn dispatch_double_click(&self, e: PointerInput) -> Result<()> {
        let target = self.surface.read(|s| s.find_target(s.get_pointer(e.position)))?;
        self.dispatch(NativeEvent::MouseDblClick { target, e }).map(|_| ())
    }

    /// Leave in-place editing and notify listeners.
    /// Returns the object that was being edited.
    pub fn exit_editing(&self) -> Result<Option<ShapeId>> {
        let exited = self.surface.write(|s| {
            let exited = s.exit_editing();
            if exited.is_some() {
                s.request_render();
            }
            exited
        })?;
        self.flush_editing_exits()?;
        Ok(exited)
    }

    /// Deliver `EditingExited` for every edit that ended on the surface since
    /// the last flush, however it ended. Returns the exited objects.
    pub fn flush_editing_exits(&self) -> Result<Vec<ShapeId>> {
        let mut flushed = Vec::new();
        loop {
            let ended = self.surface.write(Surface::take_ended_edits)?;
            if ended.is_empty() {
                return Ok(flushed);
            }
            for target in ended {
                self.dispatch(NativeEvent::EditingExited { target })?;
                flushed.push(target);
            }
        }
    }

    /// Release the surface and drop every listener.
    pub fn destroy(&self) -> Result<()> {
        let surface = self.surface.release().ok_or(EditorError::Destroyed)?;
        self.listeners.borrow_mut().clear();
        log::debug!(
            "Canvas {} destroyed with {} object(s)",
            self.id,
            surface.document.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plutis_core::shapes::{Rectangle, Text};
    use plutis_core::{SerializableColor, Shape};
    use std::cell::Cell;

    fn canvas() -> Canvas {
        let config = EditorConfig {
            id: "test".into(),
            ..Default::default()
        };
        Canvas::new(&config)
    }

    #[test]
    fn test_surface_follows_config() {
        let canvas = canvas();
        let frame = canvas.surface().read(|s| s.frame).unwrap();
        assert!((frame.width() - 1200.0).abs() < f64::EPSILON);
        assert_eq!(canvas.id(), "test");
    }

    #[test]
    fn test_dispatch_by_kind() {
        let canvas = canvas();
        let downs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&downs);
        canvas.on(NativeEventKind::MouseDown, move |_| counter.set(counter.get() + 1));

        canvas.pointer_down(PointerInput::left(Point::ZERO)).unwrap();
        canvas.pointer_up(PointerInput::left(Point::ZERO)).unwrap();
        assert_eq!(downs.get(), 1);
    }

    #[test]
    fn test_double_click_resolves_target() {
        let canvas = canvas();
        let rect = Shape::Rectangle(
            Rectangle::new(Point::new(10.0, 10.0), 50.0, 50.0).with_fill(SerializableColor::black()),
        );
        let id = canvas.surface().write(|s| s.add(rect)).unwrap();

        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        canvas.on(NativeEventKind::MouseDblClick, move |event| {
            if let NativeEvent::MouseDblClick { target, .. } = event {
                *sink.borrow_mut() = Some(*target);
            }
        });

        canvas.double_click(Point::new(30.0, 30.0)).unwrap();
        assert_eq!(*seen.borrow(), Some(Some(id)));

        canvas.double_click(Point::new(500.0, 500.0)).unwrap();
        assert_eq!(*seen.borrow(), Some(None));
    }

    #[test]
    fn test_two_quick_presses_make_a_double_click() {
        let canvas = canvas();
        let doubles = Rc::new(Cell::new(0));
        let counter = Rc::clone(&doubles);
        canvas.on(NativeEventKind::MouseDblClick, move |_| counter.set(counter.get() + 1));

        let e = PointerInput::left(Point::new(5.0, 5.0));
        canvas.pointer_down(e).unwrap();
        canvas.pointer_down(e).unwrap();
        assert_eq!(doubles.get(), 1);
    }

    #[test]
    fn test_implicit_exits_are_flushed_once() {
        let canvas = canvas();
        let text = Shape::Text(Text::new(Point::ZERO, "Note".to_string()));
        let id = canvas.surface().write(|s| s.add(text)).unwrap();

        let exits = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&exits);
        canvas.on(NativeEventKind::EditingExited, move |event| {
            if let NativeEvent::EditingExited { target } = event {
                sink.borrow_mut().push(*target);
            }
        });

        canvas.surface().write(|s| s.enter_editing(id)).unwrap();
        canvas.surface().write(Surface::discard_active_object).unwrap();
        assert_eq!(canvas.flush_editing_exits().unwrap(), vec![id]);
        assert!(canvas.flush_editing_exits().unwrap().is_empty());

        canvas.surface().write(|s| s.enter_editing(id)).unwrap();
        assert_eq!(canvas.exit_editing().unwrap(), Some(id));
        assert_eq!(*exits.borrow(), vec![id, id]);
    }

    #[test]
    fn test_off_removes_listener() {
        let canvas = canvas();
        let id = canvas.on(NativeEventKind::MouseMove, |_| {});
        assert!(canvas.off(id));
        assert_eq!(
            canvas
                .dispatch(NativeEvent::MouseMove(PointerInput::left(Point::ZERO)))
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_destroy_releases_surface() {
        let canvas = canvas();
        let handle = canvas.surface();
        canvas.destroy().unwrap();

        assert!(canvas.is_destroyed());
        assert!(matches!(handle.read(|s| s.document.len()), Err(EditorError::Destroyed)));
        assert!(matches!(canvas.destroy(), Err(EditorError::Destroyed)));
        assert!(matches!(
            canvas.pointer_down(PointerInput::left(Point::ZERO)),
            Err(EditorError::Destroyed)
        ));
    }
}
