//! The editor: owns the canvas, the controllers and the event hub.

use crate::canvas::{Canvas, NativeEvent, NativeEventKind};
use crate::config::{EditorConfig, PartialEditorConfig};
use crate::controllers::{
    ControllerOptions, FrameController, GuidelinesController, HistoryController,
    InputController, ObjectsController, PersonalizationController, RendererController,
    SceneController, ZoomController,
};
use crate::error::{EditorError, Result};
use crate::events::{EditorEvent, EventFilter, EventManager, SubscriptionId};
use crate::group_edit::GroupEditor;
use crate::state::SharedState;
use plutis_core::{Shape, ShapeId};
use std::fmt;
use std::rc::{Rc, Weak};

/// Construction options for [`Editor::new`].
#[derive(Debug, Clone, Default)]
pub struct EditorOptions {
    /// Canvas id; always overrides any id in `config`.
    pub id: String,
    /// State to adopt. A fresh one is created when absent.
    pub state: Option<SharedState>,
    pub config: PartialEditorConfig,
}

impl EditorOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_state(mut self, state: SharedState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_config(mut self, config: PartialEditorConfig) -> Self {
        self.config = config;
        self
    }
}

/// A design editor bound to one canvas.
pub struct Editor {
    config: Rc<EditorConfig>,
    state: SharedState,
    canvas: Canvas,
    events: EventManager,
    frame: FrameController,
    zoom: ZoomController,
    history: HistoryController,
    objects: ObjectsController,
    scene: SceneController,
    renderer: RendererController,
    personalization: PersonalizationController,
    guidelines: GuidelinesController,
    input: Rc<InputController>,
    group_edit: Rc<GroupEditor>,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("id", &self.config.id)
            .field("canvas", &self.canvas)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Report a failure inside a native listener, which has nowhere to return it.
fn log_failure(what: &str, result: Result<impl Sized>) {
    if let Err(err) = result {
        log::warn!("{} failed: {}", what, err);
    }
}

impl Editor {
    /// Build an editor. The state's back-reference is bound last, so it
    /// cannot be observed half-built.
    pub fn new(options: EditorOptions) -> Result<Rc<Editor>> {
        let EditorOptions { id, state, config } = options;
        let config = Rc::new(EditorConfig::merged(config, &id));
        let state = state.unwrap_or_default();
        if state.is_bound() {
            return Err(EditorError::AlreadyBound);
        }

        let editor = Rc::new_cyclic(|weak: &Weak<Editor>| {
            let canvas = Canvas::new(&config);
            let options = ControllerOptions {
                canvas: canvas.surface(),
                editor: weak.clone(),
                config: Rc::clone(&config),
                state: state.clone(),
            };

            let frame = FrameController::new(options.clone());
            let zoom = ZoomController::new(options.clone());
            let history = HistoryController::new(options.clone());
            let objects = ObjectsController::new(options.clone());
            let scene = SceneController::new(options.clone());
            let renderer = RendererController::new(options.clone());
            let personalization = PersonalizationController::new(options.clone());
            let guidelines = GuidelinesController::new(options.clone());
            let input = Rc::new(InputController::new(options.clone()));
            let group_edit = Rc::new(GroupEditor::new(options));

            bind_native_events(&canvas, &input, &group_edit);

            Editor {
                config: Rc::clone(&config),
                state: state.clone(),
                canvas,
                events: EventManager::new(),
                frame,
                zoom,
                history,
                objects,
                scene,
                renderer,
                personalization,
                guidelines,
                input,
                group_edit,
            }
        });

        state.set_editor(Rc::downgrade(&editor))?;
        log::debug!("Editor {} ready", editor.config.id);
        Ok(editor)
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn frame(&self) -> &FrameController {
        &self.frame
    }

    pub fn zoom(&self) -> &ZoomController {
        &self.zoom
    }

    pub fn history(&self) -> &HistoryController {
        &self.history
    }

    pub fn objects(&self) -> &ObjectsController {
        &self.objects
    }

    pub fn scene(&self) -> &SceneController {
        &self.scene
    }

    pub fn renderer(&self) -> &RendererController {
        &self.renderer
    }

    pub fn personalization(&self) -> &PersonalizationController {
        &self.personalization
    }

    pub fn guidelines(&self) -> &GuidelinesController {
        &self.guidelines
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn group_edit(&self) -> &GroupEditor {
        &self.group_edit
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn canvas_id(&self) -> &str {
        self.canvas.id()
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.canvas.is_destroyed() {
            return Err(EditorError::Destroyed);
        }
        Ok(())
    }

    /// Subscribe to editor events.
    pub fn on<F>(&self, filter: EventFilter, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&EditorEvent) + 'static,
    {
        self.ensure_alive()?;
        Ok(self.events.subscribe(filter, handler))
    }

    pub fn off(&self, id: SubscriptionId) -> Result<bool> {
        self.ensure_alive()?;
        Ok(self.events.unsubscribe(id))
    }

    /// Publish an event to subscribers. Returns how many received it.
    pub fn emit(&self, event: EditorEvent) -> Result<usize> {
        self.ensure_alive()?;
        Ok(self.publish(&event))
    }

    pub(crate) fn publish(&self, event: &EditorEvent) -> usize {
        self.events.publish(event)
    }

    /// Log the object list and a JSON snapshot of the scene.
    pub fn debug(&self) -> Result<()> {
        let objects: Vec<(ShapeId, &'static str)> = self.canvas.surface().read(|s| {
            s.objects()
                .map(|shape: &Shape| (shape.id(), shape.kind().name()))
                .collect()
        })?;
        log::info!("Editor {}: {} object(s)", self.config.id, objects.len());
        for (id, kind) in &objects {
            log::info!("  {} {}", kind, id);
        }
        log::info!("Scene: {}", self.scene.to_json()?);
        Ok(())
    }

    /// Drop any pending context-menu request.
    pub fn cancel_context_menu_request(&self) -> Result<()> {
        self.ensure_alive()?;
        self.state.set_context_menu_request(None);
        Ok(())
    }

    /// Cancel the in-place edit of `text_id`, regrouping its members.
    pub fn cancel_group_edit(&self, text_id: ShapeId) -> Result<bool> {
        self.group_edit.cancel(text_id)
    }

    /// Cancel edit sessions open longer than the configured timeout.
    pub fn reap_stuck_edits(&self) -> Result<usize> {
        self.group_edit.reap(self.config.edit_timeout())
    }

    /// Release the canvas. Every later call that needs it fails with
    /// [`EditorError::Destroyed`], including a second `destroy`.
    pub fn destroy(&self) -> Result<()> {
        self.canvas.destroy()?;
        self.group_edit.abandon_all();
        self.events.clear();
        self.state.set_context_menu_request(None);
        log::debug!("Editor {} destroyed", self.config.id);
        Ok(())
    }
}

/// Route native canvas events to the controllers that handle them.
fn bind_native_events(canvas: &Canvas, input: &Rc<InputController>, group_edit: &Rc<GroupEditor>) {
    let handler = Rc::clone(input);
    canvas.on(NativeEventKind::MouseDown, move |event| {
        if let NativeEvent::MouseDown(e) = event {
            log_failure("mouse down", handler.mouse_down(e));
        }
    });
    let handler = Rc::clone(input);
    canvas.on(NativeEventKind::MouseMove, move |event| {
        if let NativeEvent::MouseMove(e) = event {
            log_failure("mouse move", handler.mouse_move(e));
        }
    });
    let handler = Rc::clone(input);
    canvas.on(NativeEventKind::MouseUp, move |event| {
        if let NativeEvent::MouseUp(e) = event {
            log_failure("mouse up", handler.mouse_up(e));
        }
    });
    let handler = Rc::clone(group_edit);
    let dragging = Rc::clone(input);
    canvas.on(NativeEventKind::MouseDblClick, move |event| {
        if let NativeEvent::MouseDblClick { target, e } = event {
            match handler.handle_double_click(*target, e) {
                // The pressed group no longer exists.
                Ok(Some(_)) => dragging.cancel_drag(),
                Ok(None) => {}
                Err(err) => log::warn!("double click failed: {}", err),
            }
        }
    });
    let handler = Rc::clone(group_edit);
    canvas.on(NativeEventKind::EditingExited, move |event| {
        if let NativeEvent::EditingExited { target } = event {
            log_failure("editing exit", handler.handle_editing_exited(*target));
        }
    });
}
