//! Renderer controller and the render backend abstraction.

use super::ControllerOptions;
use crate::error::Result;
use crate::events::EditorEvent;
use kurbo::{Affine, BezPath, Point, Rect, Size};
use peniko::Color;
use plutis_core::{GuideLine, Handle, Shape, ShapeId, ShapeTrait, Surface, TextRange};
use std::cell::RefCell;
use std::fmt;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The surface to render.
    pub surface: &'a Surface,
    /// Viewport size in physical pixels.
    pub viewport_size: Size,
    /// Frame background color.
    pub background_color: Color,
    /// Selection highlight color.
    pub selection_color: Color,
    /// Shape being edited in place; backends draw an editor for it.
    pub editing_shape_id: Option<ShapeId>,
    /// Alignment guides in world coordinates.
    pub guides: Vec<GuideLine>,
}

impl<'a> RenderContext<'a> {
    pub fn new(surface: &'a Surface, viewport_size: Size) -> Self {
        Self {
            surface,
            viewport_size,
            background_color: surface.background.into(),
            selection_color: Color::from_rgba8(59, 130, 246, 255), // Blue
            editing_shape_id: None,
            guides: Vec::new(),
        }
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    /// Set the shape ID being edited.
    pub fn with_editing_shape(mut self, shape_id: Option<ShapeId>) -> Self {
        self.editing_shape_id = shape_id;
        self
    }

    pub fn with_guides(mut self, guides: Vec<GuideLine>) -> Self {
        self.guides = guides;
        self
    }

    /// World to screen transform for this frame.
    pub fn view_transform(&self) -> Affine {
        self.surface.camera.transform()
    }
}

/// Trait for rendering backends.
pub trait RenderBackend {
    /// Build the drawing commands for a frame.
    fn build_scene(&mut self, ctx: &RenderContext);
}

/// One recorded drawing command, in world coordinates.
#[derive(Debug, Clone)]
pub enum DisplayItem {
    /// Clear the viewport.
    Clear(Color),
    /// The design page.
    Frame { rect: Rect, fill: Color },
    Path {
        id: ShapeId,
        path: BezPath,
        fill: Option<Color>,
        stroke: Color,
        stroke_width: f64,
    },
    Text {
        id: ShapeId,
        origin: Point,
        content: String,
        font_size: f64,
    },
    /// Text being edited, with the selected character range.
    TextEditor {
        id: ShapeId,
        bounds: Rect,
        selection: TextRange,
    },
    /// Selection outline and its handles.
    Selection {
        id: ShapeId,
        bounds: Rect,
        handles: Vec<Handle>,
        color: Color,
    },
    Guide(GuideLine),
}

/// Backend that records draw commands instead of rasterizing them.
/// Hosts walk the list with their own painter; tests inspect it.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    items: Vec<DisplayItem>,
    transform: Affine,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    /// View transform used for the last frame.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    fn push_shape(&mut self, shape: &Shape, parent: Affine) {
        match shape {
            Shape::Group(group) => {
                let matrix = parent * group.calc_transform_matrix();
                for member in group.members() {
                    self.push_shape(member, matrix);
                }
            }
            Shape::Text(text) => {
                self.items.push(DisplayItem::Text {
                    id: text.id(),
                    origin: parent * text.position,
                    content: text.content().to_string(),
                    font_size: text.font_size,
                });
            }
            _ => {
                let style = shape.style();
                self.items.push(DisplayItem::Path {
                    id: shape.id(),
                    path: parent * shape.to_path(),
                    fill: style.fill_with_opacity(),
                    stroke: style.stroke(),
                    stroke_width: style.stroke_width,
                });
            }
        }
    }
}

impl RenderBackend for DisplayList {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.items.clear();
        self.transform = ctx.view_transform();
        let surface = ctx.surface;

        self.items.push(DisplayItem::Clear(Color::from_rgba8(240, 240, 240, 255)));
        self.items.push(DisplayItem::Frame {
            rect: surface.frame,
            fill: ctx.background_color,
        });

        for shape in surface.objects() {
            self.push_shape(shape, Affine::IDENTITY);
        }

        if let Some(id) = ctx.editing_shape_id {
            let editor = surface.get(id).zip(surface.text_selection());
            if let Some((shape, selection)) = editor {
                self.items.push(DisplayItem::TextEditor {
                    id,
                    bounds: shape.bounds(),
                    selection,
                });
            }
        }

        for &id in surface.widgets.selected() {
            if let Some(shape) = surface.get(id) {
                let bounds = shape.bounds();
                self.items.push(DisplayItem::Selection {
                    id,
                    bounds,
                    handles: surface.widgets.get_handles(shape),
                    color: ctx.selection_color,
                });
            }
        }

        self.items
            .extend(ctx.guides.iter().copied().map(DisplayItem::Guide));
    }
}

/// Drives a [`RenderBackend`] from the shared surface.
pub struct RendererController {
    options: ControllerOptions,
    backend: RefCell<Box<dyn RenderBackend>>,
}

impl fmt::Debug for RendererController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererController")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl RendererController {
    pub fn new(options: ControllerOptions) -> Self {
        Self::with_backend(options, Box::new(DisplayList::new()))
    }

    pub fn with_backend(options: ControllerOptions, backend: Box<dyn RenderBackend>) -> Self {
        Self {
            options,
            backend: RefCell::new(backend),
        }
    }

    /// Swap the backend; the next `render` uses it.
    pub fn set_backend(&self, backend: Box<dyn RenderBackend>) {
        *self.backend.borrow_mut() = backend;
    }

    /// Draw a frame now. Returns the new render generation.
    pub fn render(&self) -> Result<u64> {
        let generation = self.options.canvas.write(|s| {
            let ctx = RenderContext::new(s, s.viewport_size)
                .with_editing_shape(s.editing_object())
                .with_guides(s.guides.clone());
            self.backend.borrow_mut().build_scene(&ctx);
            s.render_all()
        })?;
        log::trace!("Rendered generation {}", generation);
        self.options.emit(EditorEvent::Rendered { generation });
        Ok(generation)
    }

    /// Ask for a redraw on the next frame.
    pub fn request_render(&self) -> Result<()> {
        self.options.canvas.write(|s| s.request_render())
    }

    /// Whether a redraw is pending.
    pub fn needs_render(&self) -> Result<bool> {
        self.options.canvas.read(|s| s.render_requested())
    }

    pub fn generation(&self) -> Result<u64> {
        self.options.canvas.read(|s| s.render_generation())
    }

    /// Render only when something asked for it.
    pub fn render_if_requested(&self) -> Result<Option<u64>> {
        if self.needs_render()? {
            self.render().map(Some)
        } else {
            Ok(None)
        }
    }
}
