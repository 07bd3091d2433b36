//! Plutis Core Library
//!
//! Platform-agnostic drawable model and drawing surface for the Plutis design editor.

pub mod camera;
pub mod canvas;
pub mod input;
pub mod shapes;
pub mod snap;
pub mod widget;

pub use camera::Camera;
pub use canvas::{Attributes, CanvasDocument, Surface};
pub use input::{ClickTracker, Key, KeyEvent, Modifiers, MouseButton, PointerInput};
pub use shapes::{Group, GroupOptions, SerializableColor, Shape, ShapeId, ShapeKind, ShapeTrait, Text};
pub use snap::{
    GRID_SIZE, GuideAxis, GuideLine, GuideSnap, SnapResult, SnapTargetKind,
    snap_rect_to_guides, snap_to_grid,
};
pub use widget::{EditingKind, Handle, HandleKind, TextRange, WidgetManager, WidgetState};
