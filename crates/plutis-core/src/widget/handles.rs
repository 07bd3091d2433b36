//! Handle definitions for widget manipulation.

use kurbo::{Point, Rect};

/// A manipulation handle on a widget.
#[derive(Debug, Clone)]
pub struct Handle {
    /// The kind of handle (determines behavior).
    pub kind: HandleKind,
    /// Position in world coordinates.
    pub position: Point,
}

/// The kind of handle - determines what manipulation it performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// Rotation handle above the top edge.
    Rotate,
}

/// Distance of the rotation handle above the selection box.
const ROTATE_OFFSET: f64 = 24.0;

impl Handle {
    /// Create a new handle.
    pub fn new(kind: HandleKind, position: Point) -> Self {
        Self { kind, position }
    }

    /// Corner and rotation handles around a bounding box.
    pub fn around(bounds: Rect) -> Vec<Handle> {
        vec![
            Handle::new(HandleKind::TopLeft, Point::new(bounds.x0, bounds.y0)),
            Handle::new(HandleKind::TopRight, Point::new(bounds.x1, bounds.y0)),
            Handle::new(HandleKind::BottomLeft, Point::new(bounds.x0, bounds.y1)),
            Handle::new(HandleKind::BottomRight, Point::new(bounds.x1, bounds.y1)),
            Handle::new(
                HandleKind::Rotate,
                Point::new(bounds.center().x, bounds.y0 - ROTATE_OFFSET),
            ),
        ]
    }
}
