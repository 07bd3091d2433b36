//! Rectangle drawable.

use super::{SerializableColor, ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A box on the page, rotated about its center, with optional rounded corners.
///
/// `position`, `width` and `height` describe the box before rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    /// Top-left corner of the unrotated box.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Corner radius; clamped to half the shorter side when drawn.
    pub corner_radius: f64,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Rectangle {
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            corner_radius: 0.0,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// Box spanned by two opposite corners, in any order.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let rect = Rect::from_points(p1, p2);
        Self::new(rect.origin(), rect.width(), rect.height())
    }

    pub fn with_fill(mut self, color: SerializableColor) -> Self {
        self.style.fill_color = Some(color);
        self
    }

    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = radius.max(0.0);
        self
    }

    /// The unrotated box.
    pub fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, Size::new(self.width, self.height))
    }

    /// Maps the unrotated box onto the page.
    fn placement(&self) -> Affine {
        Affine::rotate_about(self.rotation, self.as_rect().center())
    }

    fn radius(&self) -> f64 {
        self.corner_radius.min(self.width.min(self.height) / 2.0).max(0.0)
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let rect = self.as_rect();
        if self.rotation == 0.0 {
            return rect;
        }
        self.placement().transform_rect_bbox(rect)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = self.placement().inverse() * point;
        let rect = self.as_rect();
        if self.style.fill_color.is_some() {
            return rect.inflate(tolerance, tolerance).contains(local);
        }
        // Unfilled boxes are only hit near their border
        let reach = tolerance + self.style.stroke_width / 2.0;
        rect.inflate(reach, reach).contains(local) && !rect.inflate(-reach, -reach).contains(local)
    }

    fn to_path(&self) -> BezPath {
        let outline = match self.radius() {
            r if r > 0.0 => RoundedRect::from_rect(self.as_rect(), r).to_path(0.1),
            _ => self.as_rect().to_path(0.1),
        };
        self.placement() * outline
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        let center = affine * self.as_rect().center();
        let [a, b, c, d, _, _] = affine.as_coeffs();
        self.width *= a.hypot(b);
        self.height *= c.hypot(d);
        let rotation = b.atan2(a);
        if rotation.abs() > 0.001 {
            self.rotation += rotation;
        }
        self.position = Point::new(center.x - self.width / 2.0, center.y - self.height / 2.0);
    }
}
