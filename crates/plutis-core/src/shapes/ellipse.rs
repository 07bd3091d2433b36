//! Ellipse drawable.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ellipse given by its center and radii, rotated about the center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ellipse {
    pub(crate) id: ShapeId,
    pub center: Point,
    pub radius_x: f64,
    pub radius_y: f64,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Ellipse {
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            center,
            radius_x,
            radius_y,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        Self::new(center, radius, radius)
    }

    /// The ellipse inscribed in `rect`.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.center(), rect.width() / 2.0, rect.height() / 2.0)
    }

    fn geometry(&self) -> KurboEllipse {
        KurboEllipse::new(self.center, (self.radius_x, self.radius_y), self.rotation)
    }

    /// Offset of `point` from the center, in the unrotated frame.
    fn local_offset(&self, point: Point) -> Vec2 {
        let local = Affine::rotate_about(-self.rotation, self.center) * point;
        local - self.center
    }
}

/// Whether `offset` lies within the axis-aligned ellipse of radii `r`.
fn within(offset: Vec2, r: Vec2) -> bool {
    if r.x <= 0.0 || r.y <= 0.0 {
        return false;
    }
    (offset.x / r.x).powi(2) + (offset.y / r.y).powi(2) <= 1.0
}

impl ShapeTrait for Ellipse {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.geometry().bounding_box()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let offset = self.local_offset(point);
        let reach = tolerance + self.style.stroke_width / 2.0;
        let radii = Vec2::new(self.radius_x, self.radius_y);
        if !within(offset, radii + Vec2::new(reach, reach)) {
            return false;
        }
        if self.style.fill_color.is_some() {
            return true;
        }
        // Unfilled: the ring between the inner and outer ellipse
        let inner = Vec2::new((self.radius_x - reach).max(0.0), (self.radius_y - reach).max(0.0));
        !within(offset, inner)
    }

    fn to_path(&self) -> BezPath {
        self.geometry().to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.center = affine * self.center;
        let [a, b, c, d, _, _] = affine.as_coeffs();
        self.radius_x *= a.hypot(b);
        self.radius_y *= c.hypot(d);
        let rotation = b.atan2(a);
        if rotation.abs() > 0.001 {
            self.rotation += rotation;
        }
    }
}
