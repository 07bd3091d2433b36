//! Editable text shape.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Font family options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
}

impl FontFamily {
    /// Get the font family name as used by the renderer.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Sans => "Inter",
            FontFamily::Serif => "Noto Serif",
            FontFamily::Mono => "JetBrains Mono",
        }
    }

    /// Average advance of one glyph, as a fraction of the font size.
    fn advance_factor(&self, weight: FontWeight) -> f64 {
        match (self, weight) {
            (FontFamily::Sans, FontWeight::Light) => 0.50,
            (FontFamily::Sans, FontWeight::Regular) => 0.52,
            (FontFamily::Sans, FontWeight::Bold) => 0.56,
            (FontFamily::Serif, FontWeight::Light) => 0.52,
            (FontFamily::Serif, FontWeight::Regular) => 0.55,
            (FontFamily::Serif, FontWeight::Bold) => 0.58,
            // Monospace advance does not depend on weight.
            (FontFamily::Mono, _) => 0.60,
        }
    }
}

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Bold,
}

/// A text box whose content can be edited in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Position (top-left corner of the unrotated text box).
    pub position: Point,
    /// The text content.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f64,
    pub font_family: FontFamily,
    pub font_weight: FontWeight,
    /// Horizontal scale applied on top of the laid-out width.
    #[serde(default = "unit_scale")]
    pub scale_x: f64,
    /// Vertical scale applied on top of the laid-out height.
    #[serde(default = "unit_scale")]
    pub scale_y: f64,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    /// Style properties (fill is the glyph color).
    pub style: ShapeStyle,
    /// Layout size reported by a text shaper; approximated when absent.
    #[serde(skip)]
    measured_size: Option<Size>,
}

fn unit_scale() -> f64 {
    1.0
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;

    /// Minimum laid-out width so empty boxes stay clickable.
    const MIN_WIDTH: f64 = 20.0;

    /// Create a new text shape.
    pub fn new(position: Point, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            content,
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            font_weight: FontWeight::default(),
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            style: ShapeStyle::default(),
            measured_size: None,
        }
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self.measured_size = None;
        self
    }

    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: String) {
        self.content = content;
        self.measured_size = None;
    }

    /// Number of characters (not bytes) in the content.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    /// Record the size computed by a text shaper.
    pub fn set_measured_size(&mut self, width: f64, height: f64) {
        self.measured_size = Some(Size::new(width, height));
    }

    /// Unscaled layout size of the text box.
    pub fn layout_size(&self) -> Size {
        self.measured_size
            .map(|size| Size::new(size.width.max(Self::MIN_WIDTH), size.height))
            .unwrap_or_else(|| {
                Size::new(
                    self.approximate_width().max(Self::MIN_WIDTH),
                    self.approximate_height(),
                )
            })
    }

    /// Layout size with `scale_x` / `scale_y` applied.
    pub fn scaled_size(&self) -> Size {
        let size = self.layout_size();
        Size::new(size.width * self.scale_x, size.height * self.scale_y)
    }

    /// Center of the text box in its parent's coordinates.
    pub fn local_center(&self) -> Point {
        let size = self.scaled_size();
        Point::new(
            self.position.x + size.width / 2.0,
            self.position.y + size.height / 2.0,
        )
    }

    /// On-canvas box used to decide whether a pointer lands on this text
    /// while it sits inside a group.
    ///
    /// `parent_matrix` is the cumulative transform of the enclosing group; it
    /// moves the center only, the extent is half the scaled width and height
    /// on each side.
    pub fn edit_box(&self, parent_matrix: Affine) -> Rect {
        let center = parent_matrix * self.local_center();
        Rect::from_center_size(center, self.scaled_size())
    }

    fn approximate_width(&self) -> f64 {
        let max_line_len = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        max_line_len as f64 * self.font_size * self.font_family.advance_factor(self.font_weight)
    }

    fn approximate_height(&self) -> f64 {
        let mut line_count = self.content.lines().count().max(1);
        // lines() drops a trailing empty line
        if self.content.ends_with('\n') {
            line_count += 1;
        }
        line_count as f64 * self.font_size * 1.2
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let size = self.scaled_size();
        Rect::from_origin_size(self.position, size)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        // Glyph outlines belong to the shaper; selection uses the box.
        self.bounds().to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
        let [a, b, c, d, _, _] = affine.as_coeffs();
        self.scale_x *= a.hypot(b);
        self.scale_y *= c.hypot(d);
        let rotation = b.atan2(a);
        if rotation.abs() > 0.001 {
            self.rotation += rotation;
        }
    }
}
