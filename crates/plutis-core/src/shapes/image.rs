//! Placed raster image.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Encoding of the embedded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Svg,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::WebP),
            "image/svg+xml" => Some(ImageFormat::Svg),
            _ => None,
        }
    }

    /// Sniff the format from the first bytes of a file.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(ImageFormat::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            Some(ImageFormat::WebP)
        } else {
            let head = &data[..data.len().min(256)];
            let text = String::from_utf8_lossy(head);
            let text = text.trim_start();
            (text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg")))
                .then_some(ImageFormat::Svg)
        }
    }
}

/// A raster (or SVG) image placed on the page.
///
/// The bytes travel base64-encoded inside the shape so a scene's JSON is
/// self-contained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub(crate) id: ShapeId,
    /// Top-left corner.
    pub position: Point,
    /// Displayed size.
    pub size: Size,
    /// Pixel size of the source.
    pub natural_size: Size,
    /// Visible part of the source, in source pixels. None shows everything.
    #[serde(default)]
    pub crop: Option<Rect>,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    pub format: ImageFormat,
    data_base64: String,
    /// Stroke draws an optional border.
    pub style: ShapeStyle,
}

impl Image {
    /// Place an image at its natural size.
    pub fn new(position: Point, data: &[u8], natural_size: Size, format: ImageFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            size: natural_size,
            natural_size,
            crop: None,
            rotation: 0.0,
            format,
            data_base64: STANDARD.encode(data),
            style: ShapeStyle::default(),
        }
    }

    /// Like [`Image::new`], detecting the format from the bytes.
    pub fn from_bytes(position: Point, data: &[u8], natural_size: Size) -> Option<Self> {
        let format = ImageFormat::sniff(data)?;
        Some(Self::new(position, data, natural_size, format))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(position: Point, url: &str, natural_size: Size) -> Option<Self> {
        let (header, payload) = url.strip_prefix("data:")?.split_once(',')?;
        let mime = header.strip_suffix(";base64")?;
        let format = ImageFormat::from_mime_type(mime)?;
        let data = STANDARD.decode(payload.trim()).ok()?;
        Some(Self::new(position, &data, natural_size, format))
    }

    pub fn with_crop(mut self, crop: Rect) -> Self {
        self.crop = Some(crop);
        self
    }

    /// Largest size with the source's aspect ratio that fits in `max`.
    pub fn fit_within(mut self, max: Size) -> Self {
        let source = self.visible_source_size();
        if source.width <= 0.0 || source.height <= 0.0 {
            return self;
        }
        let scale = (max.width / source.width).min(max.height / source.height);
        self.size = Size::new(source.width * scale, source.height * scale);
        self
    }

    fn visible_source_size(&self) -> Size {
        self.crop.map(|crop| crop.size()).unwrap_or(self.natural_size)
    }

    /// Decoded bytes, or None when the stored payload is corrupt.
    pub fn data(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.data_base64).ok()
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.data_base64)
    }

    pub fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }
}

impl ShapeTrait for Image {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let rect = self.as_rect();
        if self.rotation == 0.0 {
            return rect;
        }
        Affine::rotate_about(self.rotation, rect.center()).transform_rect_bbox(rect)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let rect = self.as_rect();
        let local = Affine::rotate_about(-self.rotation, rect.center()) * point;
        rect.inflate(tolerance, tolerance).contains(local)
    }

    fn to_path(&self) -> BezPath {
        let rect = self.as_rect();
        Affine::rotate_about(self.rotation, rect.center()) * rect.to_path(0.1)
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
        self.size = Size::new(self.size.width * a.hypot(b), self.size.height * c.hypot(d));
        let rotation = b.atan2(a);
        if rotation.abs() > 0.001 {
            self.rotation += rotation;
        }
    }
}
