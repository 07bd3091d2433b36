//! Frame controller: the design page.

use super::ControllerOptions;
use crate::error::{EditorError, Result};
use crate::events::EditorEvent;
use kurbo::{Rect, Size};
use plutis_core::SerializableColor;

/// Owns the page bounds and background.
#[derive(Debug)]
pub struct FrameController {
    options: ControllerOptions,
}

impl FrameController {
    pub fn new(options: ControllerOptions) -> Self {
        Self { options }
    }

    /// Frame bounds in world coordinates.
    pub fn bounds(&self) -> Result<Rect> {
        self.options.canvas.read(|s| s.frame)
    }

    pub fn size(&self) -> Result<Size> {
        self.bounds().map(|frame| frame.size())
    }

    /// Resize the frame, keeping its top-left corner.
    pub fn resize(&self, size: Size) -> Result<()> {
        if size.width <= 0.0 || size.height <= 0.0 {
            return Err(EditorError::Config(format!("frame size {size:?} must be positive")));
        }
        self.options.canvas.write(|s| {
            s.frame = Rect::from_origin_size(s.frame.origin(), size);
            s.request_render();
        })?;
        log::debug!("Frame resized to {}x{}", size.width, size.height);
        self.options.emit(EditorEvent::FrameResized { size });
        Ok(())
    }

    pub fn background(&self) -> Result<SerializableColor> {
        self.options.canvas.read(|s| s.background)
    }

    pub fn set_background(&self, color: SerializableColor) -> Result<()> {
        self.options.canvas.write(|s| {
            s.background = color;
            s.request_render();
        })?;
        self.options.emit(EditorEvent::BackgroundChanged { color });
        Ok(())
    }
}
