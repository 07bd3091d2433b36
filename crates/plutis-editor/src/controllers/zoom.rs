//! Zoom controller: the camera scale.

use super::ControllerOptions;
use crate::error::Result;
use crate::events::EditorEvent;
use kurbo::Point;
use plutis_core::Surface;

/// Padding kept around the frame by `zoom_to_fit`, in screen pixels.
const FIT_PADDING: f64 = 40.0;

#[derive(Debug)]
pub struct ZoomController {
    options: ControllerOptions,
}

fn viewport_center(surface: &Surface) -> Point {
    Point::new(
        surface.viewport_size.width / 2.0,
        surface.viewport_size.height / 2.0,
    )
}

impl ZoomController {
    pub fn new(options: ControllerOptions) -> Self {
        Self { options }
    }

    /// Current zoom ratio (1.0 = 100%).
    pub fn ratio(&self) -> Result<f64> {
        self.options.canvas.read(|s| s.camera.zoom)
    }

    /// Zoom around the viewport center. The ratio is clamped to the
    /// configured limits; returns the ratio actually applied.
    pub fn zoom_to_ratio(&self, ratio: f64) -> Result<f64> {
        let (changed, applied) = self.options.canvas.write(|s| {
            let center = viewport_center(s);
            let changed = s.camera.zoom_to(center, ratio);
            if changed {
                s.request_render();
            }
            (changed, s.camera.zoom)
        })?;
        if changed {
            log::debug!("Zoom set to {:.3}", applied);
            self.options.emit(EditorEvent::ZoomChanged { ratio: applied });
        }
        Ok(applied)
    }

    pub fn zoom_in(&self) -> Result<f64> {
        let ratio = self.ratio()?;
        self.zoom_to_ratio(ratio * self.options.config.zoom_step)
    }

    pub fn zoom_out(&self) -> Result<f64> {
        let ratio = self.ratio()?;
        self.zoom_to_ratio(ratio / self.options.config.zoom_step)
    }

    /// Fit the whole frame into the viewport.
    pub fn zoom_to_fit(&self) -> Result<f64> {
        let ratio = self.options.canvas.write(|s| {
            let (frame, viewport) = (s.frame, s.viewport_size);
            s.camera.fit_to_bounds(frame, viewport, FIT_PADDING);
            s.request_render();
            s.camera.zoom
        })?;
        self.options.emit(EditorEvent::ZoomChanged { ratio });
        Ok(ratio)
    }

    /// Back to 100% with no pan.
    pub fn reset(&self) -> Result<()> {
        self.options.canvas.write(|s| {
            s.camera.reset();
            s.request_render();
        })?;
        self.options.emit(EditorEvent::ZoomChanged { ratio: 1.0 });
        Ok(())
    }
}
