//! Guidelines controller: alignment guides while dragging.

use super::ControllerOptions;
use crate::error::{EditorError, Result};
use crate::events::EditorEvent;
use kurbo::{Affine, Rect, Vec2};
use plutis_core::{GuideLine, ShapeId, snap_rect_to_guides, snap_to_grid};

#[derive(Debug)]
pub struct GuidelinesController {
    options: ControllerOptions,
}

impl GuidelinesController {
    pub fn new(options: ControllerOptions) -> Self {
        Self { options }
    }

    /// Snap a proposed move of `id` by `delta` against the other objects and
    /// the frame. Returns the corrected delta; the matching guides become active.
    pub fn compute(&self, id: ShapeId, delta: Vec2) -> Result<Vec2> {
        let config = &self.options.config;
        let (snapped, count) = self.options.canvas.write(|s| {
            let bounds = s
                .get(id)
                .map(|shape| shape.bounds())
                .ok_or(EditorError::ObjectNotFound(id))?;
            let moved = Affine::translate(delta).transform_rect_bbox(bounds);

            let mut references: Vec<Rect> = s
                .objects()
                .filter(|shape| shape.id() != id)
                .map(|shape| shape.bounds())
                .collect();
            references.push(s.frame);

            let threshold = config.guideline_threshold / s.camera.zoom;
            let guide_snap = snap_rect_to_guides(moved, &references, threshold);
            let mut snapped = delta + guide_snap.offset;

            if config.snap_to_grid && guide_snap.guides.is_empty() {
                let origin = moved.origin();
                let grid = snap_to_grid(origin, config.grid_size);
                snapped += grid.point - origin;
            }

            s.guides = guide_snap.guides;
            s.request_render();
            Ok::<_, EditorError>((snapped, s.guides.len()))
        })??;
        if count > 0 {
            log::trace!("{} guide(s) active for {}", count, id);
        }
        self.options.emit(EditorEvent::GuidelinesChanged { count });
        Ok(snapped)
    }

    /// Guides from the last `compute`.
    pub fn active(&self) -> Result<Vec<GuideLine>> {
        self.options.canvas.read(|s| s.guides.clone())
    }

    pub fn clear(&self) -> Result<()> {
        let had_guides = self.options.canvas.write(|s| {
            let had_guides = !s.guides.is_empty();
            s.guides.clear();
            if had_guides {
                s.request_render();
            }
            had_guides
        })?;
        if had_guides {
            self.options.emit(EditorEvent::GuidelinesChanged { count: 0 });
        }
        Ok(())
    }
}
