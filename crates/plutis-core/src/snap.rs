//! Snapping of points to the grid and of boxes to alignment guides.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Grid size for snapping (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Result of a snap operation.
#[derive(Debug, Clone, Copy)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> SnapResult {
    if grid_size <= 0.0 {
        return SnapResult::none(point);
    }
    let snapped_x = (point.x / grid_size).round() * grid_size;
    let snapped_y = (point.y / grid_size).round() * grid_size;

    SnapResult {
        point: Point::new(snapped_x, snapped_y),
        snapped_x: true,
        snapped_y: true,
    }
}

/// Which part of a reference box a guide lines up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapTargetKind {
    /// Left/right or top/bottom edge of a box.
    Edge,
    /// Center of a shape.
    Center,
}

/// Orientation of an alignment guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuideAxis {
    /// A vertical line at a fixed x.
    Vertical,
    /// A horizontal line at a fixed y.
    Horizontal,
}

/// An alignment guide drawn while a shape is dragged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuideLine {
    pub axis: GuideAxis,
    /// x for vertical guides, y for horizontal ones.
    pub position: f64,
    /// What part of the reference box the guide comes from.
    pub kind: SnapTargetKind,
}

/// Outcome of snapping a moving box against reference boxes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuideSnap {
    /// Correction to add to the proposed position.
    pub offset: Vec2,
    pub guides: Vec<GuideLine>,
}

fn axis_stops(x0: f64, x1: f64) -> [(f64, SnapTargetKind); 3] {
    [
        (x0, SnapTargetKind::Edge),
        ((x0 + x1) / 2.0, SnapTargetKind::Center),
        (x1, SnapTargetKind::Edge),
    ]
}

/// Find the smallest correction along one axis, plus every reference stop
/// that lines up after applying it.
fn snap_axis(
    moving: [(f64, SnapTargetKind); 3],
    references: &[[(f64, SnapTargetKind); 3]],
    threshold: f64,
) -> Option<(f64, Vec<(f64, SnapTargetKind)>)> {
    let mut best: Option<f64> = None;
    for reference in references {
        for &(target, _) in reference {
            for &(value, _) in &moving {
                let delta = target - value;
                if delta.abs() <= threshold && best.is_none_or(|b| delta.abs() < b.abs()) {
                    best = Some(delta);
                }
            }
        }
    }
    let delta = best?;

    let mut hits: Vec<(f64, SnapTargetKind)> = Vec::new();
    for reference in references {
        for &(target, kind) in reference {
            let aligned = moving
                .iter()
                .any(|&(value, _)| (value + delta - target).abs() < 1e-6);
            if aligned && !hits.iter().any(|&(p, _)| (p - target).abs() < 1e-6) {
                hits.push((target, kind));
            }
        }
    }
    Some((delta, hits))
}

/// Snap a moving box to the edges and centers of reference boxes.
///
/// Each axis snaps independently to the closest stop within `threshold`.
pub fn snap_rect_to_guides(moving: Rect, references: &[Rect], threshold: f64) -> GuideSnap {
    let vertical: Vec<_> = references.iter().map(|r| axis_stops(r.x0, r.x1)).collect();
    let horizontal: Vec<_> = references.iter().map(|r| axis_stops(r.y0, r.y1)).collect();

    let mut result = GuideSnap::default();
    if let Some((dx, hits)) = snap_axis(axis_stops(moving.x0, moving.x1), &vertical, threshold) {
        result.offset.x = dx;
        result.guides.extend(hits.into_iter().map(|(position, kind)| GuideLine {
            axis: GuideAxis::Vertical,
            position,
            kind,
        }));
    }
    if let Some((dy, hits)) = snap_axis(axis_stops(moving.y0, moving.y1), &horizontal, threshold) {
        result.offset.y = dy;
        result.guides.extend(hits.into_iter().map(|(position, kind)| GuideLine {
            axis: GuideAxis::Horizontal,
            position,
            kind,
        }));
    }
    result
}
