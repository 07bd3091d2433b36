//! Group shape for combining multiple shapes.

use super::{Shape, ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Extra options accepted when building a group.
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    /// Use this id instead of a fresh one.
    pub id: Option<ShapeId>,
}

/// A group of shapes that can be manipulated as a single unit.
///
/// Members are stored relative to the group: `transform` maps member
/// coordinates to the group's parent. Groups can contain other groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub(crate) id: ShapeId,
    /// Member shapes in group-local coordinates, back to front.
    pub(crate) members: Vec<Shape>,
    /// Group-local to parent transform.
    pub transform: Affine,
    style: ShapeStyle,
}

impl Group {
    /// Create a new group from shapes given in parent coordinates.
    pub fn new(members: Vec<Shape>) -> Self {
        Self::with_options(members, GroupOptions::default())
    }

    /// Create a group, anchoring its origin at the center of the members' bounds.
    pub fn with_options(mut members: Vec<Shape>, options: GroupOptions) -> Self {
        let origin = union_bounds(&members)
            .map(|bounds| bounds.center().to_vec2())
            .unwrap_or_default();
        let to_local = Affine::translate(-origin);
        for member in &mut members {
            member.transform(to_local);
        }
        Self {
            id: options.id.unwrap_or_else(Uuid::new_v4),
            members,
            transform: Affine::translate(origin),
            style: ShapeStyle::default(),
        }
    }

    /// Members in group-local coordinates.
    pub fn members(&self) -> &[Shape] {
        &self.members
    }

    /// Ids of the direct members, in order.
    pub fn member_ids(&self) -> Vec<ShapeId> {
        self.members.iter().map(Shape::id).collect()
    }

    /// Transform that maps member coordinates onto the parent (canvas) space.
    pub fn calc_transform_matrix(&self) -> Affine {
        self.transform
    }

    /// Dissolve the group, returning its members in parent coordinates.
    pub fn restore_members(self) -> Vec<Shape> {
        let transform = self.transform;
        self.members
            .into_iter()
            .map(|mut member| {
                member.transform(transform);
                member
            })
            .collect()
    }

    /// Get all shape IDs in this group (including nested groups).
    pub fn all_shape_ids(&self) -> Vec<ShapeId> {
        let mut ids = vec![self.id];
        for member in &self.members {
            if let Shape::Group(group) = member {
                ids.extend(group.all_shape_ids());
            } else {
                ids.push(member.id());
            }
        }
        ids
    }

    /// Find a shape by ID within this group (including nested groups).
    pub fn find_shape(&self, id: ShapeId) -> Option<&Shape> {
        for member in &self.members {
            if member.id() == id {
                return Some(member);
            }
            if let Shape::Group(group) = member {
                if let Some(found) = group.find_shape(id) {
                    return Some(found);
                }
            }
        }
        None
    }
}

fn union_bounds(shapes: &[Shape]) -> Option<Rect> {
    shapes
        .iter()
        .map(Shape::bounds)
        .reduce(|acc, bounds| acc.union(bounds))
}

impl ShapeTrait for Group {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        union_bounds(&self.members)
            .map(|local| self.transform.transform_rect_bbox(local))
            .unwrap_or(Rect::ZERO)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = self.transform.inverse() * point;
        self.members
            .iter()
            .any(|member| member.hit_test(local, tolerance))
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for member in &self.members {
            path.extend(member.to_path());
        }
        path.apply_affine(self.transform);
        path
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.transform = affine * self.transform;
    }
}
