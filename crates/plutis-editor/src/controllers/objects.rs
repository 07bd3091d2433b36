//! Objects controller: everything that adds, removes, reorders or selects
//! drawables.
//!
//! Every mutating call records an undo point first, then announces the change.

use super::ControllerOptions;
use crate::error::{EditorError, Result};
use crate::events::EditorEvent;
use kurbo::{Affine, Point, Vec2};
use plutis_core::{Shape, ShapeId, Surface};

/// Offset applied to duplicated objects so the copy is visible.
const DUPLICATE_OFFSET: Vec2 = Vec2::new(10.0, 10.0);

#[derive(Debug)]
pub struct ObjectsController {
    options: ControllerOptions,
}

fn require(surface: &Surface, id: ShapeId) -> Result<()> {
    if surface.get(id).is_none() {
        return Err(EditorError::ObjectNotFound(id));
    }
    Ok(())
}

impl ObjectsController {
    pub fn new(options: ControllerOptions) -> Self {
        Self { options }
    }

    /// Save an undo point and run `f` on the surface, then announce the
    /// object change. Nothing is saved when `f` fails its precondition.
    /// An edit that `f` ends is reported to exit listeners before the change
    /// is announced.
    fn mutate<R>(
        &self,
        check: impl FnOnce(&Surface) -> Result<()>,
        f: impl FnOnce(&mut Surface) -> R,
    ) -> Result<R> {
        self.options.canvas.read(check)??;
        let result = self.options.canvas.write(|s| {
            s.document.push_undo();
            let result = f(s);
            s.request_render();
            result
        })?;
        self.options.flush_editing_exits()?;
        self.options.emit(EditorEvent::ObjectsChanged);
        self.options.sync_selection()?;
        self.options.emit_history()?;
        Ok(result)
    }

    /// Add an object on top of the stack.
    pub fn add(&self, shape: Shape) -> Result<ShapeId> {
        log::debug!("Adding {} {}", shape.kind().name(), shape.id());
        self.mutate(|_| Ok(()), |s| s.add(shape))
    }

    /// Remove an object together with its custom attributes.
    pub fn remove(&self, id: ShapeId) -> Result<Shape> {
        let removed = self.mutate(
            |s| require(s, id),
            |s| {
                s.document.attributes.remove(&id);
                s.remove(id)
            },
        )?;
        removed.ok_or(EditorError::ObjectNotFound(id))
    }

    pub fn get(&self, id: ShapeId) -> Result<Option<Shape>> {
        self.options.canvas.read(|s| s.get(id).cloned())
    }

    /// Object ids, back to front.
    pub fn list(&self) -> Result<Vec<ShapeId>> {
        self.options
            .canvas
            .read(|s| s.objects().map(Shape::id).collect())
    }

    /// Apply an arbitrary change to one object.
    pub fn update<R>(&self, id: ShapeId, f: impl FnOnce(&mut Shape) -> R) -> Result<R> {
        let result = self.mutate(|s| require(s, id), |s| s.get_mut(id).map(f))?;
        result.ok_or(EditorError::ObjectNotFound(id))
    }

    /// Make one object the sole selection. Selecting the object being
    /// edited keeps it in editing mode.
    pub fn select(&self, id: ShapeId) -> Result<()> {
        let selected = self.options.canvas.write(|s| {
            if s.editing_object() == Some(id) {
                return true;
            }
            let selected = s.is_selectable(id) && s.set_active_object(id);
            if selected {
                s.request_render();
            }
            selected
        })?;
        if !selected {
            return Err(EditorError::ObjectNotFound(id));
        }
        self.options.flush_editing_exits()?;
        self.options.sync_selection()?;
        Ok(())
    }

    /// Add an object to the current selection.
    pub fn add_to_selection(&self, id: ShapeId) -> Result<()> {
        self.options.canvas.write(|s| {
            require(s, id)?;
            if s.is_selectable(id) {
                s.widgets.add_to_selection(id);
                s.request_render();
            }
            Ok::<_, EditorError>(())
        })??;
        self.options.sync_selection()?;
        Ok(())
    }

    /// Select every selectable object, back to front.
    pub fn select_all(&self) -> Result<Vec<ShapeId>> {
        self.options.canvas.write(|s| {
            let ids: Vec<ShapeId> = s
                .objects()
                .map(Shape::id)
                .filter(|&id| s.is_selectable(id))
                .collect();
            s.discard_active_object();
            for id in ids {
                s.widgets.add_to_selection(id);
            }
            s.request_render();
        })?;
        self.options.flush_editing_exits()?;
        self.options.sync_selection()
    }

    pub fn deselect(&self) -> Result<()> {
        self.options.canvas.write(|s| {
            s.discard_active_object();
            s.request_render();
        })?;
        self.options.flush_editing_exits()?;
        self.options.sync_selection()?;
        Ok(())
    }

    pub fn selection(&self) -> Result<Vec<ShapeId>> {
        self.options.canvas.read(|s| s.active_objects())
    }

    /// Translate an object.
    pub fn move_by(&self, id: ShapeId, delta: Vec2) -> Result<()> {
        self.mutate(
            |s| require(s, id),
            |s| {
                if let Some(shape) = s.get_mut(id) {
                    shape.transform(Affine::translate(delta));
                }
            },
        )
    }

    /// Top-left corner of an object's bounds.
    pub fn position(&self, id: ShapeId) -> Result<Point> {
        self.options.canvas.read(|s| {
            s.get(id)
                .map(|shape| shape.bounds().origin())
                .ok_or(EditorError::ObjectNotFound(id))
        })?
    }

    /// Group objects, keeping their stacking order.
    pub fn group(&self, ids: &[ShapeId]) -> Result<ShapeId> {
        let group_id = self.mutate(
            |s| {
                let found = ids.iter().filter(|&&id| s.get(id).is_some()).count();
                if found < 2 {
                    return Err(EditorError::InvalidGroup(format!(
                        "need at least 2 existing objects, got {found}"
                    )));
                }
                Ok(())
            },
            |s| {
                let group_id = s.document.group_shapes(ids);
                if let Some(group_id) = group_id {
                    s.set_active_object(group_id);
                }
                group_id
            },
        )?;
        let group_id = group_id.ok_or_else(|| EditorError::InvalidGroup("grouping failed".into()))?;
        log::debug!("Grouped {} object(s) into {}", ids.len(), group_id);
        Ok(group_id)
    }

    /// Dissolve a group into its members.
    pub fn ungroup(&self, id: ShapeId) -> Result<Vec<ShapeId>> {
        let members = self.mutate(
            |s| match s.get(id) {
                None => Err(EditorError::ObjectNotFound(id)),
                Some(shape) if !shape.is_group() => Err(EditorError::NotAGroup(id)),
                Some(_) => Ok(()),
            },
            |s| {
                s.widgets.remove(id);
                s.document.ungroup_shape(id)
            },
        )?;
        members.ok_or(EditorError::NotAGroup(id))
    }

    /// Make an object unselectable.
    pub fn lock(&self, id: ShapeId) -> Result<()> {
        self.set_locked(id, true)
    }

    pub fn unlock(&self, id: ShapeId) -> Result<()> {
        self.set_locked(id, false)
    }

    fn set_locked(&self, id: ShapeId, locked: bool) -> Result<()> {
        self.mutate(
            |s| require(s, id),
            |s| s.set_selectable(id, !locked),
        )
    }

    pub fn is_locked(&self, id: ShapeId) -> Result<bool> {
        self.options.canvas.read(|s| !s.is_selectable(id))
    }

    /// Copy an object with fresh ids, slightly offset, on top of the stack.
    pub fn duplicate(&self, id: ShapeId) -> Result<ShapeId> {
        let mut copy = self
            .get(id)?
            .ok_or(EditorError::ObjectNotFound(id))?;
        copy.regenerate_id();
        copy.transform(Affine::translate(DUPLICATE_OFFSET));
        let attributes = self
            .options
            .canvas
            .read(|s| s.document.attributes_of(id).cloned())?;
        self.mutate(
            |_| Ok(()),
            |s| {
                let new_id = s.add(copy);
                if let Some(attributes) = attributes {
                    *s.document.attributes_mut(new_id) = attributes;
                }
                new_id
            },
        )
    }

    pub fn bring_to_front(&self, id: ShapeId) -> Result<bool> {
        self.reorder(id, |s| s.document.bring_to_front(id))
    }

    pub fn send_to_back(&self, id: ShapeId) -> Result<bool> {
        self.reorder(id, |s| s.document.send_to_back(id))
    }

    pub fn bring_forward(&self, id: ShapeId) -> Result<bool> {
        self.reorder(id, |s| s.document.bring_forward(id))
    }

    pub fn send_backward(&self, id: ShapeId) -> Result<bool> {
        self.reorder(id, |s| s.document.send_backward(id))
    }

    fn reorder(&self, id: ShapeId, f: impl FnOnce(&mut Surface) -> bool) -> Result<bool> {
        self.mutate(|s| require(s, id), f)
    }

    /// Remove every selected object. Returns how many were removed.
    pub fn remove_selected(&self) -> Result<usize> {
        let selected = self.selection()?;
        if selected.is_empty() {
            return Ok(0);
        }
        self.mutate(
            |_| Ok(()),
            |s| {
                s.discard_active_object();
                let mut removed = 0;
                for id in &selected {
                    s.document.attributes.remove(id);
                    if s.remove(*id).is_some() {
                        removed += 1;
                    }
                }
                removed
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::controllers::test_support::options;
    use plutis_core::shapes::{Ellipse, Rectangle};
    use plutis_core::{SerializableColor, Text};

    fn rect(x: f64, y: f64) -> Shape {
        Shape::Rectangle(
            Rectangle::new(Point::new(x, y), 50.0, 50.0).with_fill(SerializableColor::black()),
        )
    }

    fn setup() -> (Canvas, ObjectsController) {
        let (canvas, options) = options();
        (canvas, ObjectsController::new(options))
    }

    #[test]
    fn test_add_get_list() {
        let (_canvas, objects) = setup();
        let a = objects.add(rect(0.0, 0.0)).unwrap();
        let b = objects.add(Shape::Ellipse(Ellipse::circle(Point::new(200.0, 200.0), 10.0))).unwrap();

        assert_eq!(objects.list().unwrap(), vec![a, b]);
        assert!(objects.get(a).unwrap().is_some());
    }

    #[test]
    fn test_mutations_save_history() {
        let (canvas, objects) = setup();
        let a = objects.add(rect(0.0, 0.0)).unwrap();
        objects.move_by(a, Vec2::new(5.0, 5.0)).unwrap();

        assert_eq!(canvas.surface().read(|s| s.document.undo_depth()).unwrap(), 2);
        let position = objects.position(a).unwrap();
        assert!((position.x - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remove_unknown_fails_without_history() {
        let (canvas, objects) = setup();
        let missing = uuid::Uuid::new_v4();
        assert!(matches!(objects.remove(missing), Err(EditorError::ObjectNotFound(id)) if id == missing));
        assert_eq!(canvas.surface().read(|s| s.document.undo_depth()).unwrap(), 0);
    }

    #[test]
    fn test_remove_drops_attributes() {
        let (canvas, objects) = setup();
        let a = objects.add(rect(0.0, 0.0)).unwrap();
        canvas
            .surface()
            .write(|s| s.document.attributes_mut(a).insert("k".into(), 1.into()))
            .unwrap();
        objects.remove(a).unwrap();
        assert!(canvas.surface().read(|s| s.document.attributes_of(a).is_none()).unwrap());
    }

    #[test]
    fn test_select_and_select_all() {
        let (_canvas, objects) = setup();
        let a = objects.add(rect(0.0, 0.0)).unwrap();
        let b = objects.add(rect(100.0, 0.0)).unwrap();

        objects.select(a).unwrap();
        assert_eq!(objects.selection().unwrap(), vec![a]);

        objects.lock(b).unwrap();
        assert_eq!(objects.select_all().unwrap(), vec![a]);
        assert!(objects.select(b).is_err());

        objects.deselect().unwrap();
        assert!(objects.selection().unwrap().is_empty());
    }

    #[test]
    fn test_group_and_ungroup() {
        let (_canvas, objects) = setup();
        let a = objects.add(rect(0.0, 0.0)).unwrap();
        let b = objects.add(rect(100.0, 0.0)).unwrap();

        assert!(matches!(objects.group(&[a]), Err(EditorError::InvalidGroup(_))));

        let group = objects.group(&[b, a]).unwrap();
        assert_eq!(objects.list().unwrap(), vec![group]);
        assert_eq!(objects.selection().unwrap(), vec![group]);
        assert!(matches!(objects.ungroup(a), Err(EditorError::ObjectNotFound(_))));

        let members = objects.ungroup(group).unwrap();
        assert_eq!(members, vec![a, b]);
        let position = objects.position(b).unwrap();
        assert!((position.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_ungroup_requires_group() {
        let (_canvas, objects) = setup();
        let a = objects.add(rect(0.0, 0.0)).unwrap();
        assert!(matches!(objects.ungroup(a), Err(EditorError::NotAGroup(id)) if id == a));
    }

    #[test]
    fn test_duplicate_offsets_copy() {
        let (_canvas, objects) = setup();
        let a = objects
            .add(Shape::Text(Text::new(Point::new(10.0, 10.0), "Hi".into())))
            .unwrap();
        let copy = objects.duplicate(a).unwrap();

        assert_ne!(copy, a);
        let position = objects.position(copy).unwrap();
        let original = objects.position(a).unwrap();
        assert!((position.x - original.x - 10.0).abs() < 1e-9);
        assert_eq!(objects.list().unwrap(), vec![a, copy]);
    }

    #[test]
    fn test_reorder() {
        let (_canvas, objects) = setup();
        let a = objects.add(rect(0.0, 0.0)).unwrap();
        let b = objects.add(rect(10.0, 0.0)).unwrap();
        let c = objects.add(rect(20.0, 0.0)).unwrap();

        assert!(objects.bring_to_front(a).unwrap());
        assert_eq!(objects.list().unwrap(), vec![b, c, a]);
        assert!(objects.send_backward(a).unwrap());
        assert_eq!(objects.list().unwrap(), vec![b, a, c]);
        assert!(objects.send_to_back(c).unwrap());
        assert!(objects.bring_forward(c).unwrap());
        assert_eq!(objects.list().unwrap(), vec![b, c, a]);
    }

    #[test]
    fn test_update_and_remove_selected() {
        let (_canvas, objects) = setup();
        let a = objects.add(rect(0.0, 0.0)).unwrap();
        let b = objects.add(rect(100.0, 0.0)).unwrap();

        objects
            .update(a, |shape| shape.style_mut().stroke_width = 7.0)
            .unwrap();
        let width = objects.get(a).unwrap().map(|s| s.style().stroke_width);
        assert_eq!(width, Some(7.0));

        objects.select(a).unwrap();
        objects.add_to_selection(b).unwrap();
        assert_eq!(objects.remove_selected().unwrap(), 2);
        assert!(objects.list().unwrap().is_empty());
        assert_eq!(objects.remove_selected().unwrap(), 0);
    }
}
