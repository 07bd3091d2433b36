//! Personalization controller: custom attributes attached to objects.

use super::ControllerOptions;
use crate::error::{EditorError, Result};
use crate::events::EditorEvent;
use plutis_core::{Attributes, ShapeId, Surface};
use serde_json::Value;

#[derive(Debug)]
pub struct PersonalizationController {
    options: ControllerOptions,
}

impl PersonalizationController {
    pub fn new(options: ControllerOptions) -> Self {
        Self { options }
    }

    fn change<R>(&self, id: ShapeId, f: impl FnOnce(&mut Surface) -> R) -> Result<R> {
        let result = self.options.canvas.write(|s| {
            if s.get(id).is_none() {
                return Err(EditorError::ObjectNotFound(id));
            }
            s.document.push_undo();
            Ok(f(s))
        })??;
        self.options.emit(EditorEvent::AttributesChanged { id });
        self.options.emit_history()?;
        Ok(result)
    }

    /// Set one attribute; returns the previous value.
    pub fn set(&self, id: ShapeId, key: &str, value: Value) -> Result<Option<Value>> {
        self.change(id, |s| s.document.attributes_mut(id).insert(key.to_string(), value))
    }

    pub fn get(&self, id: ShapeId, key: &str) -> Result<Option<Value>> {
        self.options.canvas.read(|s| {
            s.document
                .attributes_of(id)
                .and_then(|attributes| attributes.get(key))
                .cloned()
        })
    }

    /// Every attribute of an object (empty when none were set).
    pub fn attributes(&self, id: ShapeId) -> Result<Attributes> {
        self.options
            .canvas
            .read(|s| s.document.attributes_of(id).cloned().unwrap_or_default())
    }

    /// Remove one attribute; returns its value.
    pub fn remove(&self, id: ShapeId, key: &str) -> Result<Option<Value>> {
        self.change(id, |s| {
            let attributes = s.document.attributes_mut(id);
            let removed = attributes.remove(key);
            if attributes.is_empty() {
                s.document.attributes.remove(&id);
            }
            removed
        })
    }

    /// Drop every attribute of an object.
    pub fn clear(&self, id: ShapeId) -> Result<()> {
        self.change(id, |s| {
            s.document.attributes.remove(&id);
        })
    }
}
