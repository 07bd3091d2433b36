//! Scene controller: whole-design import and export.

use super::ControllerOptions;
use crate::error::{EditorError, Result};
use crate::events::EditorEvent;
use kurbo::{Point, Rect, Size};
use plutis_core::{Attributes, CanvasDocument, SerializableColor, Shape, ShapeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The design page as stored in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDescription {
    pub width: f64,
    pub height: f64,
    pub background: SerializableColor,
}

/// Serializable snapshot of a whole design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescription {
    pub id: String,
    pub frame: FrameDescription,
    /// Objects, back to front.
    pub layers: Vec<Shape>,
    /// Custom attributes keyed by object id.
    #[serde(default)]
    pub attributes: HashMap<ShapeId, Attributes>,
}

#[derive(Debug)]
pub struct SceneController {
    options: ControllerOptions,
}

impl SceneController {
    pub fn new(options: ControllerOptions) -> Self {
        Self { options }
    }

    /// Snapshot the current design.
    pub fn export(&self) -> Result<SceneDescription> {
        let id = self.options.config.id.clone();
        self.options.canvas.read(|s| {
            let layers: Vec<Shape> = s.objects().cloned().collect();
            let attributes = s
                .document
                .attributes
                .iter()
                .filter(|(id, _)| s.get(**id).is_some())
                .map(|(id, attributes)| (*id, attributes.clone()))
                .collect();
            SceneDescription {
                id,
                frame: FrameDescription {
                    width: s.frame.width(),
                    height: s.frame.height(),
                    background: s.background,
                },
                layers,
                attributes,
            }
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export()?)?)
    }

    /// Replace the current design. The previous one stays reachable through undo.
    pub fn import(&self, scene: SceneDescription) -> Result<()> {
        let SceneDescription {
            id,
            frame,
            layers,
            attributes,
        } = scene;
        if frame.width <= 0.0 || frame.height <= 0.0 {
            return Err(EditorError::Config(format!(
                "scene {id} has an empty frame"
            )));
        }

        // Listeners of the edit in progress must still see the old document.
        self.options.exit_editing()?;
        let count = layers.len();
        self.options.canvas.write(|s| {
            s.document.push_undo();
            let mut document = s.document.clone();
            document.clear();
            for layer in layers {
                document.add_shape(layer);
            }
            document.attributes = attributes;
            s.load_document(document);
            s.frame = Rect::from_origin_size(Point::ZERO, Size::new(frame.width, frame.height));
            s.background = frame.background;
            s.render_all();
        })?;
        log::debug!("Loaded scene {} with {} layer(s)", id, count);
        self.options.flush_editing_exits()?;

        self.options.sync_selection()?;
        self.options.emit(EditorEvent::SceneLoaded { layers: count });
        self.options.emit(EditorEvent::ObjectsChanged);
        self.options.emit_history()
    }

    pub fn load_json(&self, json: &str) -> Result<()> {
        let scene: SceneDescription = serde_json::from_str(json)?;
        self.import(scene)
    }

    /// Replace the design with an empty page of the same frame.
    pub fn clear(&self) -> Result<()> {
        let frame = self.export()?.frame;
        self.import(SceneDescription {
            id: self.options.config.id.clone(),
            frame,
            layers: Vec::new(),
            attributes: HashMap::new(),
        })
    }

    /// Load a bare document (shapes and attributes only), keeping the frame.
    pub fn load_document(&self, document: CanvasDocument) -> Result<()> {
        let frame = self.export()?.frame;
        let layers = document.shapes_ordered().cloned().collect();
        self.import(SceneDescription {
            id: document.id,
            frame,
            layers,
            attributes: document.attributes,
        })
    }
}
