//! Editor configuration and merge rules.
//!
//! The effective configuration is built from [`EditorConfig::default`], then
//! the caller's [`PartialEditorConfig`], then the editor id, which always wins.
//! Out-of-range overrides are replaced with usable values and logged; merging
//! never fails.

use crate::error::Result;
use kurbo::Size;
use plutis_core::SerializableColor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Effective, immutable editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Canvas and editor identity.
    pub id: String,
    /// Size of the design frame (the page) in world units.
    pub frame_size: Size,
    /// Frame background color.
    #[serde(with = "hex_color")]
    pub background: SerializableColor,
    /// Initial viewport size in screen pixels.
    pub viewport_size: Size,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Factor applied by one zoom-in / zoom-out step.
    pub zoom_step: f64,
    /// Maximum number of undo states.
    pub history_limit: usize,
    /// Guideline snap distance in screen pixels.
    pub guideline_threshold: f64,
    pub snap_to_grid: bool,
    pub grid_size: f64,
    /// Age after which an in-place edit session counts as stuck.
    pub edit_timeout_secs: u64,
    /// Keys this crate does not interpret, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            frame_size: Size::new(1200.0, 1200.0),
            background: SerializableColor::white(),
            viewport_size: Size::new(800.0, 600.0),
            min_zoom: 0.1,
            max_zoom: 10.0,
            zoom_step: 1.2,
            history_limit: 50,
            guideline_threshold: 10.0,
            snap_to_grid: false,
            grid_size: plutis_core::GRID_SIZE,
            edit_timeout_secs: 300,
            extra: Map::new(),
        }
    }
}

impl EditorConfig {
    /// Merge defaults, the partial overrides and the id, then sanitize.
    pub fn merged(partial: PartialEditorConfig, id: &str) -> Self {
        let mut config = Self::default();
        let PartialEditorConfig {
            id: _,
            frame_size,
            background,
            viewport_size,
            min_zoom,
            max_zoom,
            zoom_step,
            history_limit,
            guideline_threshold,
            snap_to_grid,
            grid_size,
            edit_timeout_secs,
            extra,
        } = partial;

        if let Some(v) = frame_size {
            config.frame_size = v;
        }
        if let Some(v) = background {
            config.background = v;
        }
        if let Some(v) = viewport_size {
            config.viewport_size = v;
        }
        if let Some(v) = min_zoom {
            config.min_zoom = v;
        }
        if let Some(v) = max_zoom {
            config.max_zoom = v;
        }
        if let Some(v) = zoom_step {
            config.zoom_step = v;
        }
        if let Some(v) = history_limit {
            config.history_limit = v;
        }
        if let Some(v) = guideline_threshold {
            config.guideline_threshold = v;
        }
        if let Some(v) = snap_to_grid {
            config.snap_to_grid = v;
        }
        if let Some(v) = grid_size {
            config.grid_size = v;
        }
        if let Some(v) = edit_timeout_secs {
            config.edit_timeout_secs = v;
        }
        config.extra.extend(extra);
        config.id = id.to_string();

        config.sanitize();
        config
    }

    /// Replace values the controllers cannot work with.
    fn sanitize(&mut self) {
        let defaults = Self::default();
        if !is_positive(self.min_zoom) {
            log::warn!("min_zoom {} is not positive, using {}", self.min_zoom, defaults.min_zoom);
            self.min_zoom = defaults.min_zoom;
        }
        if !is_positive(self.max_zoom) {
            log::warn!("max_zoom {} is not positive, using {}", self.max_zoom, defaults.max_zoom);
            self.max_zoom = defaults.max_zoom.max(self.min_zoom);
        }
        if self.max_zoom < self.min_zoom {
            log::warn!("Zoom range {}..{} is reversed", self.min_zoom, self.max_zoom);
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            log::warn!("zoom_step {} must exceed 1, using {}", self.zoom_step, defaults.zoom_step);
            self.zoom_step = defaults.zoom_step;
        }
        if self.history_limit == 0 {
            log::warn!("history_limit 0 would disable undo, keeping 1 state");
            self.history_limit = 1;
        }
        if !is_positive_size(self.frame_size) {
            log::warn!("frame_size {:?} is empty, using the default", self.frame_size);
            self.frame_size = defaults.frame_size;
        }
        if !is_positive_size(self.viewport_size) {
            log::warn!("viewport_size {:?} is empty, using the default", self.viewport_size);
            self.viewport_size = defaults.viewport_size;
        }
        if self.guideline_threshold.is_nan() || self.guideline_threshold < 0.0 {
            log::warn!(
                "guideline_threshold {} is negative, snapping disabled",
                self.guideline_threshold
            );
            self.guideline_threshold = 0.0;
        }
        if !is_positive(self.grid_size) {
            log::warn!("grid_size {} is not positive, using {}", self.grid_size, defaults.grid_size);
            self.grid_size = defaults.grid_size;
        }
    }

    pub fn edit_timeout(&self) -> Duration {
        Duration::from_secs(self.edit_timeout_secs)
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_positive_size(size: Size) -> bool {
    is_positive(size.width) && is_positive(size.height)
}

/// Caller-supplied overrides; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialEditorConfig {
    /// Accepted for compatibility but always replaced by the editor id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_size: Option<Size>,
    #[serde(
        with = "hex_color::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub background: Option<SerializableColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport_size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom_step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guideline_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snap_to_grid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_timeout_secs: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialEditorConfig {
    /// Parse overrides from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Colors are written as `#rrggbb[aa]` strings in configuration files.
mod hex_color {
    use plutis_core::SerializableColor;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(color: &SerializableColor, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&color.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SerializableColor, D::Error> {
        let hex = String::deserialize(d)?;
        SerializableColor::from_hex(&hex)
            .ok_or_else(|| D::Error::custom(format!("invalid color: {hex}")))
    }

    pub mod option {
        use plutis_core::SerializableColor;
        use serde::{Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            color: &Option<SerializableColor>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match color {
                Some(color) => super::serialize(color, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<SerializableColor>, D::Error> {
            super::deserialize(d).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert!((config.frame_size.width - 1200.0).abs() < f64::EPSILON);
        assert_eq!(config.background, SerializableColor::white());
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.edit_timeout(), Duration::from_secs(300));
        assert!(!config.snap_to_grid);
    }

    #[test]
    fn test_id_always_wins() {
        let partial = PartialEditorConfig {
            id: Some("other".into()),
            ..Default::default()
        };
        let config = EditorConfig::merged(partial, "e1");
        assert_eq!(config.id, "e1");
    }

    #[test]
    fn test_partial_overrides_defaults() {
        let partial = PartialEditorConfig::from_json(
            r##"{"history_limit": 5, "background": "#000000", "theme": "dark"}"##,
        )
        .unwrap();
        let config = EditorConfig::merged(partial, "e1");

        assert_eq!(config.history_limit, 5);
        assert_eq!(config.background, SerializableColor::black());
        assert!((config.zoom_step - 1.2).abs() < f64::EPSILON);
        assert_eq!(config.extra.get("theme"), Some(&Value::from("dark")));
    }

    #[test]
    fn test_id_in_json_does_not_leak_into_extra() {
        let partial = PartialEditorConfig::from_json(r#"{"id": "json-id"}"#).unwrap();
        assert_eq!(partial.id.as_deref(), Some("json-id"));
        let config = EditorConfig::merged(partial, "e1");
        assert_eq!(config.id, "e1");
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_out_of_range_values_are_replaced() {
        let partial = PartialEditorConfig {
            min_zoom: Some(5.0),
            max_zoom: Some(1.0),
            zoom_step: Some(0.5),
            history_limit: Some(0),
            frame_size: Some(Size::new(0.0, 300.0)),
            guideline_threshold: Some(-4.0),
            grid_size: Some(f64::NAN),
            ..Default::default()
        };
        let config = EditorConfig::merged(partial, "e1");
        let defaults = EditorConfig::default();

        assert!((config.min_zoom - 1.0).abs() < f64::EPSILON);
        assert!((config.max_zoom - 5.0).abs() < f64::EPSILON);
        assert!((config.zoom_step - defaults.zoom_step).abs() < f64::EPSILON);
        assert_eq!(config.history_limit, 1);
        assert_eq!(config.frame_size, defaults.frame_size);
        assert!(config.guideline_threshold.abs() < f64::EPSILON);
        assert!((config.grid_size - defaults.grid_size).abs() < f64::EPSILON);
    }

    #[test]
    fn test_any_id_is_accepted() {
        let config = EditorConfig::merged(PartialEditorConfig::default(), "");
        assert_eq!(config.id, "");
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_bad_color_fails_to_parse() {
        assert!(matches!(
            PartialEditorConfig::from_json(r#"{"background": "teal"}"#),
            Err(crate::error::EditorError::Serialization(_))
        ));
    }

    #[test]
    fn test_config_serializes_background_as_hex() {
        let json = serde_json::to_value(EditorConfig::default()).unwrap();
        assert_eq!(json["background"], Value::from("#ffffff"));
    }
}
