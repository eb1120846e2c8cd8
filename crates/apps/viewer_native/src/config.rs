use std::path::Path;

use overlay::PopupConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config read failed: {e}"),
            ConfigError::Json(e) => write!(f, "config json invalid: {e}"),
            ConfigError::Invalid(msg) => write!(f, "config invalid: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Initial camera placement, in degrees and meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub height_m: f64,
    pub heading_deg: f64,
    pub pitch_deg: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            lon_deg: 120.723_5,
            lat_deg: 31.018_4,
            height_m: 1_500.0,
            heading_deg: 0.0,
            pitch_deg: -90.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Canvas size `[width, height]` in pixels.
    pub canvas: [f64; 2],
    /// Laid-out popup size `[width, height]`; the in-memory DOM has no layout engine.
    pub popup_size: [f64; 2],
    pub camera: CameraConfig,
    pub popup: PopupConfig,
    pub pick_tolerance_px: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            canvas: [1280.0, 720.0],
            popup_size: [240.0, 120.0],
            camera: CameraConfig::default(),
            popup: PopupConfig::default(),
            pick_tolerance_px: 8.0,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_json::from_str(json).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let [w, h] = self.canvas;
        if !(w > 0.0 && h > 0.0) {
            return Err(ConfigError::Invalid(format!("canvas must be positive, got {w}x{h}")));
        }
        if !(self.pick_tolerance_px >= 0.0) {
            return Err(ConfigError::Invalid("pick_tolerance_px must be >= 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ViewerConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ViewerConfig::from_json_str(
            r#"{"camera": {"height_m": 800}, "popup": {"class_name": "dark", "offset": [0, -8]}}"#,
        )
        .expect("valid");
        assert_eq!(config.camera.height_m, 800.0);
        assert_eq!(config.camera.pitch_deg, -90.0);
        assert_eq!(config.canvas, [1280.0, 720.0]);
        assert_eq!(config.popup.class_name.as_deref(), Some("dark"));
        assert_eq!(config.popup.offset, [0.0, -8.0]);
    }

    #[test]
    fn rejects_empty_canvas() {
        let err = ViewerConfig::from_json_str(r#"{"canvas": [0, 720]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
