//! Viewer configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "window": { "width": 1280, "height": 720 }, "pick_strategy": "ColorId" }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::gfx::picking::PickStrategy;
use crate::gfx::scene::{EditSpeeds, IngestOptions, ShadingMode};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "ViewerOBJ Pro".to_string(),
            width: 800,
            height: 600,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Degrees of orbit per pixel of drag.
    pub rotate_speed: f32,
    /// Distance change per frame while an arrow key is held.
    pub dolly_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 1.5, 3.0],
            target: [0.0, 0.0, 0.0],
            fov_deg: 45.0,
            near: 0.1,
            far: 100.0,
            rotate_speed: 0.4,
            dolly_speed: 0.005,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub default_object: [f32; 3],
    pub selection: [f32; 3],
    /// Tint for every unselected object; `None` keeps their own colors.
    pub override_color: Option<[f32; 3]>,
    pub background: [f32; 3],
    pub light: [f32; 3],
    pub grid: [f32; 3],
    pub normals: [f32; 3],
    pub bounding_box: [f32; 3],
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            default_object: [0.7, 0.7, 0.7],
            selection: [1.0, 0.0, 0.0],
            override_color: None,
            background: [0.46, 0.46, 0.46],
            light: [1.0, 1.0, 1.0],
            grid: [0.7, 0.7, 0.7],
            normals: [0.7, 0.7, 0.7],
            bounding_box: [1.0, 1.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub show_grid: bool,
    pub show_normals: bool,
    pub show_bounding_box: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_normals: false,
            show_bounding_box: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub edit: EditSpeeds,
    pub colors: ColorConfig,
    pub debug: DebugConfig,
    pub platform_height: f32,
    pub pick_strategy: PickStrategy,
    pub shading: ShadingMode,
    pub normalize_on_import: bool,
    pub scene_file: PathBuf,
    pub export_file: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            edit: EditSpeeds::default(),
            colors: ColorConfig::default(),
            debug: DebugConfig::default(),
            platform_height: -0.5,
            pick_strategy: PickStrategy::Analytic,
            shading: ShadingMode::Flat,
            normalize_on_import: true,
            scene_file: PathBuf::from("scene.json"),
            export_file: PathBuf::from("scene.obj"),
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            normalize: self.normalize_on_import,
            shading: self.shading,
            default_color: self.colors.default_object,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config: ViewerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.window.title, "ViewerOBJ Pro");
        assert_eq!(config.platform_height, -0.5);
        assert_eq!(config.pick_strategy, PickStrategy::Analytic);
        assert!(config.ingest_options().normalize);
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let config: ViewerConfig = serde_json::from_str(
            r#"{ "window": { "width": 1280 }, "pick_strategy": "ColorId", "edit": { "max_scale": 4.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.pick_strategy, PickStrategy::ColorId);

        assert_eq!(config.edit.max_scale, 4.0);
        assert_eq!(config.edit.min_scale, EditSpeeds::default().min_scale);
    }

    #[test]
    fn test_default_object_color_reaches_ingestion() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{ "colors": { "default_object": [0.2, 0.3, 0.4] } }"#).unwrap();
        assert_eq!(config.ingest_options().default_color, [0.2, 0.3, 0.4]);
        assert_eq!(
            ViewerConfig::default().ingest_options().default_color,
            crate::gfx::scene::ingest::DEFAULT_COLOR
        );
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let err = ViewerConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
