use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AnnotatorError;
use crate::export::ExportFilter;

const CONFIG_ENV: &str = "ANNOTATE_BOXES_CONFIG";
const CONFIG_FILE: &str = "annotate-boxes.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: f32,
    #[serde(default = "default_window_height")]
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f32,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,
    /// Grab radius of resize handles, in screen pixels.
    #[serde(default = "default_handle_radius")]
    pub handle_radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_suffix")]
    pub suffix: String,
    #[serde(default = "default_true")]
    pub pretty: bool,
    #[serde(default)]
    pub filter: ExportFilter,
}

fn default_window_width() -> f32 {
    1200.0
}

fn default_window_height() -> f32 {
    800.0
}

fn default_min_zoom() -> f32 {
    0.1
}

fn default_max_zoom() -> f32 {
    10.0
}

fn default_handle_radius() -> f32 {
    6.0
}

fn default_export_suffix() -> String {
    "-annotations.json".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            handle_radius: default_handle_radius(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            suffix: default_export_suffix(),
            pretty: true,
            filter: ExportFilter::All,
        }
    }
}

/// `$ANNOTATE_BOXES_CONFIG`, or `annotate-boxes.toml` in the working directory.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

pub fn parse_config(path: &Path) -> Result<AnnotatorConfig, AnnotatorError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| AnnotatorError::Read(path.to_path_buf(), e))?;
    toml::from_str(&content).map_err(|e| AnnotatorError::Config(path.to_path_buf(), e))
}

/// Loads the config, falling back to defaults when the file is missing or
/// broken.
pub fn load_config() -> AnnotatorConfig {
    let path = config_path();
    if !path.exists() {
        return AnnotatorConfig::default();
    }
    match parse_config(&path) {
        Ok(config) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("{e}. Using defaults.");
            AnnotatorConfig::default()
        }
    }
}
