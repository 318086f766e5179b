//! Startup configuration.
//!
//! The harness reads an optional JSON file. Every field has a default, so an
//! empty object (or no file at all) yields a working setup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::abs::PixelFormat;
use crate::error::{HarnessError, Result};

const CONFIG_FILE_NAME: &str = "dockview.json";

/// Window creation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Desktop fullscreen. Width and height are ignored when set.
    pub fullscreen: bool,
    /// Size the window to the primary display's usable work area.
    pub fit_to_workarea: bool,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "dockview".to_string(),
            fullscreen: false,
            fit_to_workarea: false,
            vsync: true,
        }
    }
}

/// Locations of the hot-reloaded quad shader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self {
            vertex: PathBuf::from("resources/shaders/quad.vert"),
            fragment: PathBuf::from("resources/shaders/quad.frag"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub window: WindowConfig,
    pub shaders: ShaderPaths,
    /// Clear color of the main window behind the GUI.
    pub clear_color: [f32; 4],
    /// Clear color of the offscreen surface behind the quad.
    pub scene_clear_color: [f32; 4],
    /// Channel order the quad's checker texture is generated and uploaded in.
    pub checker_format: PixelFormat,
    /// Let GUI viewports become separate OS windows.
    pub multi_viewport: bool,
    pub hot_reload: bool,
    pub log_level: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            shaders: ShaderPaths::default(),
            clear_color: [0.2, 0.2, 0.2, 1.0],
            scene_clear_color: [0.08, 0.08, 0.1, 1.0],
            checker_format: PixelFormat::Bgr,
            multi_viewport: false,
            hot_reload: true,
            log_level: "info".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, `dockview.json` in the
    /// working directory is tried, then the user config directory, then
    /// the built-in defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::candidates().into_iter().find(|p| p.is_file()) {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    fn candidates() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("dockview").join(CONFIG_FILE_NAME));
        }
        candidates
    }

    /// Reads a config file. Relative shader paths are resolved against the
    /// file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut config = Self::from_json_str(&text).map_err(|reason| HarnessError::Config {
            path: path.to_path_buf(),
            reason,
        })?;
        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.shaders.vertex = resolve(base, &config.shaders.vertex);
            config.shaders.fragment = resolve(base, &config.shaders.fragment);
        }
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> std::result::Result<Self, String> {
        let config: Self = serde_json::from_str(s).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            ));
        }
        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
