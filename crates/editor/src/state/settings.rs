//! Editor settings

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Segmentation service connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Single endpoint all actions are posted to
    pub endpoint: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080/".to_string(),
        }
    }
}

/// How annotation visuals are drawn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Opacity factor for split results awaiting verification
    pub pending_opacity: f32,
    /// Opacity of a cell while its split is in flight
    pub awaiting_opacity: f32,
    /// Scale applied to the focused cell in single-cell mode
    pub marker_scale: f32,
    /// Edge length of split seed cubes, in voxels
    pub helper_size: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            pending_opacity: 0.5,
            awaiting_opacity: 0.6,
            marker_scale: 0.1,
            helper_size: 1.0,
        }
    }
}

/// All editor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Service connection
    #[serde(default)]
    pub server: ServerSettings,
    /// World units per voxel edge
    pub voxel_size: f32,
    /// Visual settings
    #[serde(default)]
    pub display: DisplaySettings,
    /// Remember cell colors per mask across sessions
    #[serde(default = "default_true")]
    pub persist_palette: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            voxel_size: 0.1,
            display: DisplaySettings::default(),
            persist_palette: true,
        }
    }
}

impl EditorSettings {
    /// Settings for headless runs: nothing is read from or written to disk
    pub fn ephemeral() -> Self {
        Self {
            persist_palette: false,
            ..Self::default()
        }
    }

    fn config_path() -> Option<std::path::PathBuf> {
        directories::ProjectDirs::from("org", "cell-editor", "cell-editor")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Settings stored at `path`, if present and well formed
    pub fn load_from(path: &Path) -> Option<Self> {
        let json = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&json) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!("Ignoring malformed settings {}: {e}", path.display());
                None
            }
        }
    }

    /// Save settings to file
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        match self.save_to(&path) {
            Ok(()) => tracing::info!("Saved settings to {}", path.display()),
            Err(e) => tracing::warn!("Could not write settings: {e}"),
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}
