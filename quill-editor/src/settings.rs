use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::protocol::{EditorOptions, EngineConfig};

/// Editor session settings, persisted to `<config dir>/quill/editor.json`.
///
/// `#[serde(default)]` on the struct fills in fields missing from older
/// settings files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    // ── Engine ───────────────────────────────────────────────────────────
    pub asset_base_path: String,
    pub theme: String,
    pub automatic_layout: bool,

    // ── Documents ────────────────────────────────────────────────────────
    /// Where an untitled buffer is written on its first save.
    pub default_save_path: String,
    /// Separates a model's logical path from its instance counter.
    pub model_delimiter: String,

    // ── Name locks ───────────────────────────────────────────────────────
    pub bootstrap_lock: String,
    pub swap_lock: String,
    /// Grace window after a document swap before the swap lock is re-taken.
    pub relock_delay_ms: u64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        EditorSettings {
            // Engine
            asset_base_path: String::from("/System/Monaco/vs"),
            theme: String::from("vs-dark"),
            automatic_layout: true,

            // Documents
            default_save_path: String::from("/Users/Public/Desktop/Untitled.txt"),
            model_delimiter: String::from(crate::model::DEFAULT_DELIMITER),

            // Name locks
            bootstrap_lock: String::from("define"),
            swap_lock: String::from("define"),
            relock_delay_ms: 2500,
        }
    }
}

impl EditorSettings {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            asset_base_path: self.asset_base_path.clone(),
            theme: self.theme.clone(),
        }
    }

    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            automatic_layout: Some(self.automatic_layout),
            theme: Some(self.theme.clone()),
        }
    }

    pub fn relock_delay(&self) -> Duration {
        Duration::from_millis(self.relock_delay_ms)
    }
}

fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("quill").join("editor.json"))
}

/// Load settings from the user config directory, falling back to defaults.
pub fn load() -> EditorSettings {
    match settings_path() {
        Some(path) => load_from(&path),
        None => EditorSettings::default(),
    }
}

/// Load settings from `path`; a missing or malformed file yields defaults.
pub fn load_from(path: &Path) -> EditorSettings {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed settings file {:?}: {}", path, e);
            EditorSettings::default()
        }),
        Err(_) => EditorSettings::default(),
    }
}

pub fn save(settings: &EditorSettings) -> Result<(), String> {
    let path = settings_path().ok_or_else(|| "Cannot determine config directory".to_string())?;
    save_to(settings, &path)
}

pub fn save_to(settings: &EditorSettings, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create settings directory: {}", e))?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("Failed to write {:?}: {}", path, e))
}
