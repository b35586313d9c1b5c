use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Commands: Rust → engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EditorCommand {
    Configure {
        config: EngineConfig,
    },
    CreateEditor {
        editor_id: String,
        container: String,
        options: EditorOptions,
    },
    CreateModel {
        uri: String,
        content: String,
        language: String,
    },
    DisposeModel {
        uri: String,
    },
    SetModel {
        editor_id: String,
        uri: Option<String>,
    },
    DisposeEditor {
        editor_id: String,
    },
}

// ---------------------------------------------------------------------------
// Events: engine → Rust
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EditorEvent {
    Ready,
    ContentChanged {
        uri: String,
        content: String,
        version: u32,
    },
    KeyDown {
        editor_id: String,
        event: KeyEvent,
    },
}

// ---------------------------------------------------------------------------
// Supporting Types
// ---------------------------------------------------------------------------

/// One-time engine configuration applied before initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base path the engine loads its scripts and workers from.
    pub asset_base_path: String,
    pub theme: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic_layout: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

/// Legacy numeric key code for "S".
pub const KEY_CODE_S: u32 = 83;

/// A key-down event as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub meta_key: bool,
    /// Symbolic key code, e.g. `"KeyS"`.
    #[serde(default)]
    pub code: String,
    /// Legacy numeric key code.
    #[serde(default)]
    pub key_code: u32,
}

impl KeyEvent {
    /// Control (or Command) + S, matched by symbolic or legacy code.
    pub fn is_save(&self) -> bool {
        (self.ctrl_key || self.meta_key) && (self.code == "KeyS" || self.key_code == KEY_CODE_S)
    }
}
