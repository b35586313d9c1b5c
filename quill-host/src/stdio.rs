use std::io::Write;

use parking_lot::Mutex;
use quill_core::host::ArgumentValue;
use quill_core::{ProcessRegistry, TitleService};
use quill_editor::bridge::CommandSink;
use quill_editor::protocol::{EditorCommand, EditorEvent};
use serde::Deserialize;

/// Writes each command as one JSON line on stdout.
pub struct StdoutSink;

impl CommandSink for StdoutSink {
    fn send(&self, command: EditorCommand) {
        let json = match serde_json::to_string(&command) {
            Ok(j) => j,
            Err(e) => {
                log::error!("Failed to serialize EditorCommand: {}", e);
                return;
            }
        };
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json).and_then(|_| stdout.flush()) {
            log::error!("Failed to write command: {}", e);
        }
    }
}

/// Messages handled by the host itself rather than the engine.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum HostCommand {
    Open { path: String },
    Quit,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Incoming {
    Host(HostCommand),
    Editor(EditorEvent),
}

pub fn parse_line(line: &str) -> Result<Incoming, String> {
    serde_json::from_str(line).map_err(|e| format!("Invalid message '{}': {}", line, e))
}

/// Window chrome for a headless host: keeps the last title and logs changes.
#[derive(Default)]
pub struct LogWindow {
    title: Mutex<String>,
}

impl LogWindow {
    pub fn title(&self) -> String {
        self.title.lock().clone()
    }
}

impl ProcessRegistry for LogWindow {
    fn set_argument(&self, id: &str, key: &str, _value: ArgumentValue) {
        log::debug!("Process {}: argument '{}' set", id, key);
    }
}

impl TitleService for LogWindow {
    fn prepend_file_to_title(&self, id: &str, name: &str, dirty: bool) {
        let title = if dirty {
            format!("{}* - Quill", name)
        } else {
            format!("{} - Quill", name)
        };
        log::info!("Process {}: title '{}'", id, title);
        *self.title.lock() = title;
    }

    fn set_loading(&self, id: &str, loading: bool) {
        log::debug!("Process {}: loading={}", id, loading);
    }
}
