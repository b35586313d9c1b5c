//! Test doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use quill_core::host::ArgumentValue;
use quill_core::{FileSystem, FsError, LockRegistry, NameLockRegistry, ProcessRegistry, TitleService};
use tokio::sync::Notify;

use crate::bridge::{BridgeEngine, CommandSink};
use crate::engine::{Engine, EngineLoader};
use crate::protocol::{EditorCommand, EngineConfig};

pub fn same_engine(a: &Arc<dyn Engine>, b: &Arc<dyn Engine>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

// ---------------------------------------------------------------------------
// Command sink
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSink {
    commands: Mutex<Vec<EditorCommand>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn commands(&self) -> Vec<EditorCommand> {
        self.commands.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&EditorCommand) -> bool) -> usize {
        self.commands.lock().iter().filter(|c| pred(c)).count()
    }
}

impl CommandSink for RecordingSink {
    fn send(&self, command: EditorCommand) {
        self.commands.lock().push(command);
    }
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryFs {
    files: Mutex<HashMap<String, Vec<u8>>>,
    writes: Mutex<Vec<(String, String, bool)>>,
    folder_updates: Mutex<Vec<(String, String)>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    fail_writes: AtomicBool,
}

impl MemoryFs {
    pub fn with_files(files: &[(&str, &str)]) -> Arc<Self> {
        let fs = Self::default();
        for (path, content) in files {
            fs.files
                .lock()
                .insert(path.to_string(), content.as_bytes().to_vec());
        }
        Arc::new(fs)
    }

    pub fn insert_bytes(&self, path: &str, bytes: Vec<u8>) {
        self.files.lock().insert(path.to_string(), bytes);
    }

    /// Reads of `path` block until the returned gate is notified.
    pub fn gate(&self, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(path.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<(String, String, bool)> {
        self.writes.lock().clone()
    }

    pub fn folder_updates(&self) -> Vec<(String, String)> {
        self.folder_updates.lock().clone()
    }
}

#[async_trait]
impl FileSystem for MemoryFs {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let gate = self.gates.lock().get(path).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        overwrite: bool,
    ) -> Result<(), FsError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FsError::Io {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.writes.lock().push((
            path.to_string(),
            String::from_utf8_lossy(content).into_owned(),
            overwrite,
        ));
        self.files.lock().insert(path.to_string(), content.to_vec());
        Ok(())
    }

    fn update_folder(&self, dir: &str, name: &str) {
        self.folder_updates
            .lock()
            .push((dir.to_string(), name.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Window / process host
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingHost {
    titles: Mutex<Vec<(String, String, bool)>>,
    loading: Mutex<Vec<(String, bool)>>,
    arguments: Mutex<Vec<(String, String, ArgumentValue)>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn titles(&self) -> Vec<(String, String, bool)> {
        self.titles.lock().clone()
    }

    pub fn loading(&self) -> Vec<(String, bool)> {
        self.loading.lock().clone()
    }

    pub fn argument_keys(&self) -> Vec<(String, String)> {
        self.arguments
            .lock()
            .iter()
            .map(|(id, key, _)| (id.clone(), key.clone()))
            .collect()
    }

    pub fn argument(&self, id: &str, key: &str) -> Option<ArgumentValue> {
        self.arguments
            .lock()
            .iter()
            .rev()
            .find(|(i, k, _)| i == id && k == key)
            .map(|(_, _, value)| Arc::clone(value))
    }
}

impl ProcessRegistry for RecordingHost {
    fn set_argument(&self, id: &str, key: &str, value: ArgumentValue) {
        self.arguments
            .lock()
            .push((id.to_string(), key.to_string(), value));
    }
}

impl TitleService for RecordingHost {
    fn prepend_file_to_title(&self, id: &str, name: &str, dirty: bool) {
        self.titles
            .lock()
            .push((id.to_string(), name.to_string(), dirty));
    }

    fn set_loading(&self, id: &str, loading: bool) {
        self.loading.lock().push((id.to_string(), loading));
    }
}

// ---------------------------------------------------------------------------
// Engine loader
// ---------------------------------------------------------------------------

/// Engine loader whose `init` can be held open, fail, or succeed at once.
pub struct GatedLoader {
    locks: Arc<NameLockRegistry>,
    gate: Option<Arc<Notify>>,
    failure: Option<String>,
    panics: bool,
    init_calls: AtomicUsize,
    configured: Mutex<Option<EngineConfig>>,
    locked_during_configure: Mutex<Option<bool>>,
    sink: Arc<RecordingSink>,
}

impl GatedLoader {
    fn build(
        locks: Arc<NameLockRegistry>,
        gate: Option<Arc<Notify>>,
        failure: Option<String>,
        panics: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            locks,
            gate,
            failure,
            panics,
            init_calls: AtomicUsize::new(0),
            configured: Mutex::new(None),
            locked_during_configure: Mutex::new(None),
            sink: RecordingSink::new(),
        })
    }

    /// `init` waits for [`gate`](Self::gate) to be notified.
    pub fn new(locks: Arc<NameLockRegistry>) -> Arc<Self> {
        Self::build(locks, Some(Arc::new(Notify::new())), None, false)
    }

    pub fn ready(locks: Arc<NameLockRegistry>) -> Arc<Self> {
        Self::build(locks, None, None, false)
    }

    pub fn failing(locks: Arc<NameLockRegistry>, reason: &str) -> Arc<Self> {
        Self::build(locks, None, Some(reason.to_string()), false)
    }

    pub fn panicking(locks: Arc<NameLockRegistry>) -> Arc<Self> {
        Self::build(locks, None, None, true)
    }

    pub fn gate(&self) -> Arc<Notify> {
        self.gate
            .clone()
            .unwrap_or_else(|| Arc::new(Notify::new()))
    }

    pub fn sink(&self) -> Arc<RecordingSink> {
        Arc::clone(&self.sink)
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn configured(&self) -> Option<EngineConfig> {
        self.configured.lock().clone()
    }

    pub fn locked_during_configure(&self) -> Option<bool> {
        *self.locked_during_configure.lock()
    }
}

#[async_trait]
impl EngineLoader for GatedLoader {
    fn configure(&self, config: &EngineConfig) {
        *self.locked_during_configure.lock() = Some(self.locks.is_locked("define"));
        *self.configured.lock() = Some(config.clone());
    }

    async fn init(&self) -> Result<Arc<dyn Engine>, String> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.panics {
            panic!("engine runtime crashed");
        }
        if let Some(reason) = &self.failure {
            return Err(reason.clone());
        }
        let engine: Arc<dyn Engine> = BridgeEngine::new(self.sink.clone());
        Ok(engine)
    }
}
