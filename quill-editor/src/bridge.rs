//! An [`Engine`] that lives on the Rust side of a command/event bridge.
//!
//! Models and editors are tracked in memory; every mutation is mirrored to
//! the real editing surface as an [`EditorCommand`], and the surface reports
//! edits and readiness back through [`BridgeEngine::handle_event`].

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

use crate::engine::{ChangeListener, CodeEditor, Engine, EngineLoader, TextModel};
use crate::protocol::{EditorCommand, EditorEvent, EditorOptions, EngineConfig};

/// Destination for engine commands. Implement this for your transport.
pub trait CommandSink: Send + Sync {
    fn send(&self, command: EditorCommand);
}

pub struct BridgeModel {
    uri: String,
    language: String,
    content: Mutex<String>,
    version: AtomicU32,
    disposed: AtomicBool,
    listeners: Mutex<Vec<ChangeListener>>,
    sink: Arc<dyn CommandSink>,
}

impl BridgeModel {
    /// Reports older than the last applied version are dropped.
    fn apply_content(&self, content: String, version: u32) {
        if self.is_disposed() || version < self.version.load(Ordering::SeqCst) {
            return;
        }
        *self.content.lock() = content;
        self.version.store(version, Ordering::SeqCst);
        for listener in self.listeners.lock().iter() {
            listener();
        }
    }
}

impl TextModel for BridgeModel {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn language(&self) -> &str {
        &self.language
    }

    fn value(&self) -> String {
        self.content.lock().clone()
    }

    fn on_did_change_content(&self, listener: ChangeListener) {
        self.listeners.lock().push(listener);
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.listeners.lock().clear();
        self.sink.send(EditorCommand::DisposeModel {
            uri: self.uri.clone(),
        });
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

pub struct BridgeEditor {
    id: String,
    model: Mutex<Option<Arc<dyn TextModel>>>,
    disposed: AtomicBool,
    sink: Arc<dyn CommandSink>,
}

impl CodeEditor for BridgeEditor {
    fn id(&self) -> &str {
        &self.id
    }

    fn model(&self) -> Option<Arc<dyn TextModel>> {
        self.model.lock().clone()
    }

    fn set_model(&self, model: Option<Arc<dyn TextModel>>) {
        if self.disposed.load(Ordering::SeqCst) {
            log::warn!("Ignoring model change on disposed editor {}", self.id);
            return;
        }
        let uri = model.as_ref().map(|m| m.uri().to_string());
        *self.model.lock() = model;
        self.sink.send(EditorCommand::SetModel {
            editor_id: self.id.clone(),
            uri,
        });
    }

    fn value(&self) -> String {
        self.model
            .lock()
            .as_ref()
            .map(|m| m.value())
            .unwrap_or_default()
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.model.lock().take();
        self.sink.send(EditorCommand::DisposeEditor {
            editor_id: self.id.clone(),
        });
    }
}

/// Rust-side mirror of the editing engine.
pub struct BridgeEngine {
    sink: Arc<dyn CommandSink>,
    models: Mutex<Vec<Arc<BridgeModel>>>,
    ready: watch::Sender<bool>,
}

impl BridgeEngine {
    pub fn new(sink: Arc<dyn CommandSink>) -> Arc<Self> {
        let (ready, _) = watch::channel(false);
        Arc::new(Self {
            sink,
            models: Mutex::new(Vec::new()),
            ready,
        })
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Apply an event reported by the editing surface. Returns `false` for
    /// events the engine does not consume (key presses are routed to
    /// sessions by the host).
    pub fn handle_event(&self, event: &EditorEvent) -> bool {
        match event {
            EditorEvent::Ready => {
                self.ready.send_replace(true);
                true
            }
            EditorEvent::ContentChanged {
                uri,
                content,
                version,
            } => {
                let model = self.live_model(uri);
                match model {
                    Some(model) => model.apply_content(content.clone(), *version),
                    None => log::debug!("Content change for unknown model {}", uri),
                }
                true
            }
            EditorEvent::KeyDown { .. } => false,
        }
    }

    fn live_model(&self, uri: &str) -> Option<Arc<BridgeModel>> {
        self.models
            .lock()
            .iter()
            .find(|m| m.uri == uri && !m.is_disposed())
            .cloned()
    }

    async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives as long as `self`.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Engine for BridgeEngine {
    fn model_uris(&self) -> Vec<String> {
        let mut models = self.models.lock();
        models.retain(|m| !m.is_disposed());
        models.iter().map(|m| m.uri.clone()).collect()
    }

    fn create_model(
        &self,
        content: &str,
        language: &str,
        uri: &str,
    ) -> Result<Arc<dyn TextModel>, String> {
        let mut models = self.models.lock();
        models.retain(|m| !m.is_disposed());
        if models.iter().any(|m| m.uri == uri) {
            return Err(format!("Model already exists: {}", uri));
        }

        let model = Arc::new(BridgeModel {
            uri: uri.to_string(),
            language: language.to_string(),
            content: Mutex::new(content.to_string()),
            version: AtomicU32::new(0),
            disposed: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
            sink: Arc::clone(&self.sink),
        });
        models.push(Arc::clone(&model));
        drop(models);

        self.sink.send(EditorCommand::CreateModel {
            uri: uri.to_string(),
            content: content.to_string(),
            language: language.to_string(),
        });
        Ok(model)
    }

    fn create_editor(&self, container: &str, options: &EditorOptions) -> Arc<dyn CodeEditor> {
        let editor = Arc::new(BridgeEditor {
            id: Uuid::new_v4().to_string(),
            model: Mutex::new(None),
            disposed: AtomicBool::new(false),
            sink: Arc::clone(&self.sink),
        });
        self.sink.send(EditorCommand::CreateEditor {
            editor_id: editor.id.clone(),
            container: container.to_string(),
            options: options.clone(),
        });
        editor
    }
}

/// [`EngineLoader`] for a [`BridgeEngine`]: sends the configuration and
/// resolves once the surface reports [`EditorEvent::Ready`].
pub struct BridgeLoader {
    engine: Arc<BridgeEngine>,
}

impl BridgeLoader {
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self {
            engine: BridgeEngine::new(sink),
        }
    }

    /// The engine events must be routed to, even before initialization completes.
    pub fn engine(&self) -> &Arc<BridgeEngine> {
        &self.engine
    }
}

#[async_trait]
impl EngineLoader for BridgeLoader {
    fn configure(&self, config: &EngineConfig) {
        self.engine.sink.send(EditorCommand::Configure {
            config: config.clone(),
        });
    }

    async fn init(&self) -> Result<Arc<dyn Engine>, String> {
        self.engine.wait_ready().await;
        let engine: Arc<dyn Engine> = self.engine.clone();
        Ok(engine)
    }
}
