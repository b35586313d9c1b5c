//! One editor instance bound to one container.
//!
//! A session walks `Uninitialized → EngineLoading → EngineReady →
//! EditorMounted` and swaps models whenever its target path changes. It
//! owns the editor and the installed model; the engine is shared.

use std::sync::Arc;

use parking_lot::Mutex;
use quill_core::util;
use quill_core::{FileSystem, LockRegistry, ProcessRegistry, TitleService};
use tokio::task::JoinHandle;

use crate::engine::{CodeEditor, Engine, EngineBootstrapper, EngineState};
use crate::error::SessionError;
use crate::loader::DocumentLoader;
use crate::model::{self, ModelUriAllocator};
use crate::protocol::KeyEvent;
use crate::settings::EditorSettings;

/// Process argument key the editor is published under.
pub const EDITOR_ARGUMENT: &str = "editor";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    EngineLoading,
    EngineReady,
    EditorMounted { model_loaded: bool },
    /// The engine failed to bootstrap; the session will never become ready.
    Unavailable,
    TornDown,
}

/// Whether a key event was consumed by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// The host must suppress its native handling of the event.
    Handled,
    PassThrough,
}

/// Where and what a save key press writes, captured when the key fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTarget {
    pub path: String,
    pub content: String,
}

/// Host collaborators a session talks to.
#[derive(Clone)]
pub struct SessionServices {
    pub fs: Arc<dyn FileSystem>,
    pub processes: Arc<dyn ProcessRegistry>,
    pub title: Arc<dyn TitleService>,
    pub locks: Arc<dyn LockRegistry>,
}

#[derive(Default)]
struct SessionInner {
    engine: Option<Arc<dyn Engine>>,
    editor: Option<Arc<dyn CodeEditor>>,
    container: Option<String>,
    path: String,
    /// Bumped on every reload; a load only installs if it is still current.
    load_seq: u64,
    relock: Option<JoinHandle<()>>,
    torn_down: bool,
}

pub struct Session {
    id: String,
    bootstrapper: Arc<EngineBootstrapper>,
    services: SessionServices,
    settings: EditorSettings,
    loader: DocumentLoader,
    inner: Mutex<SessionInner>,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        bootstrapper: Arc<EngineBootstrapper>,
        services: SessionServices,
        settings: EditorSettings,
    ) -> Self {
        let id = id.into();
        let loader = DocumentLoader::new(
            id.clone(),
            Arc::clone(&services.fs),
            Arc::clone(&services.title),
            ModelUriAllocator::new(settings.model_delimiter.clone()),
        );
        Self {
            id,
            bootstrapper,
            services,
            settings,
            loader,
            inner: Mutex::new(SessionInner::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> String {
        self.inner.lock().path.clone()
    }

    pub fn editor(&self) -> Option<Arc<dyn CodeEditor>> {
        self.inner.lock().editor.clone()
    }

    pub fn state(&self) -> SessionState {
        let inner = self.inner.lock();
        if inner.torn_down {
            return SessionState::TornDown;
        }
        if let Some(editor) = &inner.editor {
            return SessionState::EditorMounted {
                model_loaded: editor.model().is_some(),
            };
        }
        if inner.engine.is_some() {
            return SessionState::EngineReady;
        }
        match self.bootstrapper.state() {
            EngineState::Idle => SessionState::Uninitialized,
            EngineState::Loading => SessionState::EngineLoading,
            // Ready but not yet picked up by this session.
            EngineState::Ready => SessionState::Uninitialized,
            EngineState::Failed(_) => SessionState::Unavailable,
        }
    }

    /// Bring the session up: obtain the shared engine, create the editor if
    /// a container is attached, and load the current path.
    pub async fn mount(&self) -> Result<(), SessionError> {
        let has_engine = {
            let inner = self.inner.lock();
            if inner.torn_down {
                return Err(SessionError::TornDown);
            }
            inner.engine.is_some()
        };

        if !has_engine {
            let engine = match self.bootstrapper.ensure_engine().await {
                Ok(engine) => engine,
                Err(e) => {
                    log::warn!("Session {}: {}", self.id, e);
                    return Err(e);
                }
            };
            let mut inner = self.inner.lock();
            if inner.torn_down {
                return Err(SessionError::TornDown);
            }
            if inner.engine.is_none() {
                inner.engine = Some(engine);
            }
        }

        if self.create_editor() {
            self.reload().await?;
        }
        Ok(())
    }

    /// Bind the session to its container element. Creates the editor when
    /// the engine is already available.
    pub async fn attach_container(&self, container: impl Into<String>) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.lock();
            if inner.torn_down {
                return Err(SessionError::TornDown);
            }
            inner.container = Some(container.into());
        }
        if self.create_editor() {
            self.reload().await?;
        }
        Ok(())
    }

    /// Create the editor once the engine and container both exist. Returns
    /// `true` only for the call that created it.
    fn create_editor(&self) -> bool {
        let editor = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.torn_down || inner.editor.is_some() {
                return false;
            }
            let (Some(engine), Some(container)) = (&inner.engine, &inner.container) else {
                return false;
            };
            let editor = engine.create_editor(container, &self.settings.editor_options());
            log::info!(
                "Session {}: editor {} mounted in {}",
                self.id,
                editor.id(),
                container
            );
            inner.editor = Some(Arc::clone(&editor));
            editor
        };

        self.services
            .processes
            .set_argument(&self.id, EDITOR_ARGUMENT, Arc::new(editor));
        self.services.title.set_loading(&self.id, false);
        true
    }

    /// Point the session at `path` and load it.
    pub async fn set_path(&self, path: impl Into<String>) -> Result<(), SessionError> {
        let path = path.into();
        {
            let mut inner = self.inner.lock();
            if inner.torn_down {
                return Err(SessionError::TornDown);
            }
            if inner.path == path {
                return Ok(());
            }
            inner.path = path;
        }
        self.reload().await
    }

    /// Replace the installed model with a fresh one for the current path.
    ///
    /// Does nothing until both engine and editor exist, or when the path is
    /// not absolute. A failed read leaves the previous model installed. If a
    /// newer reload starts while this one is reading, this one is dropped.
    pub async fn reload(&self) -> Result<(), SessionError> {
        let (engine, editor, path, seq) = {
            let mut inner = self.inner.lock();
            if inner.torn_down {
                return Err(SessionError::TornDown);
            }
            let (Some(engine), Some(editor)) = (inner.engine.clone(), inner.editor.clone()) else {
                return Ok(());
            };
            if !util::is_absolute(&inner.path) {
                return Ok(());
            }
            inner.load_seq += 1;
            (engine, editor, inner.path.clone(), inner.load_seq)
        };

        let source = match self.loader.fetch(&path).await {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Session {}: {}", self.id, e);
                return Err(e);
            }
        };

        {
            let mut inner = self.inner.lock();
            if inner.torn_down || inner.load_seq != seq {
                log::debug!("Session {}: discarding superseded load of {}", self.id, path);
                return Ok(());
            }

            self.services.locks.unlock(&self.settings.swap_lock);
            if let Some(previous) = editor.model() {
                previous.dispose();
            }
            let model = match self.loader.materialize(engine.as_ref(), source) {
                Ok(model) => model,
                Err(e) => {
                    log::warn!("Session {}: {}", self.id, e);
                    editor.set_model(None);
                    self.schedule_relock(&mut inner);
                    return Err(e);
                }
            };
            editor.set_model(Some(model));
            self.schedule_relock(&mut inner);
        }

        self.services
            .title
            .prepend_file_to_title(&self.id, util::basename(&path), false);
        log::info!("Session {}: opened {}", self.id, path);
        Ok(())
    }

    /// Re-take the swap lock after the grace window. A newer swap replaces
    /// the pending timer.
    fn schedule_relock(&self, inner: &mut SessionInner) {
        if let Some(pending) = inner.relock.take() {
            pending.abort();
        }
        let locks = Arc::clone(&self.services.locks);
        let name = self.settings.swap_lock.clone();
        let delay = self.settings.relock_delay();
        inner.relock = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            locks.lock(&name);
        }));
    }

    /// Decide whether `event` saves, and capture what to write.
    ///
    /// A model opened under an instance suffix only saves back to its own
    /// path; an untitled session saves to the default path.
    pub fn save_target(&self, event: &KeyEvent) -> Option<SaveTarget> {
        if !event.is_save() {
            return None;
        }
        let (editor, path) = {
            let inner = self.inner.lock();
            (inner.editor.clone()?, inner.path.clone())
        };

        let model_path = editor
            .model()
            .map(|m| model::base_path(m.uri(), &self.settings.model_delimiter).to_string());
        if !path.is_empty() && model_path.as_deref() != Some(path.as_str()) {
            return None;
        }

        let save_path = if path.is_empty() {
            self.settings.default_save_path.clone()
        } else {
            path
        };
        Some(SaveTarget {
            path: save_path,
            content: editor.value(),
        })
    }

    /// Key-down interceptor. Saves on the save combination; a failed write
    /// is logged and the event still counts as handled.
    pub async fn on_key_down(&self, event: &KeyEvent) -> KeyDisposition {
        let Some(target) = self.save_target(event) else {
            return KeyDisposition::PassThrough;
        };

        let name = util::basename(&target.path);
        match self
            .services
            .fs
            .write_file(&target.path, target.content.as_bytes(), true)
            .await
        {
            Ok(()) => {
                self.services
                    .fs
                    .update_folder(util::dirname(&target.path), name);
                self.services.title.prepend_file_to_title(&self.id, name, false);
                log::info!("Session {}: saved {}", self.id, target.path);
            }
            Err(e) => log::warn!("Session {}: save failed: {}", self.id, e),
        }
        KeyDisposition::Handled
    }

    /// Dispose the installed model and the editor. The shared engine stays.
    /// Safe to call more than once.
    pub fn teardown(&self) {
        let mut inner = self.inner.lock();
        if inner.torn_down {
            return;
        }
        inner.torn_down = true;
        inner.load_seq += 1;

        if let Some(pending) = inner.relock.take() {
            pending.abort();
            self.services.locks.lock(&self.settings.swap_lock);
        }

        if let Some(editor) = inner.editor.take() {
            if let Some(model) = editor.model() {
                model.dispose();
            }
            editor.dispose();
            log::info!("Session {}: editor {} disposed", self.id, editor.id());
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
