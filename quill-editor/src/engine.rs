//! Editing engine abstraction and its one-time bootstrap.
//!
//! The engine is a third-party runtime; sessions only see it through the
//! [`Engine`], [`CodeEditor`] and [`TextModel`] traits. [`EngineBootstrapper`]
//! loads it once per process and hands the same handle to every session.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use quill_core::LockRegistry;
use tokio::sync::watch;

use crate::error::SessionError;
use crate::protocol::{EditorOptions, EngineConfig};

/// Callback fired after every content edit of a model.
pub type ChangeListener = Box<dyn Fn() + Send + Sync>;

/// One open document inside the engine.
pub trait TextModel: Send + Sync {
    /// Engine-visible identity token.
    fn uri(&self) -> &str;
    fn language(&self) -> &str;
    fn value(&self) -> String;
    fn on_did_change_content(&self, listener: ChangeListener);
    /// Idempotent; disposing twice is a no-op.
    fn dispose(&self);
    fn is_disposed(&self) -> bool;
}

/// An editor surface bound to one container.
pub trait CodeEditor: Send + Sync {
    fn id(&self) -> &str;
    fn model(&self) -> Option<Arc<dyn TextModel>>;
    fn set_model(&self, model: Option<Arc<dyn TextModel>>);
    /// Full text of the installed model, or empty without one.
    fn value(&self) -> String;
    fn dispose(&self);
}

/// The shared editing runtime.
pub trait Engine: Send + Sync {
    /// Identity tokens of every live model.
    fn model_uris(&self) -> Vec<String>;

    /// Fails if a live model already holds `uri`.
    fn create_model(
        &self,
        content: &str,
        language: &str,
        uri: &str,
    ) -> Result<Arc<dyn TextModel>, String>;

    fn create_editor(&self, container: &str, options: &EditorOptions) -> Arc<dyn CodeEditor>;
}

/// Loads the engine's assets and produces a ready [`Engine`].
#[async_trait]
pub trait EngineLoader: Send + Sync {
    fn configure(&self, config: &EngineConfig);
    async fn init(&self) -> Result<Arc<dyn Engine>, String>;
}

/// Observable bootstrap progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

type BootOutcome = Option<Result<Arc<dyn Engine>, String>>;

enum BootState {
    Idle,
    Loading(watch::Receiver<BootOutcome>),
    Ready(Arc<dyn Engine>),
    Failed(String),
}

/// Single-flight engine initialization.
///
/// The first caller of [`ensure_engine`](Self::ensure_engine) starts the
/// bootstrap on a spawned task; concurrent callers wait on the same result.
/// A failed bootstrap is never retried.
pub struct EngineBootstrapper {
    loader: Arc<dyn EngineLoader>,
    locks: Arc<dyn LockRegistry>,
    config: EngineConfig,
    lock_name: String,
    state: Arc<Mutex<BootState>>,
}

impl EngineBootstrapper {
    pub fn new(
        loader: Arc<dyn EngineLoader>,
        locks: Arc<dyn LockRegistry>,
        config: EngineConfig,
        lock_name: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            locks,
            config,
            lock_name: lock_name.into(),
            state: Arc::new(Mutex::new(BootState::Idle)),
        }
    }

    pub fn state(&self) -> EngineState {
        match &*self.state.lock() {
            BootState::Idle => EngineState::Idle,
            BootState::Loading(_) => EngineState::Loading,
            BootState::Ready(_) => EngineState::Ready,
            BootState::Failed(reason) => EngineState::Failed(reason.clone()),
        }
    }

    /// The engine handle, if bootstrap already completed.
    pub fn engine(&self) -> Option<Arc<dyn Engine>> {
        match &*self.state.lock() {
            BootState::Ready(engine) => Some(Arc::clone(engine)),
            _ => None,
        }
    }

    pub async fn ensure_engine(&self) -> Result<Arc<dyn Engine>, SessionError> {
        let mut rx = {
            let mut state = self.state.lock();
            match &*state {
                BootState::Ready(engine) => return Ok(Arc::clone(engine)),
                BootState::Failed(reason) => {
                    return Err(SessionError::EngineUnavailable(reason.clone()))
                }
                BootState::Loading(rx) => rx.clone(),
                BootState::Idle => {
                    let (tx, rx) = watch::channel(None);
                    *state = BootState::Loading(rx.clone());
                    self.spawn_bootstrap(tx);
                    rx
                }
            }
        };

        let outcome = rx.wait_for(|outcome| outcome.is_some()).await;
        match outcome.as_deref() {
            Ok(Some(Ok(engine))) => Ok(Arc::clone(engine)),
            Ok(Some(Err(reason))) => Err(SessionError::EngineUnavailable(reason.clone())),
            Ok(None) | Err(_) => Err(SessionError::EngineUnavailable(
                "engine bootstrap ended without a result".to_string(),
            )),
        }
    }

    fn spawn_bootstrap(&self, tx: watch::Sender<BootOutcome>) {
        let loader = Arc::clone(&self.loader);
        let locks = Arc::clone(&self.locks);
        let state = Arc::clone(&self.state);
        let config = self.config.clone();
        let lock_name = self.lock_name.clone();

        tokio::spawn(async move {
            log::info!("Loading editor engine from {}", config.asset_base_path);
            locks.unlock(&lock_name);
            loader.configure(&config);
            // A panicking loader still has to leave the bootstrap in a final state.
            let result = match tokio::spawn(async move { loader.init().await }).await {
                Ok(result) => result,
                Err(e) => Err(format!("engine loader aborted: {}", e)),
            };
            locks.lock(&lock_name);

            *state.lock() = match &result {
                Ok(engine) => {
                    log::info!("Editor engine ready");
                    BootState::Ready(Arc::clone(engine))
                }
                Err(reason) => {
                    log::error!("Editor engine failed to initialize: {}", reason);
                    BootState::Failed(reason.clone())
                }
            };
            // Waiters may all have gone away.
            let _ = tx.send(Some(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{same_engine, GatedLoader};
    use quill_core::NameLockRegistry;

    fn bootstrapper(loader: Arc<GatedLoader>, locks: Arc<NameLockRegistry>) -> EngineBootstrapper {
        EngineBootstrapper::new(
            loader,
            locks,
            EngineConfig {
                asset_base_path: "/System/Monaco/vs".into(),
                theme: "vs-dark".into(),
            },
            "define",
        )
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_initialization() {
        let locks = Arc::new(NameLockRegistry::new());
        let loader = GatedLoader::new(Arc::clone(&locks));
        let boot = bootstrapper(Arc::clone(&loader), locks);

        let gate = loader.gate();
        let (a, b, ()) = tokio::join!(boot.ensure_engine(), boot.ensure_engine(), async {
            tokio::task::yield_now().await;
            gate.notify_one();
        });

        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(same_engine(&a, &b));
        assert_eq!(loader.init_calls(), 1);
        assert_eq!(boot.state(), EngineState::Ready);

        let c = boot.ensure_engine().await.unwrap();
        assert!(same_engine(&a, &c));
        assert_eq!(loader.init_calls(), 1);
    }

    #[tokio::test]
    async fn bootstrap_unlocks_while_configuring_then_relocks() {
        let locks = Arc::new(NameLockRegistry::new());
        locks.lock("define");
        let loader = GatedLoader::ready(Arc::clone(&locks));
        let boot = bootstrapper(Arc::clone(&loader), Arc::clone(&locks));

        boot.ensure_engine().await.unwrap();

        assert_eq!(loader.locked_during_configure(), Some(false));
        assert!(locks.is_locked("define"));
        assert_eq!(
            loader.configured().map(|c| c.asset_base_path),
            Some("/System/Monaco/vs".to_string())
        );
    }

    #[tokio::test]
    async fn failure_is_sticky_and_not_retried() {
        let locks = Arc::new(NameLockRegistry::new());
        locks.lock("define");
        let loader = GatedLoader::failing(Arc::clone(&locks), "asset fetch failed");
        let boot = bootstrapper(Arc::clone(&loader), Arc::clone(&locks));

        let first = boot.ensure_engine().await;
        assert!(matches!(first, Err(SessionError::EngineUnavailable(_))));
        let second = boot.ensure_engine().await;
        assert!(matches!(second, Err(SessionError::EngineUnavailable(_))));

        assert_eq!(loader.init_calls(), 1);
        assert_eq!(
            boot.state(),
            EngineState::Failed("asset fetch failed".to_string())
        );
        assert!(boot.engine().is_none());
        assert_eq!(loader.locked_during_configure(), Some(false));
        assert!(locks.is_locked("define"));
    }

    #[tokio::test]
    async fn panicking_loader_marks_bootstrap_failed() {
        let locks = Arc::new(NameLockRegistry::new());
        locks.lock("define");
        let loader = GatedLoader::panicking(Arc::clone(&locks));
        let boot = bootstrapper(Arc::clone(&loader), Arc::clone(&locks));

        let result = boot.ensure_engine().await;
        assert!(matches!(result, Err(SessionError::EngineUnavailable(_))));
        assert!(matches!(boot.state(), EngineState::Failed(_)));
        assert!(locks.is_locked("define"));

        assert!(boot.ensure_engine().await.is_err());
        assert_eq!(loader.init_calls(), 1);
    }

    #[test]
    fn fresh_bootstrapper_is_idle() {
        let locks = Arc::new(NameLockRegistry::new());
        let boot = bootstrapper(GatedLoader::ready(Arc::clone(&locks)), locks);
        assert_eq!(boot.state(), EngineState::Idle);
        assert!(boot.engine().is_none());
    }
}
