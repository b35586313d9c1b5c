pub mod bridge;
pub mod engine;
pub mod error;
pub mod loader;
pub mod model;
pub mod protocol;
pub mod session;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{CodeEditor, Engine, EngineBootstrapper, EngineLoader, TextModel};
pub use error::SessionError;
pub use session::{KeyDisposition, Session, SessionServices, SessionState};
pub use settings::EditorSettings;
