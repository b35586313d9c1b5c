use quill_core::FsError;
use thiserror::Error;

/// Failures surfaced by an editor session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The engine never became ready. Sticky for the life of the process.
    #[error("Editor unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Failed to open document '{path}': {source}")]
    DocumentRead {
        path: String,
        #[source]
        source: FsError,
    },

    #[error("Engine rejected model '{uri}': {reason}")]
    ModelCreate { uri: String, reason: String },

    #[error("Session has been torn down")]
    TornDown,
}
