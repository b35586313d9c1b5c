use std::sync::Arc;

use quill_core::util;
use quill_core::{FileSystem, TitleService};

use crate::engine::{Engine, TextModel};
use crate::error::SessionError;
use crate::model::ModelUriAllocator;

/// Decoded document contents, not yet bound to a model.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSource {
    pub path: String,
    pub content: String,
    pub language: &'static str,
}

/// Reads documents from the filesystem and turns them into engine models.
///
/// Loading happens in two steps so a caller can fail on the read without
/// touching the model it already has installed.
pub struct DocumentLoader {
    session_id: String,
    fs: Arc<dyn FileSystem>,
    title: Arc<dyn TitleService>,
    allocator: ModelUriAllocator,
}

impl DocumentLoader {
    pub fn new(
        session_id: impl Into<String>,
        fs: Arc<dyn FileSystem>,
        title: Arc<dyn TitleService>,
        allocator: ModelUriAllocator,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            fs,
            title,
            allocator,
        }
    }

    pub async fn fetch(&self, path: &str) -> Result<DocumentSource, SessionError> {
        let bytes = self
            .fs
            .read_file(path)
            .await
            .map_err(|source| SessionError::DocumentRead {
                path: path.to_string(),
                source,
            })?;

        Ok(DocumentSource {
            path: path.to_string(),
            content: String::from_utf8_lossy(&bytes).into_owned(),
            language: util::language_from_path(path),
        })
    }

    /// Create a model for `source` at a fresh identity and mark the window
    /// title dirty on every edit.
    pub fn materialize(
        &self,
        engine: &dyn Engine,
        source: DocumentSource,
    ) -> Result<Arc<dyn TextModel>, SessionError> {
        let identity = self.allocator.allocate(engine, &source.path);
        let uri = identity.token(self.allocator.delimiter());

        let model = engine
            .create_model(&source.content, source.language, &uri)
            .map_err(|reason| SessionError::ModelCreate {
                uri: uri.clone(),
                reason,
            })?;

        let title = Arc::clone(&self.title);
        let session_id = self.session_id.clone();
        let name = util::basename(&source.path).to_string();
        model.on_did_change_content(Box::new(move || {
            title.prepend_file_to_title(&session_id, &name, true);
        }));

        log::debug!(
            "Created {} model {} for session {}",
            source.language,
            uri,
            self.session_id
        );
        Ok(model)
    }

    pub async fn load(
        &self,
        engine: &dyn Engine,
        path: &str,
    ) -> Result<Arc<dyn TextModel>, SessionError> {
        let source = self.fetch(path).await?;
        self.materialize(engine, source)
    }
}
