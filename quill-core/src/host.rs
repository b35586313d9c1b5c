//! Window and process services provided by the host shell.

use std::any::Any;
use std::sync::Arc;

/// Value stored against a process argument key.
pub type ArgumentValue = Arc<dyn Any + Send + Sync>;

/// Registry of running processes (one per window).
pub trait ProcessRegistry: Send + Sync {
    /// Attach `value` to process `id` under `key`, replacing any previous value.
    fn set_argument(&self, id: &str, key: &str, value: ArgumentValue);
}

/// Window chrome owned by the host: title text and the loading indicator.
pub trait TitleService: Send + Sync {
    /// Prefix the window title of process `id` with `name`, marking it as
    /// having unsaved changes when `dirty` is set.
    fn prepend_file_to_title(&self, id: &str, name: &str, dirty: bool);

    fn set_loading(&self, id: &str, loading: bool);
}
