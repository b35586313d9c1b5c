//! Process-wide name locks.
//!
//! A lock name identifies a global hook that the host environment suppresses
//! while the name is locked. The registry only records state; it is up to the
//! host to consult [`LockRegistry::is_locked`] before running the hook.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

/// Lock-name service shared by every session in the process.
///
/// Both operations are total and idempotent.
pub trait LockRegistry: Send + Sync {
    fn lock(&self, name: &str);
    fn unlock(&self, name: &str);
    /// Names that were never touched read as unlocked.
    fn is_locked(&self, name: &str) -> bool;
}

/// Default [`LockRegistry`] backed by a name → locked map.
#[derive(Debug, Default)]
pub struct NameLockRegistry {
    names: Mutex<HashMap<String, bool>>,
}

impl NameLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, name: &str, locked: bool) {
        let mut names = self.names.lock();
        let previous = names.insert(name.to_string(), locked);
        if previous != Some(locked) {
            log::debug!(
                "Name lock '{}' {}",
                name,
                if locked { "locked" } else { "unlocked" }
            );
        }
    }
}

impl LockRegistry for NameLockRegistry {
    fn lock(&self, name: &str) {
        self.set(name, true);
    }

    fn unlock(&self, name: &str) {
        self.set(name, false);
    }

    fn is_locked(&self, name: &str) -> bool {
        self.names.lock().get(name).copied().unwrap_or(false)
    }
}

/// The registry shared by the whole process.
pub fn global() -> Arc<NameLockRegistry> {
    static REGISTRY: OnceLock<Arc<NameLockRegistry>> = OnceLock::new();
    Arc::clone(REGISTRY.get_or_init(|| Arc::new(NameLockRegistry::new())))
}
