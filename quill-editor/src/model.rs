//! Model identities and collision-free allocation.
//!
//! A model's identity token is `<logical path><delimiter><instance>`. The same
//! document may be open in several sessions at once; each copy gets the next
//! free instance so that no two live models share a token.

use std::collections::HashSet;

use crate::engine::Engine;

pub const DEFAULT_DELIMITER: &str = "//";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelIdentity {
    pub logical_path: String,
    pub instance: u32,
}

impl ModelIdentity {
    pub fn token(&self, delimiter: &str) -> String {
        format!("{}{}{}", self.logical_path, delimiter, self.instance)
    }

    pub fn parse(token: &str, delimiter: &str) -> Option<Self> {
        let (path, instance) = token.rsplit_once(delimiter)?;
        Some(Self {
            logical_path: path.to_string(),
            instance: instance.parse().ok()?,
        })
    }
}

/// Logical path of a token: everything before the last delimiter.
pub fn base_path<'a>(token: &'a str, delimiter: &str) -> &'a str {
    token
        .rsplit_once(delimiter)
        .map(|(base, _)| base)
        .unwrap_or(token)
}

#[derive(Debug, Clone)]
pub struct ModelUriAllocator {
    delimiter: String,
}

impl Default for ModelUriAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl ModelUriAllocator {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Allocate an identity for `path` that collides with no live model in `engine`.
    pub fn allocate(&self, engine: &dyn Engine, path: &str) -> ModelIdentity {
        self.allocate_in(engine.model_uris(), path)
    }

    /// Allocate against an explicit set of taken tokens.
    pub fn allocate_in<I, S>(&self, taken: I, path: &str) -> ModelIdentity
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let taken: HashSet<String> = taken
            .into_iter()
            .map(|token| token.as_ref().to_string())
            .collect();

        let mut identity = ModelIdentity {
            logical_path: path.to_string(),
            instance: 0,
        };
        while taken.contains(&identity.token(&self.delimiter)) {
            identity.instance += 1;
        }
        identity
    }
}
