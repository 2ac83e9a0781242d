use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::capsule::Capsule;
use crate::gemini::request::normalize_path;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a capsule is already registered at '{0}'")]
    Duplicate(String),
}

/// Read-only table of capsules keyed by normalized path.
#[derive(Clone, Default)]
pub struct Registry {
    capsules: HashMap<String, Arc<dyn Capsule>>,
}

/// Collects capsule registrations at startup.
///
/// # Example
///
/// ```
/// # use gemlet::capsule::RegistryBuilder;
/// # use gemlet::gemini::response::Response;
/// # use gemlet::gemini::request::Request;
/// let mut builder = RegistryBuilder::new();
/// builder
///     .register("/hello", |_: &Request| -> anyhow::Result<Response> {
///         Ok(Response::success("hi"))
///     })
///     .unwrap();
/// let registry = builder.build();
/// assert!(registry.lookup("/hello/").is_some());
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    capsules: HashMap<String, Arc<dyn Capsule>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `capsule` under `prefix`.
    ///
    /// The prefix is normalized first: an empty prefix becomes `/`, a missing
    /// leading slash is added and trailing slashes are removed. Registering
    /// the same normalized prefix twice fails.
    pub fn register(
        &mut self,
        prefix: &str,
        capsule: impl Capsule,
    ) -> Result<&mut Self, RegistryError> {
        self.register_arc(prefix, Arc::new(capsule))
    }

    /// Like [`register`](Self::register), for capsules that are already shared.
    pub fn register_arc(
        &mut self,
        prefix: &str,
        capsule: Arc<dyn Capsule>,
    ) -> Result<&mut Self, RegistryError> {
        let key = normalize_prefix(prefix);
        if self.capsules.contains_key(&key) {
            return Err(RegistryError::Duplicate(key));
        }

        tracing::info!(path = %key, "Registered capsule");
        self.capsules.insert(key, capsule);
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            capsules: self.capsules,
        }
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Finds the capsule for a request path.
    ///
    /// One trailing slash is stripped (except from `/`) before the exact
    /// match. There is no prefix or longest-match resolution.
    pub fn lookup(&self, path: &str) -> Option<&Arc<dyn Capsule>> {
        self.capsules.get(normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.capsules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capsules.is_empty()
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.capsules.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

/// Normalizes a registration prefix to start with `/` and not end with `/`,
/// unless it is exactly `/`.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_normalization() {
        assert_eq!(normalize_prefix(""), "/");
        assert_eq!(normalize_prefix("/"), "/");
        assert_eq!(normalize_prefix("app"), "/app");
        assert_eq!(normalize_prefix("/app/"), "/app");
        assert_eq!(normalize_prefix("/app//"), "/app");
    }
}
