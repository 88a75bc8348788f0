// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Logical template name to filesystem path mapping.
//!
//! The [`TemplateRegistry`] is written once by the startup walk and read by
//! every render. Readers hold the lock only for the lookup itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::error::{Result, VellumError};

/// Converts a Path to a normalized string with forward slashes.
pub fn path_to_string<P: AsRef<Path>>(path: P) -> String {
    #[cfg(windows)]
    {
        path.as_ref().to_string_lossy().replace('\\', "/")
    }
    #[cfg(not(windows))]
    {
        path.as_ref().to_string_lossy().to_string()
    }
}

/// Thread-safe map from template name (file stem) to its path.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    paths: RwLock<HashMap<String, PathBuf>>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the path registered for `name`.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        // The map is never left half-written, so a poisoned lock is still readable.
        let paths = self.paths.read().unwrap_or_else(PoisonError::into_inner);
        paths
            .get(name)
            .cloned()
            .ok_or_else(|| VellumError::TemplateNotFound {
                name: name.to_string(),
            })
    }

    /// Registers `name`, replacing and returning any previous path.
    pub fn register(&self, name: impl Into<String>, path: impl Into<PathBuf>) -> Option<PathBuf> {
        let mut paths = self.paths.write().unwrap_or_else(PoisonError::into_inner);
        paths.insert(name.into(), path.into())
    }

    /// Checks whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        let paths = self.paths.read().unwrap_or_else(PoisonError::into_inner);
        paths.contains_key(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let paths = self.paths.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = paths.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.paths.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_register_and_resolve() {
        let registry = TemplateRegistry::new();
        assert!(registry.register("index", "/srv/templates/index.html").is_none());
        assert_eq!(
            registry.resolve("index").unwrap(),
            PathBuf::from("/srv/templates/index.html")
        );
        assert!(registry.contains("index"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_last_writer_wins() {
        let registry = TemplateRegistry::new();
        registry.register("index", "a/index.html");
        let previous = registry.register("index", "b/index.html");
        assert_eq!(previous, Some(PathBuf::from("a/index.html")));
        assert_eq!(registry.resolve("index").unwrap(), PathBuf::from("b/index.html"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_missing_carries_name() {
        let registry = TemplateRegistry::new();
        match registry.resolve("nope") {
            Err(VellumError::TemplateNotFound { name }) => assert_eq!(name, "nope"),
            other => panic!("Expected TemplateNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_concurrent_readers() {
        let registry = Arc::new(TemplateRegistry::new());
        for i in 0..16 {
            registry.register(format!("t{}", i), format!("/tpl/t{}.html", i));
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..16 {
                        let path = registry.resolve(&format!("t{}", i)).unwrap();
                        assert_eq!(path_to_string(path), format!("/tpl/t{}.html", i));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.names().len(), 16);
    }
}
