// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Template discovery and the per-request render pipeline.
//!
//! [`TemplateSet::setup`] walks the template root once at startup:
//!
//! 1. Every file matching `*.<extension>` is registered under its file stem,
//!    at any nesting depth.
//! 2. Files below an includes directory are additionally parsed into the
//!    [`SharedNamespace`].
//!
//! [`TemplateSet::render_template`] then serves each request:
//!
//! 1. Resolve the name to a path (shared lock, lookup only)
//! 2. Read the file fresh from disk
//! 3. Fork the shared namespace
//! 4. Parse the page into the fork
//! 5. Execute it against the render data, streaming into the sink
//!
//! Steps 1-4 fail before any byte reaches the sink. A failure in step 5 can
//! leave partial output behind.
//!
//! # Examples
//!
//! ```rust,ignore
//! use vellum::{SetupOptions, TemplateSet};
//!
//! let templates = TemplateSet::setup("./templates", &SetupOptions::default())?;
//! let html = templates.render_to_string("index", &serde_json::json!({ "title": "Home" }))?;
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, VellumError};
use crate::namespace::SharedNamespace;
use crate::registry::{path_to_string, TemplateRegistry};

/// Options for the startup walk.
#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// Template file extension, without the dot (default: "html").
    pub extension: String,
    /// Directory name that marks shared include fragments (default: "includes").
    pub includes_segment: String,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            extension: "html".to_string(),
            includes_segment: "includes".to_string(),
        }
    }
}

/// The registry and shared namespace built from one template root.
///
/// Share it between request workers as `Arc<TemplateSet>`.
#[derive(Debug)]
pub struct TemplateSet {
    root: PathBuf,
    registry: TemplateRegistry,
    shared: SharedNamespace,
}

impl TemplateSet {
    /// Creates an empty set rooted at `root`, without walking it.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            registry: TemplateRegistry::new(),
            shared: SharedNamespace::new(),
        }
    }

    /// Walks `root` and builds the registry and shared namespace.
    ///
    /// Fails only when `root` is not a directory. Problems with individual
    /// entries are logged and the entry is skipped.
    pub fn setup<P: AsRef<Path>>(root: P, options: &SetupOptions) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(VellumError::TemplateDirMissing {
                path: root.to_path_buf(),
            });
        }

        let mut set = Self::new(root);
        let pattern = format!(
            "{}/**/*.{}",
            glob::Pattern::escape(&path_to_string(root)),
            glob::Pattern::escape(&options.extension)
        );

        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Malformed pattern in walk '{}': {}", pattern, e);
                return Ok(set);
            }
        };

        let mut includes = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => {
                    if let Some(include) = set.add_walked_file(&path, options) {
                        includes.push(include);
                    }
                }
                Err(e) => tracing::error!("Cannot walk template directory: {}", e),
            }
        }
        set.add_includes(includes);

        tracing::info!(
            "Loaded {} template(s), {} include(s) from {}",
            set.registry.len(),
            set.shared.len(),
            root.display()
        );
        Ok(set)
    }

    /// Registers one walked file. Returns the include's name, path and source
    /// when the file lives below the includes segment.
    fn add_walked_file(
        &mut self,
        path: &Path,
        options: &SetupOptions,
    ) -> Option<(String, PathBuf, String)> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => return None,
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Cannot stat template {}: {}", path.display(), e);
                return None;
            }
        }

        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::error!("Template file name is not valid UTF-8: {}", path.display());
            return None;
        };

        if let Some(previous) = self.registry.register(name, path) {
            tracing::warn!(
                "Template '{}' at {} replaces {}",
                name,
                path.display(),
                previous.display()
            );
        }

        if !self.is_include(path, &options.includes_segment) {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(source) => Some((name.to_string(), path.to_path_buf(), source)),
            Err(e) => {
                tracing::error!("Could not read contents of template file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Parses the walked includes as one batch, so an include may extend or
    /// import macros from one walked after it.
    fn add_includes(&mut self, includes: Vec<(String, PathBuf, String)>) {
        let mut paths = HashMap::new();
        let mut sources = Vec::with_capacity(includes.len());
        for (name, path, source) in includes {
            paths.insert(name.clone(), path);
            sources.push((name, source));
        }

        for (name, e) in self.shared.add_includes(sources) {
            let path = paths
                .get(&name)
                .map(|p| p.display().to_string())
                .unwrap_or(name);
            tracing::error!("Skipping include {}: {}", path, e);
        }
    }

    fn is_include(&self, path: &Path, segment: &str) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let Some(parent) = relative.parent() else {
            return false;
        };
        parent
            .components()
            .any(|c| matches!(c, Component::Normal(s) if s == segment))
    }

    /// The template root this set was built from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The name to path registry.
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// The parsed include fragments.
    pub fn shared(&self) -> &SharedNamespace {
        &self.shared
    }

    /// Renders template `name` with `data` into `sink`.
    pub fn render_template<W, T>(&self, sink: W, name: &str, data: &T) -> Result<()>
    where
        W: Write,
        T: Serialize + ?Sized,
    {
        self.render_inner(sink, name, || {
            tera::Context::from_serialize(data)
                .map(Cow::Owned)
                .map_err(|source| VellumError::ContextFailure { source })
        })
    }

    /// Renders template `name` with an already built context into `sink`.
    pub fn render_context<W: Write>(
        &self,
        sink: W,
        name: &str,
        context: &tera::Context,
    ) -> Result<()> {
        self.render_inner(sink, name, || Ok(Cow::Borrowed(context)))
    }

    fn render_inner<'c, W, F>(&self, sink: W, name: &str, context: F) -> Result<()>
    where
        W: Write,
        F: FnOnce() -> Result<Cow<'c, tera::Context>>,
    {
        self.resolve_parse_execute(sink, name, context).map_err(|e| {
            tracing::error!("Could not render template {}: {}", name, e);
            e
        })
    }

    fn resolve_parse_execute<'c, W, F>(&self, sink: W, name: &str, context: F) -> Result<()>
    where
        W: Write,
        F: FnOnce() -> Result<Cow<'c, tera::Context>>,
    {
        let path = self.registry.resolve(name)?;

        let source = fs::read_to_string(&path).map_err(|source| VellumError::ReadFailure {
            path: path.clone(),
            source,
        })?;

        let mut fork = self.shared.fork();
        fork.parse_page(name, &source)?;

        let context = context()?;
        fork.execute(name, &context, sink)
    }

    /// Renders template `name` into a string.
    pub fn render_to_string<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<String> {
        let mut out = Vec::new();
        self.render_template(&mut out, name, data)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
