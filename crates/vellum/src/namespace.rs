// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The shared template namespace.
//!
//! A [`SharedNamespace`] holds only the include fragments found during setup,
//! parsed once, with the helper functions from [`crate::functions`] bound.
//! Page templates never enter it: every render takes a private copy with
//! [`SharedNamespace::fork`] and parses the page into that copy, so the
//! shared instance is never mutated after setup and concurrent renders do not
//! see each other's pages.

use std::collections::HashSet;

use tera::{Template, Tera};

use crate::error::{Result, VellumError};
use crate::functions::register_functions;

/// Parsed include fragments shared by every render.
#[derive(Debug, Clone)]
pub struct SharedNamespace {
    tera: Tera,
    includes: Vec<String>,
}

impl Default for SharedNamespace {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedNamespace {
    /// Creates an empty namespace with the helper functions bound.
    pub fn new() -> Self {
        let mut tera = Tera::default();
        // Registered names carry no extension, so suffix matching must accept all of them.
        tera.autoescape_on(vec![""]);
        register_functions(&mut tera);
        Self {
            tera,
            includes: Vec::new(),
        }
    }

    /// Parses an include fragment and registers it under `name`.
    ///
    /// On error the namespace is left unchanged.
    pub fn add_include(&mut self, name: &str, source: &str) -> Result<()> {
        let mut rejected = self.add_includes(vec![(name.to_string(), source.to_string())]);
        match rejected.pop() {
            Some((_, e)) => Err(e),
            None => Ok(()),
        }
    }

    /// Parses a batch of include fragments and returns the ones left out.
    ///
    /// Includes may extend or import macros from each other in any order. A
    /// fragment that does not parse, or whose parent or macro file is neither
    /// in the batch nor already shared, is rejected together with everything
    /// that depends on it. The rest of the batch is added. Later entries
    /// replace earlier ones with the same name.
    pub fn add_includes(&mut self, sources: Vec<(String, String)>) -> Vec<(String, VellumError)> {
        let mut rejected = Vec::new();

        let mut candidates: Vec<(String, String, Template)> = Vec::new();
        for (name, source) in sources {
            candidates.retain(|(n, _, _)| *n != name);
            match Template::new(&name, None, &source) {
                Ok(template) => candidates.push((name, source, template)),
                Err(source) => rejected.push((
                    name.clone(),
                    VellumError::ParseFailure { name, source },
                )),
            }
        }

        // Drop candidates with a missing dependency until none is left.
        loop {
            let available: HashSet<&str> = self
                .tera
                .get_template_names()
                .chain(candidates.iter().map(|(n, _, _)| n.as_str()))
                .collect();
            let missing = candidates.iter().enumerate().find_map(|(i, (_, _, template))| {
                missing_dependency(template, &available).map(|dep| (i, dep.to_string()))
            });
            let Some((index, dependency)) = missing else {
                break;
            };
            let (name, _, _) = candidates.remove(index);
            rejected.push((
                name.clone(),
                VellumError::ParseFailure {
                    source: tera::Error::msg(format!(
                        "Template `{}` depends on `{}` which is not an include",
                        name, dependency
                    )),
                    name,
                },
            ));
        }

        let batch: Vec<(String, String)> = candidates
            .into_iter()
            .map(|(name, source, _)| (name, source))
            .collect();

        let mut next = self.tera.clone();
        if next.add_raw_templates(batch.iter().map(|(n, s)| (n.as_str(), s.as_str()))).is_ok() {
            self.tera = next;
            for (name, _) in &batch {
                self.record(name);
            }
            return rejected;
        }

        // Something like a circular extend: add one at a time, swapping in
        // each success, until a pass makes no progress.
        let mut pending = batch;
        loop {
            let before = pending.len();
            let mut failed = Vec::new();
            for (name, source) in pending {
                let mut next = self.tera.clone();
                match next.add_raw_template(&name, &source) {
                    Ok(()) => {
                        self.tera = next;
                        self.record(&name);
                    }
                    Err(e) => failed.push((name, source, e)),
                }
            }
            if failed.len() == before {
                for (name, _, source) in failed {
                    rejected.push((
                        name.clone(),
                        VellumError::ParseFailure { name, source },
                    ));
                }
                return rejected;
            }
            pending = failed.into_iter().map(|(n, s, _)| (n, s)).collect();
        }
    }

    fn record(&mut self, name: &str) {
        if !self.includes.iter().any(|n| n == name) {
            self.includes.push(name.to_string());
        }
    }

    /// Returns a private deep copy to parse one page template into.
    pub fn fork(&self) -> NamespaceFork {
        NamespaceFork {
            tera: self.tera.clone(),
        }
    }

    /// Checks whether an include with this name was parsed.
    pub fn contains(&self, name: &str) -> bool {
        self.includes.iter().any(|n| n == name)
    }

    /// Names of all parsed includes, in registration order.
    pub fn names(&self) -> &[String] {
        &self.includes
    }

    /// Number of parsed includes.
    pub fn len(&self) -> usize {
        self.includes.len()
    }

    /// Returns true when no include was parsed.
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty()
    }
}

/// First parent or macro file of `template` that is not in `available`.
fn missing_dependency<'t>(template: &'t Template, available: &HashSet<&str>) -> Option<&'t str> {
    template
        .parent
        .iter()
        .chain(template.imported_macro_files.iter().map(|(file, _)| file))
        .map(String::as_str)
        .find(|name| !available.contains(name))
}

/// A render-private copy of the shared namespace.
///
/// Owned by a single render; dropped once the page has been executed.
#[derive(Debug)]
pub struct NamespaceFork {
    tera: Tera,
}

impl NamespaceFork {
    /// Parses `source` as the page template `name`.
    ///
    /// A page may reuse the name of an include; the page wins inside this fork only.
    pub fn parse_page(&mut self, name: &str, source: &str) -> Result<()> {
        self.tera
            .add_raw_template(name, source)
            .map_err(|source| VellumError::ParseFailure {
                name: name.to_string(),
                source,
            })
    }

    /// Executes template `name` against `context`, streaming into `sink`.
    pub fn execute<W: std::io::Write>(
        &self,
        name: &str,
        context: &tera::Context,
        sink: W,
    ) -> Result<()> {
        self.tera
            .render_to(name, context, sink)
            .map_err(|source| VellumError::ExecutionFailure {
                name: name.to_string(),
                source,
            })
    }
}
