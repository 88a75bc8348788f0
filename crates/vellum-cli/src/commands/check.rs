// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Template tree report.
//!
//! Runs the same walk as `serve` and prints what it found, so a broken
//! include or a missing reserved template shows up before deployment.

use std::path::Path;
use std::sync::Arc;

use vellum::{PageBuilder, PageRequest, PageResponse, TemplateSet, RESERVED_TEMPLATES};

use crate::config::Config;

/// One registered template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateEntry {
    /// Registered name (file stem).
    pub name: String,
    /// True when parsed into the shared include namespace.
    pub include: bool,
}

/// What the walk discovered.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateReport {
    /// Registered templates, sorted by name.
    pub templates: Vec<TemplateEntry>,
    /// Reserved names with no template behind them.
    pub missing_reserved: Vec<&'static str>,
}

impl TemplateReport {
    /// Builds the report for a set.
    pub fn from_set(templates: &TemplateSet) -> Self {
        let entries = templates
            .registry()
            .names()
            .into_iter()
            .map(|name| TemplateEntry {
                include: templates.shared().contains(&name),
                name,
            })
            .collect();

        let missing_reserved = RESERVED_TEMPLATES
            .into_iter()
            .filter(|name| !templates.registry().contains(name))
            .collect();

        Self {
            templates: entries,
            missing_reserved,
        }
    }
}

/// Loads the template tree of `project_dir` and builds its report.
pub fn inspect(config: &Config, project_dir: &Path) -> anyhow::Result<(TemplateSet, TemplateReport)> {
    let templates = TemplateSet::setup(project_dir.join(&config.templates.dir), &config.setup_options())?;
    let report = TemplateReport::from_set(&templates);
    Ok((templates, report))
}

/// Renders `name` as the page for `/` and returns the body.
pub fn render_preview(
    config: &Config,
    project_dir: &Path,
    templates: TemplateSet,
    name: &str,
) -> anyhow::Result<String> {
    let builder = PageBuilder::new(Arc::new(templates), config.page_defaults(project_dir));
    let mut page = builder.base_page(PageResponse::new(), PageRequest::default(), Vec::new(), name);
    page.render(name)?;
    let response = page.into_response();
    Ok(String::from_utf8_lossy(&response.body).into_owned())
}

/// Runs the check command. With `render`, also prints that template's output.
pub fn run(render: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let working_dir = std::env::current_dir()?;
    let (templates, report) = inspect(&config, &working_dir)?;

    println!(
        "{} template(s) in {}",
        report.templates.len(),
        templates.root().display()
    );
    for entry in &report.templates {
        if entry.include {
            println!("  {} (include)", entry.name);
        } else {
            println!("  {}", entry.name);
        }
    }

    for name in &report.missing_reserved {
        tracing::warn!("Reserved template '{}' is missing", name);
        println!("Missing reserved template: {}", name);
    }

    if let Some(name) = render {
        println!();
        println!("{}", render_preview(&config, &working_dir, templates, &name)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_report_marks_includes_and_missing_reserved() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("templates");
        fs::create_dir_all(root.join("includes")).unwrap();
        fs::write(root.join("includes/nav.html"), "<nav></nav>").unwrap();
        fs::write(root.join("index.html"), r#"{% include "nav" %}{{ site_title }}"#).unwrap();
        fs::write(root.join("error.html"), "{{ content }}").unwrap();

        let config = Config::default();
        let (templates, report) = inspect(&config, dir.path()).unwrap();

        assert_eq!(
            report.templates,
            vec![
                TemplateEntry { name: "error".to_string(), include: false },
                TemplateEntry { name: "index".to_string(), include: false },
                TemplateEntry { name: "nav".to_string(), include: true },
            ]
        );
        assert_eq!(report.missing_reserved, vec!["404", "403", "redirect"]);

        let body = render_preview(&config, dir.path(), templates, "index").unwrap();
        assert_eq!(body, "<nav></nav>Unknown Site Title");
    }

    #[test]
    fn test_missing_template_dir_is_fatal() {
        let dir = tempdir().unwrap();
        let err = inspect(&Config::default(), dir.path()).unwrap_err();
        assert!(err.to_string().contains("templates"));
    }
}
