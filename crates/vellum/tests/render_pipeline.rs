// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! End-to-end tests for discovery and rendering through the public API.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use serde_json::json;
use tempfile::TempDir;
use vellum::{
    PageBuilder, PageDefaults, PageRequest, PageResponse, SetupOptions, TemplateSet, VellumError,
};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "includes/header.html", "<header>{{ page_title }}</header>");
    write(root, "includes/partials/footer.html", "<footer>{{ site_title }}</footer>");
    write(
        root,
        "pages/orders/list.html",
        r#"{% include "header" %}<ul>{% for o in content.orders %}<li>{{ o }}</li>{% endfor %}</ul>{% include "footer" %}"#,
    );
    write(root, "index.html", r#"{% include "header" %}home"#);
    write(root, "error.html", "{{ content | safe }}");
    write(root, "404.html", "not found: {{ content | safe }}");
    write(root, "403.html", "forbidden");
    write(root, "redirect.html", "{{ content | safe }}");
    dir
}

#[test]
fn test_names_are_stems_at_any_depth() {
    let dir = site();
    let templates = TemplateSet::setup(dir.path(), &SetupOptions::default()).unwrap();

    let names = templates.registry().names();
    for expected in ["header", "footer", "list", "index", "error", "404", "403", "redirect"] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
    assert!(templates.shared().contains("header"));
    assert!(templates.shared().contains("footer"));
    assert!(!templates.shared().contains("list"));
}

#[test]
fn test_concurrent_renders_are_isolated() {
    let dir = site();
    let templates = Arc::new(TemplateSet::setup(dir.path(), &SetupOptions::default()).unwrap());
    let builder = PageBuilder::new(
        Arc::clone(&templates),
        PageDefaults {
            site_title: "Desk".to_string(),
            asset_root: dir.path().to_path_buf(),
            ..PageDefaults::default()
        },
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let builder = builder.clone();
            thread::spawn(move || {
                let mut outputs = Vec::new();
                for round in 0..10 {
                    let title = format!("page-{}-{}", i, round);
                    let mut page = builder.base_page(
                        PageResponse::new(),
                        PageRequest::new("GET", "/orders"),
                        Vec::new(),
                        &title,
                    );
                    page.set_content(json!({ "orders": [i, round] }));
                    page.render("list").unwrap();
                    outputs.push((title, page.into_response()));
                }
                (i, outputs)
            })
        })
        .collect();

    for handle in handles {
        let (i, outputs) = handle.join().unwrap();
        for (round, (title, response)) in outputs.into_iter().enumerate() {
            let expected = format!(
                "<header>{}</header><ul><li>{}</li><li>{}</li></ul><footer>Desk</footer>",
                title, i, round
            );
            assert_eq!(response.body_str(), Some(expected.as_str()));
        }
    }

    // Forks never leak page templates back into the shared namespace.
    assert!(!templates.shared().contains("list"));
}

#[test]
fn test_edits_are_picked_up_without_restart() {
    let dir = site();
    let templates = TemplateSet::setup(dir.path(), &SetupOptions::default()).unwrap();

    let before = templates.render_to_string("index", &json!({ "page_title": "A" })).unwrap();
    assert_eq!(before, "<header>A</header>home");

    write(dir.path(), "index.html", r#"{% include "header" %}changed"#);
    let after = templates.render_to_string("index", &json!({ "page_title": "A" })).unwrap();
    assert_eq!(after, "<header>A</header>changed");
}

#[test]
fn test_unknown_template_writes_nothing() {
    let dir = site();
    let templates = TemplateSet::setup(dir.path(), &SetupOptions::default()).unwrap();

    let mut out = Vec::new();
    let err = templates
        .render_template(&mut out, "nope", &json!({}))
        .unwrap_err();
    assert!(matches!(err, VellumError::TemplateNotFound { ref name } if name == "nope"));
    assert!(out.is_empty());
}

#[test]
fn test_not_found_page_through_builder() {
    let dir = site();
    let templates = Arc::new(TemplateSet::setup(dir.path(), &SetupOptions::default()).unwrap());
    let builder = PageBuilder::new(templates, PageDefaults::default());

    let mut page = builder.base_page(
        PageResponse::new(),
        PageRequest::new("GET", "/missing").with_query_string("q=1"),
        Vec::new(),
        "Missing",
    );
    page.render_not_found().unwrap();
    let response = page.into_response();
    assert_eq!(response.status, 404);
    assert_eq!(response.body_str(), Some("not found: /missing?q=1"));
}
