// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! # Vellum
//!
//! Template discovery and per-request page rendering for server-rendered apps.
//!
//! Vellum walks a template directory once at startup, remembers where every
//! page template lives, and parses shared include fragments a single time.
//! Each request then reads its page template fresh, parses it into a private
//! copy of the shared includes, and renders it with a [`Page`] context.
//!
//! ## Features
//!
//! - Templates addressed by file name, at any nesting depth
//! - Include fragments parsed once and shared by every page
//! - Per-render isolation without a lock around rendering
//! - Page context with error, not-found, unauthorized and redirect variants
//! - Conventional per-page script discovery (`static/js/<path>.js`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vellum::{PageBuilder, PageDefaults, PageRequest, PageResponse, SetupOptions, TemplateSet};
//!
//! let templates = Arc::new(TemplateSet::setup("./templates", &SetupOptions::default())?);
//! let builder = PageBuilder::new(templates, PageDefaults::default());
//!
//! let mut page = builder.base_page(PageResponse::new(), PageRequest::new("GET", "/"), Vec::new(), "Home");
//! page.set_content(serde_json::json!({ "greeting": "Hello" }));
//! page.render("index")?;
//! let response = page.into_response();
//! ```

/// Error types.
pub mod error;
/// Helper functions available in every template.
pub mod functions;
/// Shared include namespace and per-render forks.
pub mod namespace;
/// Per-request page context and render variants.
pub mod page;
/// Template name to path registry.
pub mod registry;
/// Inbound request abstraction.
pub mod request;
/// Outbound response sink.
pub mod response;
/// Template discovery and rendering.
pub mod templates;

pub use error::{Result, VellumError};
pub use namespace::{NamespaceFork, SharedNamespace};
pub use page::{
    page_script_path, CachedUser, Page, PageBuilder, PageDefaults, RESERVED_TEMPLATES,
};
pub use registry::TemplateRegistry;
pub use request::{PageRequest, Params};
pub use response::{PageResponse, ResponseSink};
pub use templates::{SetupOptions, TemplateSet};
