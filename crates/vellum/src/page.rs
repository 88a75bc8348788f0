// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The per-request page context.
//!
//! A [`Page`] is built by [`PageBuilder::base_page`] at the start of a
//! request, filled in by handler code, and finished with exactly one of the
//! render variants:
//!
//! | Method | `content` | Template |
//! |--------|-----------|----------|
//! | [`Page::render`] | set by the handler | caller's choice |
//! | [`Page::render_error`] | error message | `error` (or a renewal redirect) |
//! | [`Page::render_not_found`] | request URI | `404` |
//! | [`Page::render_unauthorized`] | request URI | `403` |
//! | [`Page::render_redirect`] | target location | `redirect` |
//!
//! Footer scripts are collected in declaration order and emitted in reverse.
//! The reversal happens once per page, even when one variant delegates to
//! another.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::error::{Result, VellumError};
use crate::request::{PageRequest, Params};
use crate::response::{PageResponse, ResponseSink};
use crate::templates::TemplateSet;

/// Template rendered by [`Page::render_error`].
pub const ERROR_TEMPLATE: &str = "error";
/// Template rendered by [`Page::render_not_found`].
pub const NOT_FOUND_TEMPLATE: &str = "404";
/// Template rendered by [`Page::render_unauthorized`].
pub const UNAUTHORIZED_TEMPLATE: &str = "403";
/// Template rendered by [`Page::render_redirect`].
pub const REDIRECT_TEMPLATE: &str = "redirect";

/// Templates the render variants depend on.
pub const RESERVED_TEMPLATES: [&str; 4] = [
    ERROR_TEMPLATE,
    NOT_FOUND_TEMPLATE,
    UNAUTHORIZED_TEMPLATE,
    REDIRECT_TEMPLATE,
];

/// A user record owned by the authentication layer.
#[derive(Debug, Clone, Serialize)]
pub struct CachedUser {
    /// Stable user identifier.
    pub id: String,
    /// Name shown in page chrome.
    pub display_name: String,
    /// Contact address, if known.
    pub email: Option<String>,
}

/// Site-wide values every page starts with.
#[derive(Debug, Clone)]
pub struct PageDefaults {
    /// CSS class for `<body>` (default: "sb-nav-fixed").
    pub body_class: String,
    /// Site title (default: "Unknown Site Title").
    pub site_title: String,
    /// Site author (default: "Maravilla Labs").
    pub site_author: String,
    /// Label for requests without a user (default: "Anonymous").
    pub anonymous_user: String,
    /// Directory the scripts directory is resolved against (default: ".").
    pub asset_root: PathBuf,
    /// Per-page scripts directory, relative to `asset_root` (default: "static/js").
    pub scripts_dir: String,
    /// Redirect target for expired credentials (default: "/td/renew").
    pub renewal_path: String,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            body_class: "sb-nav-fixed".to_string(),
            site_title: "Unknown Site Title".to_string(),
            site_author: "Maravilla Labs".to_string(),
            anonymous_user: "Anonymous".to_string(),
            asset_root: PathBuf::from("."),
            scripts_dir: "static/js".to_string(),
            renewal_path: "/td/renew".to_string(),
        }
    }
}

/// Builds the conventional per-page script path for a request path.
///
/// `/orders` maps to `static/js/orders.js`; a path ending in `/` (the site
/// root included) maps to `index.js` inside that directory. Returns `None`
/// for paths that climb out with `..`.
pub fn page_script_path(scripts_dir: &str, request_path: &str) -> Option<String> {
    if Path::new(request_path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }

    let scripts_dir = scripts_dir.trim_end_matches('/');
    let path = if request_path.starts_with('/') {
        request_path.to_string()
    } else {
        format!("/{}", request_path)
    };

    if path.ends_with('/') {
        Some(format!("{}{}index.js", scripts_dir, path))
    } else {
        Some(format!("{}{}.js", scripts_dir, path))
    }
}

/// Creates [`Page`]s that share one [`TemplateSet`].
#[derive(Debug, Clone)]
pub struct PageBuilder {
    templates: Arc<TemplateSet>,
    defaults: PageDefaults,
}

impl PageBuilder {
    /// Creates a builder with the given templates and site defaults.
    pub fn new(templates: Arc<TemplateSet>, defaults: PageDefaults) -> Self {
        Self {
            templates,
            defaults,
        }
    }

    /// The templates pages are rendered with.
    pub fn templates(&self) -> &Arc<TemplateSet> {
        &self.templates
    }

    /// The defaults new pages start from.
    pub fn defaults(&self) -> &PageDefaults {
        &self.defaults
    }

    /// Creates the base page for a request.
    ///
    /// Probes the filesystem for a per-page script (see [`page_script_path`]).
    pub fn base_page<S: ResponseSink>(
        &self,
        response: S,
        request: PageRequest,
        params: Params,
        page_title: &str,
    ) -> Page<S> {
        let mut has_page_js = false;
        let mut page_js_file_name = String::new();

        if let Some(script) = page_script_path(&self.defaults.scripts_dir, &request.path) {
            tracing::debug!("Searching for a page level js file: /{}", script);
            if self.defaults.asset_root.join(&script).exists() {
                page_js_file_name = format!("/{}", script);
                has_page_js = true;
            }
        }

        let referrer = request.referrer().unwrap_or_default().to_string();

        Page {
            content: JsonValue::Null,
            body_class: self.defaults.body_class.clone(),
            footer_scripts: Vec::new(),
            request,
            response,
            site_title: self.defaults.site_title.clone(),
            site_author: self.defaults.site_author.clone(),
            page_title: page_title.to_string(),
            cur_date: Utc::now(),
            referrer,
            has_page_js,
            page_js_file_name,
            user: self.defaults.anonymous_user.clone(),
            params,
            user_hash: String::new(),
            user_cache: None,
            templates: Arc::clone(&self.templates),
            renewal_path: self.defaults.renewal_path.clone(),
            finalized_scripts: 0,
        }
    }
}

/// Data passed to every template, plus the render variants.
///
/// Templates see every public field by name, with `request` exposed as
/// `{ method, path, uri, referrer }`. The response sink and the user-cache
/// reference are not visible to templates.
#[derive(Debug, Serialize)]
pub struct Page<S = PageResponse> {
    /// Handler payload; overwritten by the error, not-found, unauthorized and redirect variants.
    pub content: JsonValue,
    /// CSS class for `<body>`.
    pub body_class: String,
    /// Script URLs for the page footer.
    pub footer_scripts: Vec<String>,
    /// The inbound request.
    #[serde(serialize_with = "serialize_request")]
    pub request: PageRequest,
    /// The outbound sink.
    #[serde(skip)]
    pub response: S,
    /// Site title.
    pub site_title: String,
    /// Site author.
    pub site_author: String,
    /// Title of this page.
    pub page_title: String,
    /// Time the page was created.
    pub cur_date: DateTime<Utc>,
    /// The `Referer` of the request, or empty.
    pub referrer: String,
    /// True when a per-page script exists.
    pub has_page_js: bool,
    /// Public URL of the per-page script, or empty.
    pub page_js_file_name: String,
    /// Display name of the current user.
    pub user: String,
    /// Route parameters, exposed to templates as a map.
    #[serde(serialize_with = "serialize_params")]
    pub params: Params,
    /// Hash identifying the current user, or empty.
    pub user_hash: String,
    /// The user record from the authentication layer's cache.
    #[serde(skip)]
    pub user_cache: Option<Arc<CachedUser>>,
    #[serde(skip)]
    templates: Arc<TemplateSet>,
    #[serde(skip)]
    renewal_path: String,
    #[serde(skip)]
    finalized_scripts: usize,
}

fn serialize_request<Ser: Serializer>(
    request: &PageRequest,
    serializer: Ser,
) -> std::result::Result<Ser::Ok, Ser::Error> {
    let mut s = serializer.serialize_struct("PageRequest", 4)?;
    s.serialize_field("method", &request.method)?;
    s.serialize_field("path", &request.path)?;
    s.serialize_field("uri", &request.uri())?;
    s.serialize_field("referrer", &request.referrer())?;
    s.end()
}

fn serialize_params<Ser: Serializer>(
    params: &Params,
    serializer: Ser,
) -> std::result::Result<Ser::Ok, Ser::Error> {
    let mut map = serializer.serialize_map(Some(params.len()))?;
    for (key, value) in params {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

fn user_hash(id: &str) -> String {
    format!("{:x}", Sha256::digest(id.as_bytes()))
}

impl<S: ResponseSink> Page<S> {
    /// Appends a footer script URL.
    ///
    /// Scripts are emitted in reverse order of addition. One added after a
    /// render goes ahead of the ones already rendered.
    pub fn add_script(&mut self, url: impl Into<String>) {
        self.footer_scripts.push(url.into());
    }

    /// Sets the payload handed to the template as `content`.
    pub fn set_content(&mut self, content: JsonValue) {
        self.content = content;
    }

    /// Attaches the authenticated user.
    pub fn with_user(mut self, user: Arc<CachedUser>) -> Self {
        self.user = user.display_name.clone();
        self.user_hash = user_hash(&user.id);
        self.user_cache = Some(user);
        self
    }

    /// Consumes the page and returns the response sink.
    pub fn into_response(self) -> S {
        self.response
    }

    /// Reverses the scripts added since the last render and moves them
    /// to the front.
    fn finalize_scripts(&mut self) {
        let done = self.finalized_scripts.min(self.footer_scripts.len());
        let added = self.footer_scripts.split_off(done);
        self.footer_scripts.splice(0..0, added.into_iter().rev());
        self.finalized_scripts = self.footer_scripts.len();
    }

    fn execute(&mut self, template: &str) -> Result<()> {
        self.response
            .set_header("content-type", "text/html; charset=utf-8");
        let context = tera::Context::from_serialize(&*self)
            .map_err(|source| VellumError::ContextFailure { source })?;
        let templates = Arc::clone(&self.templates);
        templates.render_context(&mut self.response, template, &context)
    }

    /// Renders `template` with the content the handler has set.
    pub fn render(&mut self, template: &str) -> Result<()> {
        self.finalize_scripts();
        self.execute(template)
    }

    /// Renders the `error` template with the error's message as content.
    ///
    /// If the error, or any error in its source chain, is
    /// [`VellumError::CredentialExpired`], redirects to the renewal path
    /// with the current URI as origin instead.
    pub fn render_error(&mut self, err: &(dyn std::error::Error + 'static)) -> Result<()> {
        self.finalize_scripts();

        let credential_expired = std::iter::successors(Some(err), |e| e.source()).any(|e| {
            e.downcast_ref::<VellumError>()
                .is_some_and(VellumError::is_credential_expired)
        });
        if credential_expired {
            let renewal_path = self.renewal_path.clone();
            return self.render_redirect(&renewal_path, true);
        }

        self.content = JsonValue::String(err.to_string());
        self.response.set_status(500);
        self.execute(ERROR_TEMPLATE)
    }

    /// Renders the `404` template with the request URI as content.
    pub fn render_not_found(&mut self) -> Result<()> {
        self.finalize_scripts();
        self.content = JsonValue::String(self.request.uri());
        self.response.set_status(404);
        self.execute(NOT_FOUND_TEMPLATE)
    }

    /// Renders the `403` template with the request URI as content.
    pub fn render_unauthorized(&mut self) -> Result<()> {
        self.finalize_scripts();
        self.content = JsonValue::String(self.request.uri());
        self.response.set_status(403);
        self.execute(UNAUTHORIZED_TEMPLATE)
    }

    /// Renders the `redirect` template pointing at `location`.
    ///
    /// With `append_origin`, the target becomes `location?origin=<uri>`.
    pub fn render_redirect(&mut self, location: &str, append_origin: bool) -> Result<()> {
        self.finalize_scripts();
        self.content = if append_origin {
            JsonValue::String(format!("{}?origin={}", location, self.request.uri()))
        } else {
            JsonValue::String(location.to_string())
        };
        self.execute(REDIRECT_TEMPLATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::SetupOptions;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _templates_dir: TempDir,
        assets_dir: TempDir,
        builder: PageBuilder,
    }

    fn fixture() -> Fixture {
        let templates_dir = TempDir::new().unwrap();
        let root = templates_dir.path();
        fs::create_dir_all(root.join("includes")).unwrap();
        fs::write(
            root.join("includes/scripts.html"),
            "{% for s in footer_scripts %}[{{ s | safe }}]{% endfor %}",
        )
        .unwrap();
        fs::write(
            root.join("home.html"),
            r#"<h1>{{ page_title }}</h1>{{ content.msg }}{% include "scripts" %}"#,
        )
        .unwrap();
        fs::write(root.join("error.html"), "error:{{ content | safe }}").unwrap();
        fs::write(root.join("404.html"), "missing:{{ content | safe }}").unwrap();
        fs::write(root.join("403.html"), "denied:{{ content | safe }}").unwrap();
        fs::write(
            root.join("redirect.html"),
            "go:{{ content | safe }}{% include \"scripts\" %}",
        )
        .unwrap();

        let templates = TemplateSet::setup(root, &SetupOptions::default()).unwrap();
        let assets_dir = TempDir::new().unwrap();
        let defaults = PageDefaults {
            asset_root: assets_dir.path().to_path_buf(),
            ..PageDefaults::default()
        };

        Fixture {
            _templates_dir: templates_dir,
            assets_dir,
            builder: PageBuilder::new(Arc::new(templates), defaults),
        }
    }

    fn new_page(fx: &Fixture, request: PageRequest) -> Page {
        fx.builder
            .base_page(PageResponse::new(), request, Vec::new(), "Home")
    }

    #[test]
    fn test_page_script_path() {
        assert_eq!(
            page_script_path("static/js", "/").as_deref(),
            Some("static/js/index.js")
        );
        assert_eq!(
            page_script_path("static/js/", "/orders").as_deref(),
            Some("static/js/orders.js")
        );
        assert_eq!(
            page_script_path("static/js", "/admin/").as_deref(),
            Some("static/js/admin/index.js")
        );
        assert_eq!(page_script_path("static/js", "/../secret"), None);
    }

    #[test]
    fn test_base_page_defaults() {
        let fx = fixture();
        let request = PageRequest::new("GET", "/orders").with_header("Referer", "/from");
        let params = vec![("id".to_string(), "7".to_string())];
        let page = fx
            .builder
            .base_page(PageResponse::new(), request, params.clone(), "Orders");

        assert_eq!(page.body_class, "sb-nav-fixed");
        assert_eq!(page.site_title, "Unknown Site Title");
        assert_eq!(page.user, "Anonymous");
        assert_eq!(page.page_title, "Orders");
        assert_eq!(page.referrer, "/from");
        assert_eq!(page.params, params);
        assert!(!page.has_page_js);
        assert!(page.page_js_file_name.is_empty());
        assert!(page.user_cache.is_none());
    }

    #[test]
    fn test_base_page_detects_page_script() {
        let fx = fixture();
        let js_dir = fx.assets_dir.path().join("static/js");
        fs::create_dir_all(&js_dir).unwrap();
        fs::write(js_dir.join("index.js"), "// root").unwrap();
        fs::write(js_dir.join("orders.js"), "// orders").unwrap();

        let root = new_page(&fx, PageRequest::new("GET", "/"));
        assert!(root.has_page_js);
        assert_eq!(root.page_js_file_name, "/static/js/index.js");

        let orders = new_page(&fx, PageRequest::new("GET", "/orders"));
        assert!(orders.has_page_js);
        assert_eq!(orders.page_js_file_name, "/static/js/orders.js");

        let other = new_page(&fx, PageRequest::new("GET", "/fills"));
        assert!(!other.has_page_js);
    }

    #[test]
    fn test_render_reverses_scripts_once() {
        let fx = fixture();
        let mut page = new_page(&fx, PageRequest::new("GET", "/"));
        page.add_script("a.js");
        page.add_script("b.js");
        page.add_script("c.js");
        page.set_content(serde_json::json!({ "msg": "hello" }));

        page.render("home").unwrap();
        assert_eq!(page.footer_scripts, vec!["c.js", "b.js", "a.js"]);

        // A second variant on the same page keeps the order.
        page.render("home").unwrap();
        assert_eq!(page.footer_scripts, vec!["c.js", "b.js", "a.js"]);

        let body = page.into_response();
        assert!(body
            .body_str()
            .unwrap()
            .starts_with("<h1>Home</h1>hello[c.js][b.js][a.js]"));
        assert_eq!(body.header("content-type"), Some("text/html; charset=utf-8"));
    }

    #[test]
    fn test_scripts_added_after_render_keep_reverse_order() {
        let fx = fixture();
        let mut page = new_page(&fx, PageRequest::new("GET", "/"));
        page.add_script("a.js");
        page.add_script("b.js");
        page.add_script("c.js");
        page.set_content(serde_json::json!({ "msg": "hello" }));
        page.render("home").unwrap();

        page.add_script("d.js");
        page.add_script("e.js");
        page.render("home").unwrap();
        assert_eq!(page.footer_scripts, vec!["e.js", "d.js", "c.js", "b.js", "a.js"]);
    }

    #[test]
    fn test_render_redirect_with_origin() {
        let fx = fixture();
        let mut page = new_page(
            &fx,
            PageRequest::new("GET", "/orders").with_query_string("page=2"),
        );
        page.render_redirect("/login", true).unwrap();
        assert_eq!(page.content, serde_json::json!("/login?origin=/orders?page=2"));
        assert_eq!(
            page.into_response().body_str(),
            Some("go:/login?origin=/orders?page=2")
        );
    }

    #[test]
    fn test_render_redirect_without_origin() {
        let fx = fixture();
        let mut page = new_page(&fx, PageRequest::new("GET", "/orders"));
        page.render_redirect("/login", false).unwrap();
        assert_eq!(page.content, serde_json::json!("/login"));
    }

    #[test]
    fn test_render_not_found_and_unauthorized() {
        let fx = fixture();
        let mut page = new_page(&fx, PageRequest::new("GET", "/nope"));
        page.render_not_found().unwrap();
        let resp = page.into_response();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body_str(), Some("missing:/nope"));

        let mut page = new_page(&fx, PageRequest::new("GET", "/admin"));
        page.render_unauthorized().unwrap();
        let resp = page.into_response();
        assert_eq!(resp.status, 403);
        assert_eq!(resp.body_str(), Some("denied:/admin"));
    }

    #[test]
    fn test_render_error_generic() {
        let fx = fixture();
        let mut page = new_page(&fx, PageRequest::new("GET", "/orders"));
        let err = std::io::Error::new(std::io::ErrorKind::Other, "database offline");
        page.render_error(&err).unwrap();
        assert_eq!(page.content, serde_json::json!("database offline"));
        let resp = page.into_response();
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body_str(), Some("error:database offline"));
    }

    #[test]
    fn test_render_error_message_text_is_not_enough() {
        let fx = fixture();
        let mut page = new_page(&fx, PageRequest::new("GET", "/orders"));
        let lookalike = std::io::Error::new(
            std::io::ErrorKind::Other,
            VellumError::CredentialExpired.to_string(),
        );
        page.render_error(&lookalike).unwrap();
        assert!(page
            .into_response()
            .body_str()
            .unwrap()
            .starts_with("error:"));
    }

    #[test]
    fn test_render_error_credential_expired_redirects() {
        let fx = fixture();
        let mut page = new_page(&fx, PageRequest::new("GET", "/orders"));
        page.add_script("a.js");
        page.add_script("b.js");
        page.render_error(&VellumError::CredentialExpired).unwrap();

        assert_eq!(page.content, serde_json::json!("/td/renew?origin=/orders"));
        // The redirect does not undo the reversal done by render_error.
        assert_eq!(page.footer_scripts, vec!["b.js", "a.js"]);
        assert_eq!(
            page.into_response().body_str(),
            Some("go:/td/renew?origin=/orders[b.js][a.js]")
        );
    }

    #[derive(Debug, thiserror::Error)]
    #[error("loading orders failed")]
    struct HandlerError(#[source] VellumError);

    #[test]
    fn test_render_error_finds_wrapped_credential_error() {
        let fx = fixture();
        let mut page = new_page(&fx, PageRequest::new("GET", "/x"));
        let wrapped = HandlerError(VellumError::CredentialExpired);
        page.render_error(&wrapped).unwrap();
        assert_eq!(page.content, serde_json::json!("/td/renew?origin=/x"));
    }

    #[test]
    fn test_with_user() {
        let fx = fixture();
        let user = Arc::new(CachedUser {
            id: "u-1".to_string(),
            display_name: "Ada".to_string(),
            email: None,
        });
        let page = new_page(&fx, PageRequest::new("GET", "/")).with_user(Arc::clone(&user));
        assert_eq!(page.user, "Ada");
        assert_eq!(page.user_hash.len(), 64);
        assert_eq!(page.user_hash, user_hash("u-1"));
        assert!(page.user_cache.is_some());
    }

    #[test]
    fn test_template_sees_request_and_params() {
        let fx = fixture();
        let dir = fx.builder.templates().root().to_path_buf();
        fs::write(
            dir.join("detail.html"),
            "{{ request.uri | safe }}|{{ params.id }}|{{ user }}",
        )
        .unwrap();
        let templates = TemplateSet::setup(&dir, &SetupOptions::default()).unwrap();
        let builder = PageBuilder::new(Arc::new(templates), fx.builder.defaults().clone());

        let mut page = builder.base_page(
            PageResponse::new(),
            PageRequest::new("GET", "/orders/7").with_query_string("tab=fills"),
            vec![("id".to_string(), "7".to_string())],
            "Order",
        );
        page.render("detail").unwrap();
        assert_eq!(
            page.into_response().body_str(),
            Some("/orders/7?tab=fills|7|Anonymous")
        );
    }

    #[test]
    fn test_missing_template_leaves_body_empty() {
        let fx = fixture();
        let mut page = new_page(&fx, PageRequest::new("GET", "/"));
        let err = page.render("does_not_exist").unwrap_err();
        assert!(err.is_not_found());
        assert!(page.into_response().is_empty());
    }
}
