// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTTP server that renders pages from the template tree.
//!
//! This is a thin adapter that converts HTTP requests to `PageRequest`,
//! renders a `Page` on a blocking worker, and converts the buffered
//! `PageResponse` back to HTTP.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Router,
};
use serde_json::{json, Map, Value as JsonValue};
use tower_http::services::ServeDir;
use vellum::{PageBuilder, PageRequest, PageResponse, TemplateSet, RESERVED_TEMPLATES};

use crate::config::Config;
use crate::router::{Resolution, RouteTable};

/// Shared application state for the server.
#[derive(Debug)]
pub struct AppState {
    /// Page factory holding the discovered templates.
    pub builder: PageBuilder,
    /// Declared routes plus the name fallback.
    pub routes: RouteTable,
}

impl AppState {
    /// Runs the template walk and builds the route table.
    ///
    /// A missing template directory or an invalid route pattern is fatal.
    pub fn load(config: &Config, project_dir: &Path) -> anyhow::Result<Self> {
        let templates_dir = project_dir.join(&config.templates.dir);
        let templates = TemplateSet::setup(&templates_dir, &config.setup_options())?;

        for name in RESERVED_TEMPLATES {
            if !templates.registry().contains(name) {
                tracing::warn!("Reserved template '{}' is missing from {}", name, templates_dir.display());
            }
        }

        let routes = RouteTable::new(config.routes.clone())?;
        let builder = PageBuilder::new(Arc::new(templates), config.page_defaults(project_dir));

        Ok(Self { builder, routes })
    }
}

/// Builds the axum application: `/static` files plus rendered pages.
pub fn build_app(config: &Config, project_dir: &Path) -> anyhow::Result<Router> {
    let state = Arc::new(AppState::load(config, project_dir)?);
    let static_dir = project_dir.join(&config.site.static_dir);

    Ok(Router::new()
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(page_handler)
        .with_state(state))
}

/// Creates and starts the HTTP server.
pub async fn create_server(addr: &str, config: &Config, project_dir: &Path) -> anyhow::Result<()> {
    let app = build_app(config, project_dir)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Fallback handler: every non-static request lands here.
async fn page_handler(State(state): State<Arc<AppState>>, request: Request<Body>) -> Response {
    let page_request = to_page_request(&request);
    let resolution = state
        .routes
        .resolve(&page_request.path, state.builder.templates());
    let content = query_content(page_request.query_string.as_deref());

    let worker = Arc::clone(&state);
    let rendered = tokio::task::spawn_blocking(move || {
        render_page(&worker.builder, page_request, resolution, content)
    })
    .await;

    match rendered {
        Ok(response) => page_response_to_axum(response),
        Err(e) => {
            tracing::error!("Render worker failed: {}", e);
            error_page(StatusCode::INTERNAL_SERVER_ERROR, "Render worker failed")
        }
    }
}

/// Renders one request to a buffered response.
///
/// A failed page render falls back to the `error` template; if that fails
/// too, a minimal built-in page is returned.
pub fn render_page(
    builder: &PageBuilder,
    request: PageRequest,
    resolution: Resolution,
    content: JsonValue,
) -> PageResponse {
    let result = match &resolution {
        Resolution::Page {
            template,
            title,
            params,
        } => {
            let mut page = builder.base_page(PageResponse::new(), request.clone(), params.clone(), title);
            page.set_content(content);
            page.render(template).map(|()| page.into_response())
        }
        Resolution::NotFound => {
            let mut page = builder.base_page(PageResponse::new(), request.clone(), Vec::new(), "Not Found");
            match page.render_not_found() {
                Ok(()) => Ok(page.into_response()),
                Err(e) => {
                    tracing::error!("Could not render the not-found page: {}", e);
                    return fallback_response(404, &format!("Not Found: {}", request.uri()));
                }
            }
        }
    };

    let err = match result {
        Ok(response) => return response,
        Err(err) => err,
    };

    let params = match resolution {
        Resolution::Page { params, .. } => params,
        Resolution::NotFound => Vec::new(),
    };
    let mut page = builder.base_page(PageResponse::new(), request, params, "Error");
    match page.render_error(&err) {
        Ok(()) => page.into_response(),
        Err(e) => {
            tracing::error!("Could not render the error page: {}", e);
            fallback_response(500, &err.to_string())
        }
    }
}

/// Convert an axum request to a PageRequest
fn to_page_request(request: &Request<Body>) -> PageRequest {
    let uri = request.uri();
    let headers = request
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
        .collect();

    PageRequest::new(request.method().as_str(), uri.path())
        .with_query_string(uri.query().unwrap_or_default())
        .with_headers(headers)
}

/// Decodes the query string into the page content: `{ "query": { ... } }`.
///
/// Repeated keys keep the last value.
pub fn query_content(query: Option<&str>) -> JsonValue {
    let pairs: Map<String, JsonValue> = form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .into_owned()
        .map(|(k, v)| (k, JsonValue::String(v)))
        .collect();
    json!({ "query": pairs })
}

/// Convert a PageResponse to an axum Response
fn page_response_to_axum(response: PageResponse) -> Response {
    let status_code =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status_code);

    for (key, value) in response.headers {
        builder = builder.header(key, value);
    }

    builder.body(Body::from(response.body)).unwrap_or_else(|_| {
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response").into_response()
    })
}

fn fallback_response(status: u16, message: &str) -> PageResponse {
    let mut response = PageResponse::new();
    response.status = status;
    response
        .headers
        .insert("content-type".to_string(), "text/html; charset=utf-8".to_string());
    response.body = error_html(message).into_bytes();
    response
}

fn error_page(status: StatusCode, message: &str) -> Response {
    (status, Html(error_html(message))).into_response()
}

fn error_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Error</title></head>
<body>
    <h1>Error</h1>
    <pre>{}</pre>
</body>
</html>"#,
        html_escape(message)
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
