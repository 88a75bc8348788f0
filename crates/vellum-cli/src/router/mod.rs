// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Request path to template resolution.
//!
//! Declared `[[routes]]` are tried first. A path that matches none of them
//! falls back to its last segment as a template name (`/` maps to `index`),
//! provided a page template by that name was discovered. Include fragments
//! are never served on their own.

/// Route table types.
pub mod types;

use matchit::Router as MatchitRouter;
use vellum::TemplateSet;

use crate::config::RouteConfig;
pub use types::{Resolution, Route, RouteMatch, RoutingError, RoutingResult};

/// Template rendered for `/` when no route claims it.
pub const INDEX_TEMPLATE: &str = "index";

/// Declared routes plus the name fallback.
pub struct RouteTable {
    routes: Vec<Route>,
    matcher: MatchitRouter<usize>,
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl RouteTable {
    /// Builds the table from configured routes.
    pub fn new(routes: Vec<RouteConfig>) -> RoutingResult<Self> {
        let routes: Vec<Route> = routes.into_iter().map(Route::from).collect();
        let mut matcher = MatchitRouter::new();
        for (i, route) in routes.iter().enumerate() {
            matcher
                .insert(route.pattern.as_str(), i)
                .map_err(|e| RoutingError::InvalidPattern {
                    pattern: route.pattern.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(Self { routes, matcher })
    }

    /// Match a URL path against the declared routes
    pub fn match_url(&self, path: &str) -> Option<RouteMatch<'_>> {
        let normalized_path = normalize(path);

        match self.matcher.at(normalized_path) {
            Ok(matched) => {
                let route = &self.routes[*matched.value];
                let params = matched
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();

                Some(RouteMatch { route, params })
            }
            Err(_) => None,
        }
    }

    /// Decides what to render for `path`.
    pub fn resolve(&self, path: &str, templates: &TemplateSet) -> Resolution {
        if let Some(matched) = self.match_url(path) {
            return Resolution::Page {
                template: matched.route.template.clone(),
                title: matched.route.title.clone(),
                params: matched.params,
            };
        }

        let name = fallback_name(path);
        if !name.is_empty()
            && templates.registry().contains(name)
            && !templates.shared().contains(name)
        {
            tracing::debug!("No route for {}, rendering template '{}' by name", path, name);
            return Resolution::Page {
                template: name.to_string(),
                title: name.to_string(),
                params: Vec::new(),
            };
        }

        Resolution::NotFound
    }

    /// All declared routes (for listing)
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

fn normalize(path: &str) -> &str {
    if path.is_empty() || path == "/" {
        "/"
    } else {
        path.trim_end_matches('/')
    }
}

fn fallback_name(path: &str) -> &str {
    let normalized = normalize(path);
    if normalized == "/" {
        return INDEX_TEMPLATE;
    }
    normalized.rsplit('/').next().unwrap_or_default()
}
