// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Types for the route table.

use vellum::Params;

use crate::config::RouteConfig;

/// A declared route: URL pattern to page template.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// The URL pattern in matchit format (e.g., "/orders/{id}")
    pub pattern: String,

    /// Name of the template rendered for this route
    pub template: String,

    /// Page title handed to the page context
    pub title: String,
}

impl From<RouteConfig> for Route {
    fn from(config: RouteConfig) -> Self {
        let title = config.title.unwrap_or_else(|| config.template.clone());
        Self {
            pattern: config.pattern,
            template: config.template,
            title,
        }
    }
}

/// Result of matching a URL to a declared route
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// The matched route
    pub route: &'a Route,

    /// URL parameters extracted from the path
    pub params: Params,
}

impl<'a> RouteMatch<'a> {
    /// Get a parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// What the server should render for a request path.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Render `template` with the given title and route parameters.
    Page {
        /// Template name.
        template: String,
        /// Page title.
        title: String,
        /// Route parameters, in match order.
        params: Params,
    },
    /// Nothing answers this path; render the not-found page.
    NotFound,
}

/// Error types for routing operations.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// Invalid or conflicting route pattern.
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why matchit rejected it.
        reason: String,
    },
}

/// Result type for routing operations.
pub type RoutingResult<T> = Result<T, RoutingError>;
