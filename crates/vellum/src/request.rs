// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Inbound request abstraction for page rendering.
//!
//! The renderer only needs a request's path and URI. Adapters (HTTP servers,
//! tests) fill in the rest so handler code can inspect it.

use std::collections::HashMap;

/// Route parameters extracted by the caller's router, in match order.
pub type Params = Vec<(String, String)>;

/// A platform-agnostic inbound request.
///
/// # Example
///
/// ```rust
/// use vellum::PageRequest;
///
/// let request = PageRequest::new("GET", "/orders/42").with_query_string("tab=fills");
/// assert_eq!(request.uri(), "/orders/42?tab=fills");
/// ```
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// The HTTP method (e.g., "GET", "POST")
    pub method: String,

    /// The request path (e.g., "/orders/42")
    pub path: String,

    /// Raw query string without the leading `?`
    pub query_string: Option<String>,

    /// HTTP headers, keys lowercased
    pub headers: HashMap<String, String>,
}

impl PageRequest {
    /// Creates a new request with the given method and path.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query_string: None,
            headers: HashMap::new(),
        }
    }

    /// Sets the raw query string. An empty string clears it.
    pub fn with_query_string(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query_string = if query.is_empty() { None } else { Some(query) };
        self
    }

    /// Adds a header. The name is stored lowercased.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Replaces all headers. Names are stored lowercased.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        self
    }

    /// The request URI as sent by the client: path plus query string.
    pub fn uri(&self) -> String {
        match &self.query_string {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// Looks up a header case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// The `Referer` header, if present.
    pub fn referrer(&self) -> Option<&str> {
        self.header("referer")
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new("GET", "/")
    }
}
