// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Outbound response sink for page rendering.
//!
//! Rendered bytes are streamed into a [`ResponseSink`]. Adapters either
//! implement the trait over their own writer or use the buffered
//! [`PageResponse`] and convert it once the page is done.

use std::collections::HashMap;
use std::io::{self, Write};

/// Receives rendered output plus status and headers.
pub trait ResponseSink: Write + Send {
    /// Sets the HTTP status code.
    fn set_status(&mut self, status: u16);

    /// Sets a header, replacing any previous value.
    fn set_header(&mut self, name: &str, value: &str);
}

/// A buffered response: status, headers and body bytes.
///
/// # Example
///
/// ```rust
/// use std::io::Write;
/// use vellum::{PageResponse, ResponseSink};
///
/// let mut response = PageResponse::new();
/// response.set_header("Content-Type", "text/html");
/// response.write_all(b"<h1>Hello</h1>").unwrap();
/// assert_eq!(response.body_str(), Some("<h1>Hello</h1>"));
/// ```
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// HTTP status code
    pub status: u16,
    /// HTTP headers, keys lowercased
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
}

impl PageResponse {
    /// Creates an empty 200 response.
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Returns a header value, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Returns the body as a string, if valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Returns true if nothing has been written to the body.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Returns true if this is a success response (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if this is an error response (4xx or 5xx).
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

impl Default for PageResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for PageResponse {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ResponseSink for PageResponse {
    fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
    }
}
