// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTTP server components.
//!
//! - `http`: axum adapter that renders pages per request

/// HTTP server implementation using Axum.
pub mod http;

pub use http::{build_app, create_server, AppState};
