// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! Vellum CLI library.
//!
//! This crate provides the command-line interface and HTTP adapter for the
//! vellum page renderer.
//!
//! # Usage
//!
//! This crate is primarily used through the `vellum` binary:
//!
//! ```bash
//! vellum serve            # Render pages over HTTP
//! vellum check            # List discovered templates
//! vellum check --render index
//! ```
//!
//! # Configuration
//!
//! Projects are configured via `vellum.toml` at the project root.

/// CLI commands (serve, check).
pub mod commands;
/// Project configuration from `vellum.toml`.
pub mod config;
/// Request path to template resolution.
pub mod router;
/// HTTP server.
pub mod server;
