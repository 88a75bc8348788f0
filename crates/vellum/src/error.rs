// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error types for template discovery and rendering.
//!
//! This module defines [`VellumError`], the error enum returned by every
//! fallible operation in the crate.
//!
//! # Error Categories
//!
//! - **Startup errors**: the template root is missing ([`VellumError::TemplateDirMissing`])
//! - **Lookup errors**: a render asked for a name the registry never saw
//! - **Render errors**: the template file could not be read, parsed, or executed
//! - **Handler errors**: [`VellumError::CredentialExpired`], raised by request
//!   handlers and recognised by [`Page::render_error`](crate::Page::render_error)
//!
//! Problems with individual files during the startup walk are not errors:
//! they are logged and the file is skipped.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for vellum operations.
#[derive(Error, Debug)]
pub enum VellumError {
    /// The configured template root does not exist or is not a directory.
    ///
    /// The process cannot serve pages without it.
    #[error("Template directory not found: {}", path.display())]
    TemplateDirMissing {
        /// The root that was requested.
        path: PathBuf,
    },

    /// No template with this name was registered during setup.
    #[error("Could not find path for template: {name}")]
    TemplateNotFound {
        /// The requested logical name.
        name: String,
    },

    /// The template file was registered but could not be read at render time.
    #[error("Could not read contents of template file {}: {source}", path.display())]
    ReadFailure {
        /// Path of the unreadable file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The template source is not valid template syntax.
    #[error("Could not parse template {name}: {source}")]
    ParseFailure {
        /// Logical name of the template.
        name: String,
        /// The parser error.
        #[source]
        source: tera::Error,
    },

    /// The render data could not be turned into a template context.
    #[error("Could not build template context: {source}")]
    ContextFailure {
        /// The serialization error.
        #[source]
        source: tera::Error,
    },

    /// The template failed while executing. Output may already be in the sink.
    #[error("Could not execute template {name}: {source}")]
    ExecutionFailure {
        /// Logical name of the template.
        name: String,
        /// The execution error.
        #[source]
        source: tera::Error,
    },

    /// The access credential of the current user has expired or is invalid.
    #[error("The access token being passed has expired or is invalid.")]
    CredentialExpired,

    /// Writing to the response sink failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VellumError {
    /// Returns true for [`VellumError::TemplateNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TemplateNotFound { .. })
    }

    /// Returns true when the error is the typed credential-expiry kind.
    pub fn is_credential_expired(&self) -> bool {
        matches!(self, Self::CredentialExpired)
    }
}

/// Convenience type alias for Results with [`VellumError`].
pub type Result<T> = std::result::Result<T, VellumError>;
