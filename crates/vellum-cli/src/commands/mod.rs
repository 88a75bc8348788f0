// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! CLI command implementations.
//!
//! - `serve`: Render pages over HTTP
//! - `check`: Report what the template walk discovered

/// Template tree report command.
pub mod check;
/// HTTP server command.
pub mod serve;
