// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Server command.
//!
//! Walks the template tree once, then renders every request from it.
//! Page templates are read fresh per request, so edits show up on reload;
//! include fragments are fixed at startup.

use crate::config::Config;
use crate::server::create_server;

/// Runs the HTTP server. `host` and `port` override `[server]` in `vellum.toml`.
pub async fn run(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let working_dir = std::env::current_dir()?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    println!("Serving {} from {}", config.project.name, working_dir.join(&config.templates.dir).display());
    for route in &config.routes {
        println!("  {} -> {}", route.pattern, route.template);
    }
    println!("Server running at http://{}", addr);

    create_server(&addr, &config, &working_dir).await
}
