// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vellum_cli::commands;

#[derive(Parser)]
#[command(name = "vellum")]
#[command(author = "Maravilla Labs")]
#[command(version)]
#[command(about = "Serve and inspect a server-rendered template tree", long_about = None)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve pages rendered from the template directory
    Serve {
        /// Port to run the server on (default: [server] port, 3000)
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind to (default: [server] host, 127.0.0.1)
        #[arg(long)]
        host: Option<String>,
    },
    /// List discovered templates and report missing reserved ones
    Check {
        /// Also render this template as the page for `/` and print it
        #[arg(long)]
        render: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with the specified log level
    let filter = EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    match cli.command {
        Commands::Serve { port, host } => {
            commands::serve::run(host, port).await
        }
        Commands::Check { render } => {
            commands::check::run(render)
        }
    }
}
