// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The `utapi-server` binary: a `clap`-derived CLI wrapping configuration
//! loading, logging setup, and the axum server loop (SPEC_FULL.md §4.8–§4.9).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use utapi_server::config::Config;
use utapi_server::{build_app_state, handlers, logging};

#[derive(Parser)]
#[command(name = "utapi-server", about = "The utapi metric-accounting engine's HTTP server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (the default when no subcommand is given).
    Serve {
        /// Path to the TOML configuration file.
        #[arg(long, env = "UTAPI_CONFIG", default_value = "./utapi.toml")]
        config: PathBuf,
    },
    /// Load and validate configuration, then exit without binding a listener.
    Init {
        /// Path to the TOML configuration file.
        #[arg(long, env = "UTAPI_CONFIG", default_value = "./utapi.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve { config: PathBuf::from("./utapi.toml") });

    match command {
        Command::Init { config: config_path } => {
            let config = Config::load(&config_path)?;
            logging::init(&config.log);
            tracing::info!(component = %config.component, "configuration is valid");
            Ok(())
        }
        Command::Serve { config: config_path } => {
            let config = Config::load(&config_path)?;
            logging::init(&config.log);
            tracing::info!(component = %config.component, workers = config.workers, "starting utapi-server");

            let state = build_app_state(&config).await?;
            let app = handlers::router(state);

            let addr = format!("{}:{}", config.listen.host, config.listen.port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(%addr, "listening");
            axum::serve(listener, app).await?;
            Ok(())
        }
    }
}
