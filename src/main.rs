//! greenlight - request admission and authorization service

#![allow(missing_docs)]

use clap::Parser;
use greenlight::config::Config;
use greenlight::server;
use greenlight::utils::logging::init_logging;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Command line arguments; each flag also reads a `GREENLIGHT_*` variable
#[derive(Debug, Parser)]
#[command(name = "greenlight", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "GREENLIGHT_CONFIG", default_value = "config/greenlight.yaml")]
    config: PathBuf,

    /// Override `server.host`
    #[arg(long, env = "GREENLIGHT_HOST")]
    host: Option<String>,

    /// Override `server.port`
    #[arg(short, long, env = "GREENLIGHT_PORT")]
    port: Option<u16>,

    /// Override `storage.database.url`
    #[arg(long, env = "GREENLIGHT_DATABASE_URL")]
    database_url: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.database_url {
            config.storage.database.url = url.clone();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let (mut config, load_error) = if args.config.exists() {
        match Config::from_file(&args.config).await {
            Ok(config) => (config, None),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        (Config::default(), Some(args.config.display().to_string()))
    };
    args.apply(&mut config);

    init_logging(&config.server.logging);
    if let Some(path) = load_error {
        warn!("Configuration file {} not found, using defaults", path);
    }
    info!(version = greenlight::VERSION, "starting {}", greenlight::NAME);

    match server::builder::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server failed: {}", e);
            // Print error using Display (not Debug) to preserve newlines
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
