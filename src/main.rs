// src/main.rs

//! The main entry point for the N1QL exporter.

use anyhow::Result;
use clap::Parser;
use n1ql_exporter::config::{Config, parse_listen_addr};
use n1ql_exporter::server;
use tracing::error;
use tracing_subscriber::{filter::EnvFilter, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "n1ql-exporter",
    version,
    about = "Exports N1QL query service metrics to Prometheus"
)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Address of the metrics endpoint, e.g. `0.0.0.0:8380` or `:8380`.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The exporter cannot run without a valid configuration.
    let mut config = match Config::from_file(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(1);
        }
    };

    if let Some(listen) = args.listen.as_deref() {
        match parse_listen_addr(listen) {
            Ok(addr) => config.listen = addr,
            Err(e) => {
                eprintln!("{e:#}");
                std::process::exit(1);
            }
        }
    }

    // Initial log level comes from RUST_LOG, falling back to the config file.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true),
        )
        .init();

    if let Err(e) = server::run(config).await {
        error!("Exporter runtime error: {:#}", e);
        return Err(e);
    }

    Ok(())
}
