#![cfg(not(tarpaulin_include))]

use ca_automation::app;
use ca_automation::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// Serve the CA Automation dashboard.
#[derive(Parser, Debug)]
#[command(name = "website", version, about)]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind, overrides config and `HOST`
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overrides config and `PORT`
    #[arg(long)]
    port: Option<u16>,
}

/// Main entry point for the web application
///
/// Settings are layered: defaults, then the config file, then the
/// environment, then command-line flags.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_env(|name| std::env::var(name).ok())?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    app::run(config).await
}
