use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use geocode_relay::config::Settings;
use geocode_relay::server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Geocode Relay — address to latitude/longitude over HTTP.
///
/// Serves `GET /geocode?address=<text>` and resolves addresses through a
/// primary geocoding provider, falling back to a secondary provider when the
/// primary fails.
///
/// Examples:
///   geocode-relay
///   geocode-relay --config /etc/geocode-relay/config.toml
///   geocode-relay --port 8801 --log-level debug
#[derive(Parser)]
#[command(name = "geocode-relay", version, about, long_about = None)]
struct Cli {
    /// Config file to use. Defaults to ./config.toml, then the user config dir.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Server port. Overrides `server_port` from the config file.
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Address to bind the listener to.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "warn").
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("starting geocoding service");

    // ── Load configuration ──────────────────────────────────────

    let settings = match Settings::load(cli.config.as_deref(), cli.port) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "config issue");
            return ExitCode::FAILURE;
        }
    };
    let geocoder = match settings.build_geocoder() {
        Ok(g) => g,
        Err(e) => {
            error!(error = %e, "config issue");
            return ExitCode::FAILURE;
        }
    };

    // ── Serve ───────────────────────────────────────────────────

    if let Err(e) = server::start(&cli.host, settings.port, geocoder).await {
        error!(error = %e, host = %cli.host, port = settings.port, "server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
