//! Abacus - Entry point
//!
//! Runs the calculator API until SIGINT or SIGTERM.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use abacus::build_server;
use abacus_config::{AbacusConfig, ConfigLoader, LogFormat};

/// Prefix of configuration environment variables (`ABACUS__SERVER__HTTP_ADDR`).
const ENV_PREFIX: &str = "ABACUS";

/// Calculator HTTP API.
#[derive(Debug, Parser)]
#[command(name = "abacus")]
#[command(about = "Calculator HTTP API", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, env = "ABACUS_CONFIG")]
    config: Option<PathBuf>,

    /// Bind host, keeping the configured port
    #[arg(long)]
    host: Option<String>,

    /// Bind port, keeping the configured host
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter directive (e.g. "info", "abacus_server=debug,warn")
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format: json or pretty
    #[arg(long)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<AbacusConfig> {
        let mut loader = ConfigLoader::new().with_defaults();
        if let Some(path) = &self.config {
            loader = loader
                .with_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        }

        let mut config = loader
            .with_dotenv()?
            .with_env_vars(ENV_PREFIX, std::env::vars())?
            .load_unvalidated();

        self.apply_overrides(&mut config);
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut AbacusConfig) {
        if let Some(host) = &self.host {
            config.set_host(host);
        }
        if let Some(port) = self.port {
            config.set_port(port);
        }
        if let Some(level) = &self.log_level {
            config.telemetry.logging.level.clone_from(level);
        }
        if let Some(format) = self.log_format {
            config.telemetry.logging.format = format;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("abacus: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = abacus_telemetry::init_logging(&config.telemetry.logging.to_log_config()) {
        eprintln!("abacus: {e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{e:#}");
            error!(error = %message, "Abacus exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AbacusConfig) -> anyhow::Result<()> {
    abacus_telemetry::init_metrics(&config.telemetry.metrics.to_metrics_config())
        .context("Failed to initialize metrics")?;

    info!(
        service = %config.service.name,
        version = abacus::VERSION,
        addr = %config.server.http_addr,
        "Starting Abacus"
    );

    build_server(&config).run().await.context("Server error")?;

    info!("Abacus stopped");
    Ok(())
}
