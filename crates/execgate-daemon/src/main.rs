use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use execgate_core::config::resolve_config_path;
use execgate_core::ConfigFile;

mod audit;
mod http;
mod service;
#[cfg(test)]
mod testing;

use http::AppState;
use service::ExecService;

#[derive(Parser, Debug)]
#[command(
    name = "execgate-daemon",
    version,
    about = "Serves policy-checked file execution to the web UI"
)]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `[server] listen` from the config file
    #[arg(long)]
    listen: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config_path = resolve_config_path(args.config)?;
    let provider = Arc::new(ConfigFile::new(config_path));
    let config = provider.load().with_context(|| {
        format!(
            "load config {} (run `execgate init` to create one)",
            provider.path().display()
        )
    })?;
    info!("using config {}", provider.path().display());

    let listen = args.listen.unwrap_or(config.server.listen);
    let service = ExecService::init(provider);
    http::serve(&listen, AppState::new(service)).await
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();
}
