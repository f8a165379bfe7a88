use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "execgate",
    version,
    about = "Manage and dry-run the execgate execution policy"
)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default config file
    Init {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config and where it was read from
    Config,
    /// Evaluate a virtual path without starting anything
    Check {
        /// Account to evaluate as; anonymous when omitted
        #[arg(long)]
        user: Option<String>,
        file: String,
    },
    /// Print the digest of a bearer token for the accounts table
    Token { token: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { path, force } => commands::config::init(path.or(cli.config), force),
        Commands::Config => commands::config::print_effective(cli.config),
        Commands::Check { user, file } => commands::check::execute(commands::check::CheckInputs {
            config_path: cli.config,
            user,
            file,
        }),
        Commands::Token { token } => commands::token::execute(&token),
    }
}
