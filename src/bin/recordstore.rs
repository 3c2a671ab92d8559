//! Record store console
//!
//! Command-line front end for the storage backends:
//! - Interactive shell over the configured backend
//! - Configuration inspection
//!
//! # Examples
//!
//! ```bash
//! # Slotted store with an LRU cache in front
//! RECORDSTORE__CACHE__ENABLED=true recordstore shell
//!
//! # Ordered map, commands piped from a file
//! recordstore shell --backend ordered_map < commands.txt
//!
//! # Show the resolved configuration
//! recordstore --config recordstore.toml config
//! ```

use clap::{Args, Parser, Subcommand};
use recordstore::shell::{self, HELP};
use recordstore::{Backend, BackendKind, StoreConfig};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Pluggable record storage console
#[derive(Parser, Debug)]
#[command(name = "recordstore")]
#[command(version = recordstore::VERSION)]
#[command(about = "Pluggable record storage console", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./recordstore.toml when present)
    #[arg(long, global = true, env = "RECORDSTORE_CONFIG")]
    config: Option<PathBuf>,

    /// Log directory path
    #[arg(long, global = true, default_value = "logs", env = "RECORDSTORE_LOG_DIR")]
    log_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read commands from stdin and run them against a backend
    Shell(ShellArgs),

    /// Print the resolved configuration as TOML
    Config,

    /// Show version
    Version,
}

/// Shell arguments
#[derive(Args, Debug)]
struct ShellArgs {
    /// Override the configured backend
    #[arg(short, long)]
    backend: Option<BackendKind>,

    /// Put an LRU cache of this many records in front of the backend
    #[arg(long)]
    cache: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli)?;

    let config = StoreConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Shell(args) => shell_command(config, args).await,
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Version => {
            println!("recordstore {}", recordstore::VERSION);
            Ok(())
        }
    }
}

/// Setup logging with rolling files and stderr output
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    std::fs::create_dir_all(&cli.log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &cli.log_dir, "recordstore.log");

    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color)
                .compact(),
        )
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(())
}

/// Shell command - interactive session over stdin/stdout
async fn shell_command(mut config: StoreConfig, args: ShellArgs) -> anyhow::Result<()> {
    if let Some(kind) = args.backend {
        config.backend = kind;
    }
    if let Some(capacity) = args.cache {
        config.cache.enabled = true;
        config.cache.capacity = capacity;
    }
    config.validate()?;

    let backend = Backend::from_config(&config)?;
    info!(?backend, "Shell started");
    eprintln!("{}", HELP);

    shell::run(
        &backend,
        &config.template,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    info!("Shell finished");
    Ok(())
}
