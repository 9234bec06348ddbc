//! Downcache CLI - fetch URLs through the on-disk response cache

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use downcache::{to_path, Config, ConfigUpdate, Downcache, FetchRequest, LogLevel, RetrieveOptions};

#[derive(Debug, Parser)]
#[command(name = "downcache", version, about = "Fetch URLs through an on-disk response cache")]
struct Cli {
    /// Cache directory
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Minimum interval between live fetches in milliseconds (0 = unlimited)
    #[arg(long = "rate-limit-ms", global = true)]
    rate_limit: Option<u64>,

    /// Log level (silent, error, warn, info, verbose)
    #[arg(long, global = true)]
    log: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the body for a URL, from cache when present
    Get {
        url: String,
        /// Explicit cache path relative to the cache directory
        #[arg(long)]
        path: Option<PathBuf>,
        /// Ignore any cached copy and call live
        #[arg(long)]
        force: bool,
        /// Don't write the fetched body to the cache
        #[arg(long)]
        no_cache: bool,
        /// Decode the body as JSON and pretty-print it
        #[arg(long)]
        json: bool,
    },
    /// Print the cache path computed for a URL
    Path { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // DOWNCACHE_* environment, then command-line flags
    let mut config = Config::from_env()?;
    config.apply(ConfigUpdate {
        directory: cli.dir,
        rate_limit: cli.rate_limit,
        log_level: cli.log,
    });

    // RUST_LOG wins over the configured log level
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .map(Into::into)
        .unwrap_or_else(|| config.log_level.to_level_filter());

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Path { url } => {
            println!("{}", config.base_directory.join(to_path(&url)?).display());
        }
        Command::Get {
            url,
            path,
            force,
            no_cache,
            json,
        } => {
            let cache = Downcache::new(config)?;
            let request = FetchRequest::with_options(
                url,
                RetrieveOptions {
                    path,
                    force,
                    no_cache,
                    json,
                    ..Default::default()
                },
            );

            let result = match cache.retrieve(request).await {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "Retrieve failed");
                    if let Some(fetched) = e.fetched() {
                        std::io::stdout().write_all(fetched.body.text().as_bytes())?;
                    }
                    std::process::exit(1);
                }
            };

            info!(status = %result.status, path = %result.path.display(), "Done");

            let mut stdout = std::io::stdout().lock();
            match result.body.json() {
                Some(value) => writeln!(stdout, "{}", serde_json::to_string_pretty(value)?)?,
                None => stdout.write_all(result.body.text().as_bytes())?,
            }
        }
    }

    Ok(())
}
