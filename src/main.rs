//! # Asset Migrator - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Creazione della configurazione e avvio del migrator
//! - Unico punto in cui si decide l'exit code del processo
//!
//! ## Credenziali:
//! `AZ_STORAGE_ACCOUNT` e `AZ_STORAGE_ACCESS_KEY` devono essere presenti
//! nell'ambiente, tranne che in dry run.
//!
//! ## Esempio di utilizzo:
//! ```bash
//! asset-migrator -d content/post --url https://cdn.example.com \
//!     -b https://example.blob.core.windows.net/\$web --dry-run
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use asset_migrator::config::{DEFAULT_MAX_BYTES, DEFAULT_PATTERN};
use asset_migrator::json_output::JsonMessage;
use asset_migrator::{Config, Migrator};

#[derive(Parser)]
#[command(name = "asset-migrator")]
#[command(about = "Move linked assets to blob storage and rewrite the links")]
struct Args {
    /// Directory whose files are scanned (not recursive)
    #[arg(short = 'd', long, default_value = "content/post")]
    directory: PathBuf,

    /// Endpoint to migrate to, used to build and detect new links
    #[arg(long = "url")]
    destination_url: String,

    /// Blob container URL assets are uploaded to
    #[arg(short = 'b', long = "storage-url")]
    storage_url: String,

    /// Regex used to find changes: group 1 is the URL, group 2 the extension
    #[arg(short = 'r', long, default_value = DEFAULT_PATTERN)]
    regex: String,

    /// Max content-length to allow for an upload in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BYTES)]
    max_bytes: u64,

    /// Number of files processed in parallel
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Don't change files or perform uploads
    #[arg(long)]
    dry_run: bool,

    /// Stop at the first file that fails
    #[arg(long)]
    fail_fast: bool,

    /// Emit newline-delimited JSON events on stdout
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let json_output = args.json;

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            if json_output {
                JsonMessage::error(e.to_string(), Some(format!("{:#}", e))).emit();
            }
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<bool> {
    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config {
        directory: args.directory,
        pattern: args.regex,
        destination_url: args.destination_url,
        storage_url: args.storage_url,
        max_bytes: args.max_bytes,
        dry_run: args.dry_run,
        workers: args.workers,
        fail_fast: args.fail_fast,
        http_timeout_secs: args.timeout,
        json_output: args.json,
    };

    // pattern, directory and credentials are checked here, in that order
    let migrator = Migrator::new(config)?;
    let summary = migrator.run().await?;

    if !summary.is_success() {
        error!("{} file(s) failed to migrate", summary.failures.len());
        for failure in &summary.failures {
            error!("  {}: {}", failure.path.display(), failure.error);
        }
    }

    Ok(summary.is_success())
}
