//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione di una migrazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri della run
//! - Fornisce validazione robusta dei parametri di input
//! - Fornisce valori di default sensati per i parametri opzionali
//!
//! ## Parametri di configurazione:
//! - `directory`: Directory da scansionare (non ricorsiva, default: "content/post")
//! - `pattern`: Regex con gruppi (1) URL e (2) estensione
//! - `destination_url`: Base URL per skip-detection e riscrittura link
//! - `storage_url`: Endpoint del container dove vengono caricati gli asset
//! - `max_bytes`: Dimensione massima di un asset (default: 8 MiB)
//! - `dry_run`: Nessun upload e nessuna scrittura su file (default: false)
//! - `workers`: Numero di file processati in parallelo (default: 4)
//! - `fail_fast`: Interrompe la run al primo file fallito (default: false)
//! - `http_timeout_secs`: Timeout per richiesta HTTP (default: 30)
//!
//! ## Esempio:
//! ```rust
//! use asset_migrator::Config;
//!
//! let config = Config {
//!     destination_url: "https://cdn.example.com".to_string(),
//!     storage_url: "https://example.blob.core.windows.net/$web".to_string(),
//!     workers: 8,
//!     ..Default::default()
//! };
//! config.validate().unwrap();
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Matches http(s) links to gif/png/jpg/jpeg assets followed by a non-word character
pub const DEFAULT_PATTERN: &str = r#"(https?://[^\s"'<>()\[\]]+?\.(gif|png|jpg|jpeg))(\W)"#;

/// 8 MiB
pub const DEFAULT_MAX_BYTES: u64 = 8_388_608;

/// Configuration for a migration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory whose files are scanned for asset links
    pub directory: PathBuf,
    /// Regex with capture groups (1) asset URL and (2) extension
    pub pattern: String,
    /// Base URL for rewritten links, also used to detect migrated links
    pub destination_url: String,
    /// Container endpoint assets are uploaded to
    pub storage_url: String,
    /// Maximum asset size in bytes
    pub max_bytes: u64,
    /// Don't upload assets or rewrite files
    pub dry_run: bool,
    /// Number of files processed concurrently
    pub workers: usize,
    /// Stop scheduling files after the first failure
    pub fail_fast: bool,
    /// Timeout applied to every HTTP request
    pub http_timeout_secs: u64,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("content/post"),
            pattern: DEFAULT_PATTERN.to_string(),
            destination_url: String::new(),
            storage_url: String::new(),
            max_bytes: DEFAULT_MAX_BYTES,
            dry_run: false,
            workers: 4,
            fail_fast: false,
            http_timeout_secs: 30,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.max_bytes == 0 {
            return Err(anyhow::anyhow!("Maximum asset size must be greater than 0"));
        }

        if self.http_timeout_secs == 0 {
            return Err(anyhow::anyhow!("HTTP timeout must be greater than 0"));
        }

        if self.pattern.is_empty() {
            return Err(anyhow::anyhow!("Pattern must not be empty"));
        }

        let destination = Url::parse(&self.destination_url)
            .map_err(|e| anyhow::anyhow!("Invalid destination URL '{}': {}", self.destination_url, e))?;
        if !matches!(destination.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!("Destination URL must use http or https: {}", self.destination_url));
        }

        Url::parse(&self.storage_url)
            .map_err(|e| anyhow::anyhow!("Invalid storage URL '{}': {}", self.storage_url, e))?;

        Ok(())
    }

    /// Destination base URL without trailing slashes
    pub fn destination_base(&self) -> &str {
        self.destination_url.trim_end_matches('/')
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
