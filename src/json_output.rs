//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso da script.
//!
//! ## Tipi di messaggi (uno per riga su stdout):
//! - `start`: Inizio della run con la configurazione effettiva
//! - `file_complete`: Fine elaborazione di un file, con le `Change` applicate
//! - `complete`: Fine della run con statistiche finali
//! - `error`: Errore che ha interrotto la run

use crate::planner::Change;
use crate::progress::MigrationStats;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum JsonMessage {
    #[serde(rename = "start")]
    Start {
        directory: PathBuf,
        total_files: usize,
        config: JsonConfig,
    },

    #[serde(rename = "file_complete")]
    FileComplete {
        path: PathBuf,
        changes: Vec<JsonChange>,
        bytes_transferred: u64,
        error: Option<String>,
    },

    #[serde(rename = "complete")]
    Complete {
        files_scanned: usize,
        files_changed: usize,
        assets_migrated: usize,
        bytes_transferred: u64,
        errors: usize,
        duration_seconds: f64,
    },

    #[serde(rename = "error")]
    Error {
        message: String,
        details: Option<String>,
    },
}

/// Configurazione per output JSON
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonConfig {
    pub destination_url: String,
    pub storage_url: String,
    pub max_bytes: u64,
    pub workers: usize,
    pub dry_run: bool,
    pub fail_fast: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonChange {
    pub old_url: String,
    pub new_url: String,
}

impl From<&Change> for JsonChange {
    fn from(change: &Change) -> Self {
        Self {
            old_url: change.old_url.clone(),
            new_url: change.new_url.clone(),
        }
    }
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(directory: PathBuf, total_files: usize, config: JsonConfig) -> Self {
        Self::Start {
            directory,
            total_files,
            config,
        }
    }

    pub fn file_complete(
        path: PathBuf,
        changes: &[Change],
        bytes_transferred: u64,
        error: Option<String>,
    ) -> Self {
        Self::FileComplete {
            path,
            changes: changes.iter().map(JsonChange::from).collect(),
            bytes_transferred,
            error,
        }
    }

    pub fn complete(stats: &MigrationStats, duration_seconds: f64) -> Self {
        Self::Complete {
            files_scanned: stats.files_scanned,
            files_changed: stats.files_changed,
            assets_migrated: stats.assets_migrated,
            bytes_transferred: stats.bytes_transferred,
            errors: stats.errors,
            duration_seconds,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

impl From<&crate::Config> for JsonConfig {
    fn from(config: &crate::Config) -> Self {
        Self {
            destination_url: config.destination_url.clone(),
            storage_url: config.storage_url.clone(),
            max_bytes: config.max_bytes,
            workers: config.workers,
            dry_run: config.dry_run,
            fail_fast: config.fail_fast,
        }
    }
}
