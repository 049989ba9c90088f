//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della migrazione.
//!
//! ## Responsabilità:
//! - Definisce `MigrateError` enum per categorizzare tutti gli errori possibili
//! - Espone `ErrorKind` per decidere abort vs continue a livello di orchestratore
//! - Distingue errori di rete transitori da rifiuti dello storage (`StoreError`)
//! - Mantiene la causa originale tramite `#[source]`
//!
//! ## Categorie di errori:
//! - `InvalidPatternConfiguration`: Pattern con gruppi di cattura insufficienti (fatale)
//! - `IdentityGenerationFailed`: Generazione identificativo fallita (abort del file)
//! - `AssetTooLarge`: Asset oltre il limite di dimensione
//! - `FetchFailed` / `UploadFailed`: Errori di trasferimento
//! - `FilesystemReadFailed` / `FilesystemWriteFailed`: Errori di I/O sul file
//! - `Credentials`: Credenziali storage mancanti o non valide (fatale)
//! - `Validation`: Configurazione non valida (fatale)
//!
//! ## Esempio:
//! ```rust
//! use asset_migrator::error::{ErrorKind, MigrateError};
//!
//! let err = MigrateError::InvalidPatternConfiguration("missing extension group".to_string());
//! assert_eq!(err.kind(), ErrorKind::InvalidPatternConfiguration);
//! assert!(err.is_fatal());
//! ```

use std::path::PathBuf;

/// Boxed cause carried by transfer errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias for migration operations
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Custom error types for asset migration
#[derive(thiserror::Error, Debug)]
pub enum MigrateError {
    #[error("invalid regex capture groups: {0}")]
    InvalidPatternConfiguration(String),

    #[error("failed to generate asset identifier: {0}")]
    IdentityGenerationFailed(String),

    #[error("asset {url} exceeds the maximum size of {limit} bytes")]
    AssetTooLarge {
        url: String,
        /// Declared content-length, `None` when the limit tripped while streaming
        declared: Option<u64>,
        limit: u64,
    },

    #[error("failed to download source {url}")]
    FetchFailed {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to upload stream to {key}")]
    UploadFailed {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to read {}", .path.display())]
    FilesystemReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", .path.display())]
    FilesystemWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage credentials error: {0}")]
    Credentials(String),

    #[error("configuration error: {0}")]
    Validation(String),
}

/// Flat classification of [`MigrateError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidPatternConfiguration,
    IdentityGenerationFailed,
    AssetTooLarge,
    FetchFailed,
    UploadFailed,
    FilesystemReadFailed,
    FilesystemWriteFailed,
    Credentials,
    Validation,
}

impl MigrateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPatternConfiguration(_) => ErrorKind::InvalidPatternConfiguration,
            Self::IdentityGenerationFailed(_) => ErrorKind::IdentityGenerationFailed,
            Self::AssetTooLarge { .. } => ErrorKind::AssetTooLarge,
            Self::FetchFailed { .. } => ErrorKind::FetchFailed,
            Self::UploadFailed { .. } => ErrorKind::UploadFailed,
            Self::FilesystemReadFailed { .. } => ErrorKind::FilesystemReadFailed,
            Self::FilesystemWriteFailed { .. } => ErrorKind::FilesystemWriteFailed,
            Self::Credentials(_) => ErrorKind::Credentials,
            Self::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Configuration-level errors abort the whole run regardless of policy,
    /// since every file would fail the same way.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidPatternConfiguration | ErrorKind::Credentials | ErrorKind::Validation
        )
    }
}

/// Errors reported by an [`AssetStore`](crate::store::AssetStore)
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("storage rejected upload with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl StoreError {
    /// Network failures, throttling and server errors may succeed on retry;
    /// anything else (size, permission, bad request) will not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
        }
    }
}
