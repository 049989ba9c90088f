//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sul filesystem locale.
//!
//! ## Responsabilità:
//! - Discovery non ricorsiva dei file di testo in una directory
//! - Lettura completa di un file come bytes
//! - Sovrascrittura atomica (file temporaneo + rename) preservando i permessi
//! - Formattazione human-readable delle dimensioni
//!
//! ## Sicurezza operazioni:
//! - Il file temporaneo vive nella stessa directory del target, così il rename
//!   resta atomico e un crash non lascia mai un file scritto a metà
//! - In caso di errore il file originale resta invariato
//!
//! ## Esempio:
//! ```rust,no_run
//! use asset_migrator::file_manager::FileManager;
//! use std::path::Path;
//!
//! let files = FileManager::find_files(Path::new("content/post")).unwrap();
//! for file in files {
//!     println!("{}", file.display());
//! }
//! ```

use crate::error::{MigrateError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Regular files directly inside `dir`, sorted by name. Subdirectories are
    /// not descended into.
    pub fn find_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| MigrateError::FilesystemReadFailed {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
                source: e.into(),
            })?;

            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Read the whole file
    pub async fn read(path: &Path) -> Result<Vec<u8>> {
        fs::read(path).await.map_err(|source| MigrateError::FilesystemReadFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replace the file content in one step
    pub async fn write_atomic(path: &Path, content: Vec<u8>) -> Result<()> {
        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::write_atomic_blocking(&target, &content))
            .await
            .map_err(|e| MigrateError::FilesystemWriteFailed {
                path: path.to_path_buf(),
                source: std::io::Error::other(e),
            })?
    }

    fn write_atomic_blocking(path: &Path, content: &[u8]) -> Result<()> {
        let write_failed = |source: std::io::Error| MigrateError::FilesystemWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let permissions = std::fs::metadata(path).map(|m| m.permissions()).ok();

        let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(write_failed)?;
        temp.write_all(content).map_err(write_failed)?;
        temp.as_file().sync_all().map_err(write_failed)?;
        if let Some(permissions) = permissions {
            temp.as_file().set_permissions(permissions).map_err(write_failed)?;
        }
        temp.persist(path).map_err(|e| write_failed(e.error))?;

        Ok(())
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
