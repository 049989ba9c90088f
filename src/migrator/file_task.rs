//! # File Task Module
//!
//! Worker per la migrazione di un singolo file.
//! Tutti gli asset del file vengono copiati prima di riscrivere il testo:
//! un crash a metà lascia al massimo asset orfani nello storage, mai link
//! verso asset inesistenti.

use crate::{
    error::Result,
    mover::AssetMover,
    pattern::AssetPattern,
    planner::{Change, ChangePlanner},
    rewriter::SourceFile,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one successfully processed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub changes: Vec<Change>,
    pub bytes_transferred: u64,
}

/// Per-file pipeline, cloned into every worker
#[derive(Clone)]
pub struct FileTask {
    pub pattern: Arc<AssetPattern>,
    pub planner: ChangePlanner,
    pub mover: AssetMover,
    pub dry_run: bool,
}

impl FileTask {
    /// Processa un singolo file
    pub async fn process_file(&self, path: PathBuf) -> Result<FileReport> {
        let mut file = SourceFile::new(path.clone());

        let changes = file.find_changes(&self.pattern, &self.planner).await?;
        if changes.is_empty() {
            debug!("Nothing to migrate in {}", path.display());
            return Ok(FileReport {
                path,
                changes,
                bytes_transferred: 0,
            });
        }

        info!(
            "found {} asset(s) to migrate in file: {}",
            changes.len(),
            path.display()
        );

        let mut bytes_transferred = 0;
        for change in &changes {
            bytes_transferred += self.mover.migrate(change, self.dry_run).await?;
        }

        if !self.dry_run {
            file.apply_all(&changes).await?;
        }

        Ok(FileReport {
            path,
            changes,
            bytes_transferred,
        })
    }
}
