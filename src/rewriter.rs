//! # Text Rewriter Module
//!
//! Gestisce un file di testo durante la migrazione e applica le `Change`.
//!
//! ## Responsabilità:
//! - Caricamento lazy del contenuto: una sola lettura per istanza
//! - I file che non sono UTF-8 valido (immagini, post Latin-1) vengono
//!   ignorati: nessuna `Change`, nessuna scrittura
//! - Ricerca delle `Change` sullo stesso snapshot del contenuto
//! - Sostituzione letterale di tutte le occorrenze, nell'ordine ricevuto
//! - Scrittura unica del buffer dopo che tutte le sostituzioni sono applicate
//!
//! ## Atomicità:
//! Il file su disco è o quello originale o quello con tutte le `Change`
//! applicate. Mai una via di mezzo.

use crate::error::{MigrateError, Result};
use crate::file_manager::FileManager;
use crate::pattern::AssetPattern;
use crate::planner::{Change, ChangePlanner};
use std::path::PathBuf;
use tracing::warn;

/// Apply changes in order to `content`
pub fn apply_changes(content: &str, changes: &[Change]) -> String {
    changes
        .iter()
        .fold(content.to_string(), |text, change| change.apply(&text))
}

/// A text file being migrated
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    content: Option<String>,
    not_text: bool,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content: None,
            not_text: false,
        }
    }

    /// File content, read from disk on first use. `None` when the file is not UTF-8 text
    pub async fn content(&mut self) -> Result<Option<&str>> {
        if self.content.is_none() && !self.not_text {
            let bytes = FileManager::read(&self.path).await?;
            match String::from_utf8(bytes) {
                Ok(text) => self.content = Some(text),
                Err(e) => {
                    warn!(
                        "Skipping {}: not UTF-8 text ({})",
                        self.path.display(),
                        e.utf8_error()
                    );
                    self.not_text = true;
                }
            }
        }

        Ok(self.content.as_deref())
    }

    /// Changes needed to move every matched asset under the planner's base URL
    pub async fn find_changes(
        &mut self,
        pattern: &AssetPattern,
        planner: &ChangePlanner,
    ) -> Result<Vec<Change>> {
        match self.content().await? {
            Some(text) => planner.plan_matches(&pattern.find_matches(text)?),
            None => Ok(Vec::new()),
        }
    }

    /// Apply all changes in memory, then persist once
    pub async fn apply_all(&mut self, changes: &[Change]) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        self.content().await?;
        let Some(text) = self.content.as_deref() else {
            return Err(MigrateError::FilesystemReadFailed {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "not UTF-8 text"),
            });
        };
        let rewritten = apply_changes(text, changes);
        FileManager::write_atomic(&self.path, rewritten.as_bytes().to_vec()).await?;
        self.content = Some(rewritten);

        Ok(())
    }
}
