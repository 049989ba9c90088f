//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche della migrazione.
//!
//! ## Componenti principali:
//! - `ProgressManager`: Progress bar con `indicatif` (nascosta in modalità JSON)
//! - `MigrationStats`: Statistiche cumulative della run
//!
//! ## Statistiche tracciate:
//! - **files_scanned**: File esaminati
//! - **files_changed**: File con almeno un asset da migrare
//! - **assets_migrated**: Asset copiati (o che sarebbero copiati in dry run)
//! - **bytes_transferred**: Byte caricati nello storage
//! - **errors**: File falliti
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================>---------------] 30/50 (60%) [OK] post.md: 3 asset(s)
//! ```

use crate::file_manager::FileManager;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for a migration run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    pub fn new(total_files: u64, hidden: bool) -> Self {
        if hidden {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total_files);
        // the template is a constant, fall back to the default style if it ever breaks
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Advance by one file with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics for a migration run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationStats {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub assets_migrated: usize,
    pub bytes_transferred: u64,
    pub errors: usize,
}

impl MigrationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unchanged(&mut self) {
        self.files_scanned += 1;
    }

    pub fn add_changed(&mut self, assets: usize, bytes: u64) {
        self.files_scanned += 1;
        self.files_changed += 1;
        self.assets_migrated += assets;
        self.bytes_transferred += bytes;
    }

    pub fn add_error(&mut self) {
        self.files_scanned += 1;
        self.errors += 1;
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Scanned: {} files | Changed: {} | Assets: {} | Errors: {} | Transferred: {}",
            self.files_scanned,
            self.files_changed,
            self.assets_migrated,
            self.errors,
            FileManager::format_size(self.bytes_transferred),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let mut stats = MigrationStats::new();
        stats.add_unchanged();
        stats.add_changed(2, 2048);
        stats.add_changed(1, 0);
        stats.add_error();

        assert_eq!(stats.files_scanned, 4);
        assert_eq!(stats.files_changed, 2);
        assert_eq!(stats.assets_migrated, 3);
        assert_eq!(stats.errors, 1);
        assert_eq!(
            stats.format_summary(),
            "Scanned: 4 files | Changed: 2 | Assets: 3 | Errors: 1 | Transferred: 2.00 KB"
        );
    }
}
