//! # Migration Orchestrator
//!
//! Orchestratore principale: coordina discovery, worker pool e report finale.
//!
//! ## Flusso di esecuzione:
//! 1. **Inizializzazione**: Validazione config, compilazione pattern, credenziali
//! 2. **File discovery**: Elenco non ricorsivo dei file nella directory
//! 3. **Parallel processing**: Un task per file, al massimo `workers` alla volta
//! 4. **Reporting**: Conteggi per file, statistiche finali, marker "done"
//!
//! ## Gestione errori:
//! - Errori di configurazione (pattern, credenziali) interrompono sempre la run
//! - Con `fail_fast` nessun nuovo file viene avviato dopo il primo errore
//! - Altrimenti gli errori vengono raccolti in `RunSummary::failures`
//!
//! La run si può ripetere in sicurezza: i link che puntano già alla
//! destinazione vengono ignorati.

use crate::{
    config::Config,
    error::{MigrateError, Result},
    file_manager::FileManager,
    json_output::{JsonConfig, JsonMessage},
    migrator::file_task::{FileReport, FileTask},
    mover::AssetMover,
    pattern::AssetPattern,
    planner::{ChangePlanner, IdGenerator, ShortIdGenerator},
    progress::{MigrationStats, ProgressManager},
    source::{AssetSource, HttpSource},
    store::{AssetStore, BlobStore, DisabledStore, StorageCredentials},
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// A file whose pipeline failed
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: MigrateError,
}

/// Result of a completed run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub stats: MigrationStats,
    pub reports: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total_changes(&self) -> usize {
        self.reports.iter().map(|r| r.changes.len()).sum()
    }
}

/// Orchestratore principale
pub struct Migrator {
    config: Config,
    task: FileTask,
}

impl Migrator {
    /// Production wiring: HTTP source, blob store with credentials from the environment
    pub fn new(config: Config) -> Result<Self> {
        let pattern = Self::prepare(&config)?;
        let source = Arc::new(HttpSource::new(config.http_timeout())?);

        let store: Arc<dyn AssetStore> = match StorageCredentials::from_env() {
            Ok(credentials) => Arc::new(BlobStore::new(
                &config.storage_url,
                credentials,
                config.http_timeout(),
            )?),
            Err(e) if config.dry_run => {
                warn!("No storage credentials ({}), uploads disabled for dry run", e);
                Arc::new(DisabledStore)
            }
            Err(e) => return Err(e),
        };

        Ok(Self::assemble(
            config,
            pattern,
            source,
            store,
            Arc::new(ShortIdGenerator::default()),
        ))
    }

    /// Build a migrator over explicit capabilities
    pub fn with_capabilities(
        config: Config,
        source: Arc<dyn AssetSource>,
        store: Arc<dyn AssetStore>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self> {
        let pattern = Self::prepare(&config)?;
        Ok(Self::assemble(config, pattern, source, store, ids))
    }

    /// Pattern first, then the rest of the configuration, then the directory
    fn prepare(config: &Config) -> Result<AssetPattern> {
        let pattern = AssetPattern::new(&config.pattern)?;

        config
            .validate()
            .map_err(|e| MigrateError::Validation(e.to_string()))?;

        if !config.directory.is_dir() {
            return Err(MigrateError::Validation(format!(
                "Directory does not exist: {}",
                config.directory.display()
            )));
        }

        Ok(pattern)
    }

    fn assemble(
        config: Config,
        pattern: AssetPattern,
        source: Arc<dyn AssetSource>,
        store: Arc<dyn AssetStore>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let task = FileTask {
            pattern: Arc::new(pattern),
            planner: ChangePlanner::new(config.destination_base(), ids),
            mover: AssetMover::new(source, store, config.max_bytes),
            dry_run: config.dry_run,
        };

        Self { config, task }
    }

    /// Esegue la migrazione su tutta la directory
    pub async fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let files = FileManager::find_files(&self.config.directory)?;

        self.emit_start_message(&files);

        let progress = ProgressManager::new(files.len() as u64, self.config.json_output);
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let halted = Arc::new(AtomicBool::new(false));
        let mut tasks = Vec::new();

        for path in files {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            if halted.load(Ordering::SeqCst) {
                warn!("Stopping early, {} not processed", path.display());
                break;
            }

            let task = self.task.clone();
            let halted = halted.clone();
            let progress = progress.clone();
            let fail_fast = self.config.fail_fast;

            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                let result = task.process_file(path.clone()).await;

                let name = path.file_name().unwrap_or_default().to_string_lossy().to_string();
                let message = match &result {
                    Ok(report) if report.changes.is_empty() => format!("[SKIP] {}: nothing to migrate", name),
                    Ok(report) => format!("[OK] {}: {} asset(s)", name, report.changes.len()),
                    Err(e) => {
                        if fail_fast || e.is_fatal() {
                            halted.store(true, Ordering::SeqCst);
                        }
                        format!("[ERROR] {}: error", name)
                    }
                };
                progress.update(&message);

                (path, result)
            }));
        }

        let mut summary = RunSummary::default();
        for task in tasks {
            let (path, result) = task.await.map_err(|e| MigrateError::Validation(format!(
                "file worker panicked: {}",
                e
            )))?;
            self.record(&mut summary, path, result);
        }

        progress.finish(&summary.stats.format_summary());
        self.emit_final_stats(&summary.stats, start_time.elapsed().as_secs_f64());

        if let Some(index) = summary.failures.iter().position(|f| f.error.is_fatal()) {
            return Err(summary.failures.swap_remove(index).error);
        }
        if self.config.fail_fast && !summary.failures.is_empty() {
            return Err(summary.failures.swap_remove(0).error);
        }

        Ok(summary)
    }

    fn record(&self, summary: &mut RunSummary, path: PathBuf, result: Result<FileReport>) {
        match result {
            Ok(report) => {
                if report.changes.is_empty() {
                    summary.stats.add_unchanged();
                } else {
                    summary
                        .stats
                        .add_changed(report.changes.len(), report.bytes_transferred);
                }

                if self.config.json_output {
                    JsonMessage::file_complete(
                        report.path.clone(),
                        &report.changes,
                        report.bytes_transferred,
                        None,
                    )
                    .emit();
                }
                summary.reports.push(report);
            }
            Err(error) => {
                summary.stats.add_error();
                error!("Failed to migrate {}: {}", path.display(), error_chain(&error));

                if self.config.json_output {
                    JsonMessage::file_complete(path.clone(), &[], 0, Some(error_chain(&error))).emit();
                }
                summary.failures.push(FileFailure { path, error });
            }
        }
    }

    fn emit_start_message(&self, files: &[PathBuf]) {
        if self.config.json_output {
            JsonMessage::start(
                self.config.directory.clone(),
                files.len(),
                JsonConfig::from(&self.config),
            )
            .emit();
            return;
        }

        info!("Starting asset migration in: {}", self.config.directory.display());
        info!("Destination: {}", self.config.destination_base());
        info!(
            "Max asset size: {}",
            FileManager::format_size(self.config.max_bytes)
        );
        if self.config.dry_run {
            info!("Dry run mode: no uploads, no file changes");
        }
        info!("Found {} file(s) to scan", files.len());
    }

    fn emit_final_stats(&self, stats: &MigrationStats, duration_seconds: f64) {
        if self.config.json_output {
            JsonMessage::complete(stats, duration_seconds).emit();
            return;
        }

        info!("{}", stats.format_summary());
        info!("done");
    }
}

/// Error message with its causes, outermost first
fn error_chain(error: &MigrateError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
