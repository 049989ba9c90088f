//! # Migrator Module
//!
//! Separa le responsabilità dell'orchestrazione in sottomoduli:
//! - `orchestrator`: Discovery dei file, worker pool, policy di errore, report
//! - `file_task`: Pipeline sequenziale di un singolo file (match → migrate → rewrite)

pub mod file_task;
pub mod orchestrator;

pub use file_task::{FileReport, FileTask};
pub use orchestrator::{FileFailure, Migrator, RunSummary};
