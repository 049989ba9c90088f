//! # Asset Migrator Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione della run e validazione parametri
//! - `error`: Tassonomia degli errori e classificazione fatale/per-file
//! - `pattern`: Estrazione dei link agli asset tramite regex
//! - `planner`: Generazione delle `Change` (nuovo nome, nuovo URL)
//! - `source`: Download degli asset originali
//! - `store`: Upload nello storage di destinazione
//! - `mover`: Copia di un asset con limite di dimensione e dry run
//! - `rewriter`: Riscrittura dei link nei file di testo
//! - `file_manager`: Operazioni sul filesystem
//! - `migrator`: Orchestratore principale del processo
//! - `progress` / `json_output`: Reporting
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use asset_migrator::{Config, Migrator};
//!
//! # async fn example() -> Result<(), asset_migrator::MigrateError> {
//! let config = Config {
//!     destination_url: "https://cdn.example.com".to_string(),
//!     storage_url: "https://example.blob.core.windows.net/$web".to_string(),
//!     ..Default::default()
//! };
//! let summary = Migrator::new(config)?.run().await?;
//! println!("{}", summary.stats.format_summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod migrator;
pub mod mover;
pub mod pattern;
pub mod planner;
pub mod progress;
pub mod rewriter;
pub mod source;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{ErrorKind, MigrateError};
pub use migrator::{Migrator, RunSummary};
pub use planner::{Change, ChangeRequest};
