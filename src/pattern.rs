//! # Pattern Matching Module
//!
//! Estrae i riferimenti ad asset dal testo tramite una regex fornita dall'utente.
//!
//! ## Contratto del pattern:
//! - Gruppo 0: riferimento completo, incluso il carattere di confine finale
//! - Gruppo 1: URL dell'asset
//! - Gruppo 2: estensione dell'asset
//!
//! Un pattern con meno di due gruppi di cattura è un errore di configurazione:
//! viene rifiutato in fase di compilazione, prima di qualunque I/O.

use crate::error::{MigrateError, Result};
use regex::Regex;

/// One raw match of the asset pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMatch {
    /// Full match including the trailing boundary character
    pub full: String,
    pub url: String,
    pub extension: String,
}

/// Compiled asset pattern
#[derive(Debug, Clone)]
pub struct AssetPattern {
    regex: Regex,
}

impl AssetPattern {
    /// Compile and check the capture group contract
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            MigrateError::InvalidPatternConfiguration(format!("failed to compile pattern: {}", e))
        })?;

        // captures_len counts the implicit full-match group
        if regex.captures_len() < 3 {
            return Err(MigrateError::InvalidPatternConfiguration(format!(
                "expected [0:full match, 1:url, 2:extension], pattern has {} group(s)",
                regex.captures_len() - 1
            )));
        }

        Ok(Self { regex })
    }

    /// All non-overlapping matches, first to last
    pub fn find_matches(&self, text: &str) -> Result<Vec<AssetMatch>> {
        let mut matches = Vec::new();

        for caps in self.regex.captures_iter(text) {
            if caps.len() < 3 {
                return Err(MigrateError::InvalidPatternConfiguration(
                    "expected [0:full match, 1:url, 2:extension]".to_string(),
                ));
            }

            let (Some(url), Some(extension)) = (caps.get(1), caps.get(2)) else {
                tracing::debug!("Ignoring match without url or extension: {}", &caps[0]);
                continue;
            };

            if url.as_str().is_empty() || extension.as_str().is_empty() {
                tracing::debug!("Ignoring match with empty url or extension: {}", &caps[0]);
                continue;
            }

            matches.push(AssetMatch {
                full: caps[0].to_string(),
                url: url.as_str().to_string(),
                extension: extension.as_str().to_string(),
            });
        }

        Ok(matches)
    }
}
