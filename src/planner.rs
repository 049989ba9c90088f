//! # Change Planning Module
//!
//! Decide se un asset va migrato e genera la sua nuova identità.
//!
//! ## Responsabilità:
//! - Skip degli URL che iniziano già con la base di destinazione (idempotenza)
//! - Generazione di un identificativo breve e casuale per ogni asset
//! - Deduplica per URL all'interno di un file: un asset, una `Change`
//!
//! ## Identificativi:
//! Gli identificativi non derivano mai dall'URL o dal contenuto. L'unicità è
//! probabilistica (72 bit casuali per default). Il generatore è un trait, così
//! i test possono usarne uno deterministico.

use crate::error::{MigrateError, Result};
use crate::pattern::AssetMatch;
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::collections::HashSet;
use std::sync::Arc;

/// Unresolved candidate change for one matched asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    pub old_url: String,
    pub new_base_url: String,
    pub extension: String,
}

/// Resolved old -> new mapping for one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub old_url: String,
    pub new_url: String,
    pub new_filename: String,
}

impl Change {
    /// Replace every occurrence of the old URL in `content`
    pub fn apply(&self, content: &str) -> String {
        content.replace(&self.old_url, &self.new_url)
    }
}

/// Source of fresh short identifiers
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Result<String>;
}

const ALPHABET: &[u8; 64] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_-";

/// Random identifiers drawn from the OS entropy source
#[derive(Debug, Clone)]
pub struct ShortIdGenerator {
    length: usize,
}

impl ShortIdGenerator {
    pub fn new(length: usize) -> Self {
        Self { length: length.max(1) }
    }
}

impl Default for ShortIdGenerator {
    fn default() -> Self {
        Self::new(12)
    }
}

impl IdGenerator for ShortIdGenerator {
    fn generate(&self) -> Result<String> {
        let mut buf = vec![0u8; self.length];
        let mut rng = OsRng;
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| MigrateError::IdentityGenerationFailed(e.to_string()))?;

        // 64 symbols, so masking keeps the distribution uniform
        Ok(buf
            .iter()
            .map(|b| ALPHABET[(b & 0x3f) as usize] as char)
            .collect())
    }
}

/// Turns pattern matches into changes against one destination base URL
#[derive(Clone)]
pub struct ChangePlanner {
    base_url: String,
    ids: Arc<dyn IdGenerator>,
}

impl ChangePlanner {
    pub fn new(base_url: &str, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ids,
        }
    }

    pub fn request(&self, old_url: &str, extension: &str) -> ChangeRequest {
        ChangeRequest {
            old_url: old_url.to_string(),
            new_base_url: self.base_url.clone(),
            extension: extension.to_string(),
        }
    }

    /// `Ok(None)` when the asset already lives under the destination base
    pub fn plan(&self, request: &ChangeRequest) -> Result<Option<Change>> {
        if request.old_url.starts_with(&request.new_base_url) {
            return Ok(None);
        }

        let id = self.ids.generate()?;
        let new_filename = format!("{}.{}", id, request.extension);
        let new_url = format!("{}/{}", request.new_base_url, new_filename);

        Ok(Some(Change {
            old_url: request.old_url.clone(),
            new_url,
            new_filename,
        }))
    }

    /// Plan every match of one file, keeping first-occurrence order.
    /// Repeated URLs yield a single change.
    pub fn plan_matches(&self, matches: &[AssetMatch]) -> Result<Vec<Change>> {
        let mut seen = HashSet::new();
        let mut changes = Vec::new();

        for m in matches {
            if !seen.insert(m.url.as_str()) {
                continue;
            }

            if let Some(change) = self.plan(&self.request(&m.url, &m.extension))? {
                changes.push(change);
            }
        }

        Ok(changes)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic ids: id0, id1, ...
    #[derive(Default)]
    pub(crate) struct SequentialIds {
        next: AtomicUsize,
    }

    impl IdGenerator for SequentialIds {
        fn generate(&self) -> Result<String> {
            Ok(format!("id{}", self.next.fetch_add(1, Ordering::SeqCst)))
        }
    }

    pub(crate) struct ExhaustedIds;

    impl IdGenerator for ExhaustedIds {
        fn generate(&self) -> Result<String> {
            Err(MigrateError::IdentityGenerationFailed("entropy exhausted".to_string()))
        }
    }

    fn asset(url: &str, extension: &str) -> AssetMatch {
        AssetMatch {
            full: format!("{})", url),
            url: url.to_string(),
            extension: extension.to_string(),
        }
    }

    #[test]
    fn test_plan_builds_url_from_base_and_filename() {
        let planner = ChangePlanner::new("https://cdn.example.com/", Arc::new(SequentialIds::default()));
        let change = planner
            .plan(&planner.request("http://old/a.png", "png"))
            .unwrap()
            .unwrap();

        assert_eq!(change.old_url, "http://old/a.png");
        assert_eq!(change.new_filename, "id0.png");
        assert_eq!(change.new_url, "https://cdn.example.com/id0.png");
    }

    #[test]
    fn test_already_migrated_url_is_skipped() {
        let planner = ChangePlanner::new("https://cdn.example.com", Arc::new(ExhaustedIds));
        let request = planner.request("https://cdn.example.com/xyz.png", "png");
        // generator is never consulted for skipped urls
        assert_eq!(planner.plan(&request).unwrap(), None);
    }

    #[test]
    fn test_duplicate_urls_share_one_change() {
        let planner = ChangePlanner::new("https://cdn.example.com", Arc::new(SequentialIds::default()));
        let matches = vec![
            asset("http://old/a.png", "png"),
            asset("http://old/b.jpg", "jpg"),
            asset("http://old/a.png", "png"),
        ];

        let changes = planner.plan_matches(&matches).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].old_url, "http://old/a.png");
        assert_eq!(changes[0].new_filename, "id0.png");
        assert_eq!(changes[1].old_url, "http://old/b.jpg");
        assert_eq!(changes[1].new_filename, "id1.jpg");
    }

    #[test]
    fn test_identity_failure_propagates() {
        let planner = ChangePlanner::new("https://cdn.example.com", Arc::new(ExhaustedIds));
        let err = planner
            .plan_matches(&[asset("http://old/a.png", "png")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IdentityGenerationFailed);
    }

    #[test]
    fn test_short_ids_are_distinct_and_url_safe() {
        let ids = ShortIdGenerator::default();
        let a = ids.generate().unwrap();
        let b = ids.generate().unwrap();

        assert_eq!(a.len(), 12);
        assert_ne!(a, b);
        assert!(a.bytes().all(|c| ALPHABET.contains(&c)));
    }

    #[test]
    fn test_change_apply_replaces_every_occurrence() {
        let change = Change {
            old_url: "http://old/a.png".to_string(),
            new_url: "http://new/XYZ.png".to_string(),
            new_filename: "XYZ.png".to_string(),
        };
        assert_eq!(
            change.apply("see <http://old/a.png> and <http://old/a.png>"),
            "see <http://new/XYZ.png> and <http://new/XYZ.png>"
        );
    }
}
