//! # Asset Mover Module
//!
//! Copia un singolo asset dal vecchio URL allo storage di destinazione.
//!
//! ## Flusso per ogni `Change`:
//! 1. Dry run: solo log, nessun I/O di rete
//! 2. Download dal vecchio URL (`AssetSource`)
//! 3. Rifiuto immediato se il Content-Length dichiarato supera `max_bytes`
//! 4. Lettura del body con limite rigido (anche senza Content-Length)
//! 5. Upload sotto `new_filename` con lo stesso content-type della sorgente
//!
//! La sorgente non viene mai modificata: la migrazione è additiva e si può
//! ripetere. Nessun retry automatico.

use crate::error::{MigrateError, Result};
use crate::planner::Change;
use crate::source::AssetSource;
use crate::store::AssetStore;
use bytes::BytesMut;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info};

/// Moves asset bytes from their old URL into the destination store
#[derive(Clone)]
pub struct AssetMover {
    source: Arc<dyn AssetSource>,
    store: Arc<dyn AssetStore>,
    max_bytes: u64,
}

impl AssetMover {
    pub fn new(source: Arc<dyn AssetSource>, store: Arc<dyn AssetStore>, max_bytes: u64) -> Self {
        Self {
            source,
            store,
            max_bytes,
        }
    }

    /// Transfer one asset, returning the number of bytes uploaded
    pub async fn migrate(&self, change: &Change, dry_run: bool) -> Result<u64> {
        if dry_run {
            info!(
                "dry-run enabled: skipping migration: {} -> {}",
                change.old_url, change.new_url
            );
            return Ok(0);
        }

        info!("processing migration {} -> {}", change.old_url, change.new_url);

        let mut asset = self.source.fetch(&change.old_url).await?;

        if let Some(declared) = asset.content_length {
            if declared > self.max_bytes {
                return Err(MigrateError::AssetTooLarge {
                    url: change.old_url.clone(),
                    declared: Some(declared),
                    limit: self.max_bytes,
                });
            }
        }

        let capacity = asset.content_length.unwrap_or(0).min(self.max_bytes) as usize;
        let mut body = BytesMut::with_capacity(capacity);
        while let Some(chunk) = asset.body.next().await {
            let chunk = chunk.map_err(|e| MigrateError::FetchFailed {
                url: change.old_url.clone(),
                source: Box::new(e),
            })?;

            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(MigrateError::AssetTooLarge {
                    url: change.old_url.clone(),
                    declared: None,
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        let size = body.len() as u64;
        debug!("Downloaded {} ({} bytes)", change.old_url, size);

        self.store
            .put(&change.new_filename, body.freeze(), asset.content_type.as_deref())
            .await
            .map_err(|source| MigrateError::UploadFailed {
                key: change.new_filename.clone(),
                source,
            })?;

        Ok(size)
    }
}
