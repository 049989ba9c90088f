//! In-memory doubles for the fetch and store capabilities.

use crate::error::{MigrateError, Result, StoreError};
use crate::source::{AssetSource, FetchedAsset};
use crate::store::AssetStore;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct Stored {
    body: Vec<u8>,
    content_type: Option<String>,
    declared: bool,
    chunk_size: usize,
}

/// Serves assets from a map keyed by URL
#[derive(Default)]
pub(crate) struct MemorySource {
    assets: HashMap<String, Stored>,
    fetches: AtomicUsize,
    chunks_read: Arc<AtomicUsize>,
}

impl MemorySource {
    pub(crate) fn with_asset(mut self, url: &str, body: &[u8], content_type: Option<&str>) -> Self {
        self.assets.insert(
            url.to_string(),
            Stored {
                body: body.to_vec(),
                content_type: content_type.map(str::to_string),
                declared: true,
                chunk_size: body.len().max(1),
            },
        );
        self
    }

    /// Asset served without Content-Length, in `chunk_size` pieces
    pub(crate) fn with_undeclared_asset(mut self, url: &str, body: &[u8], chunk_size: usize) -> Self {
        self.assets.insert(
            url.to_string(),
            Stored {
                body: body.to_vec(),
                content_type: None,
                declared: false,
                chunk_size: chunk_size.max(1),
            },
        );
        self
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn bodies_read(&self) -> usize {
        self.chunks_read.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetSource for MemorySource {
    async fn fetch(&self, url: &str) -> Result<FetchedAsset> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let stored = self.assets.get(url).cloned().ok_or_else(|| MigrateError::FetchFailed {
            url: url.to_string(),
            source: "404 Not Found".into(),
        })?;

        let chunks: Vec<std::io::Result<Bytes>> = stored
            .body
            .chunks(stored.chunk_size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        let counter = self.chunks_read.clone();
        let body = futures::stream::iter(chunks).inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        Ok(FetchedAsset {
            content_length: stored.declared.then_some(stored.body.len() as u64),
            content_type: stored.content_type,
            body: Box::pin(body),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Put {
    pub(crate) key: String,
    pub(crate) body: Vec<u8>,
    pub(crate) content_type: Option<String>,
}

/// Records uploads, or rejects every upload with a fixed status
#[derive(Default)]
pub(crate) struct MemoryStore {
    puts: Mutex<Vec<Put>>,
    reject_status: Option<u16>,
}

impl MemoryStore {
    pub(crate) fn failing(status: u16) -> Self {
        Self {
            puts: Mutex::new(Vec::new()),
            reject_status: Some(status),
        }
    }

    pub(crate) fn puts(&self) -> Vec<Put> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> std::result::Result<(), StoreError> {
        if let Some(status) = self.reject_status {
            return Err(StoreError::Rejected {
                status,
                message: format!("rejected {}", key),
            });
        }

        self.puts.lock().unwrap().push(Put {
            key: key.to_string(),
            body: body.to_vec(),
            content_type: content_type.map(str::to_string),
        });
        Ok(())
    }
}
