//! # Asset Source Module
//!
//! Capability di download degli asset originali.
//!
//! Il trait `AssetSource` restituisce header e body in streaming senza leggere
//! il contenuto: il controllo sulla dimensione spetta all'`AssetMover`.
//! `HttpSource` è l'implementazione di produzione basata su `reqwest`.

use crate::error::{MigrateError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;

/// User-Agent for outgoing requests
pub const USER_AGENT: &str = concat!("asset-migrator/", env!("CARGO_PKG_VERSION"));

/// Streaming response body
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// A fetched asset whose body has not been read yet
pub struct FetchedAsset {
    /// Declared Content-Length, if any
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub body: ByteStream,
}

impl std::fmt::Debug for FetchedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedAsset")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Where original assets are downloaded from
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedAsset>;
}

/// Production source over HTTP(S)
#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| MigrateError::Validation(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl AssetSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<FetchedAsset> {
        let fetch_failed = |e: reqwest::Error| MigrateError::FetchFailed {
            url: url.to_string(),
            source: Box::new(e),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_failed)?;

        let headers = response.headers();
        let content_length = headers
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other));

        Ok(FetchedAsset {
            content_length,
            content_type,
            body: Box::pin(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn collect(mut body: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = body.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_fetch_reports_headers_and_streams_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/a.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![7u8; 64]),
            )
            .mount(&server)
            .await;

        let source = HttpSource::new(Duration::from_secs(5)).unwrap();
        let asset = source
            .fetch(&format!("{}/img/a.png", server.uri()))
            .await
            .unwrap();

        assert_eq!(asset.content_length, Some(64));
        assert_eq!(asset.content_type.as_deref(), Some("image/png"));
        assert_eq!(collect(asset.body).await, vec![7u8; 64]);
    }

    #[tokio::test]
    async fn test_error_status_is_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpSource::new(Duration::from_secs(5)).unwrap();
        let err = source
            .fetch(&format!("{}/missing.png", server.uri()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FetchFailed);
    }
}
