//! # Blob Store Module
//!
//! Capability di scrittura degli asset nello storage di destinazione.
//!
//! ## Responsabilità:
//! - Trait `AssetStore`: "metti questi byte sotto questa chiave"
//! - `StorageCredentials`: account + chiave condivisa dalle variabili d'ambiente
//! - `BlobStore`: upload block blob (singola PUT) firmato con Shared Key
//! - `DisabledStore`: usato in dry run quando le credenziali non sono presenti
//!
//! ## Autenticazione:
//! La richiesta viene firmata con HMAC-SHA256 sulla stringa canonica
//! (verbo, header standard, header `x-ms-*` ordinati, risorsa canonica).
//! Credenziali mancanti o non decodificabili sono un errore fatale di avvio.

use crate::error::{MigrateError, Result, StoreError};
use crate::source::USER_AGENT;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const ACCOUNT_ENV: &str = "AZ_STORAGE_ACCOUNT";
pub const ACCESS_KEY_ENV: &str = "AZ_STORAGE_ACCESS_KEY";

const STORAGE_API_VERSION: &str = "2021-08-06";

/// Where migrated assets are written
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Durably store `body` under `key`, overwriting nothing else
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> std::result::Result<(), StoreError>;
}

/// Shared key credentials for the storage account
#[derive(Clone)]
pub struct StorageCredentials {
    account: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("account", &self.account)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl StorageCredentials {
    /// `access_key` is the base64 encoded account key
    pub fn new(account: &str, access_key: &str) -> Result<Self> {
        if account.trim().is_empty() {
            return Err(MigrateError::Credentials("storage account name is empty".to_string()));
        }

        let key = STANDARD
            .decode(access_key.trim())
            .map_err(|e| MigrateError::Credentials(format!("access key is not valid base64: {}", e)))?;
        if key.is_empty() {
            return Err(MigrateError::Credentials("access key is empty".to_string()));
        }

        Ok(Self {
            account: account.trim().to_string(),
            key,
        })
    }

    pub fn from_env() -> Result<Self> {
        let account = std::env::var(ACCOUNT_ENV)
            .map_err(|_| MigrateError::Credentials(format!("{} is not set", ACCOUNT_ENV)))?;
        let key = std::env::var(ACCESS_KEY_ENV)
            .map_err(|_| MigrateError::Credentials(format!("{} is not set", ACCESS_KEY_ENV)))?;
        Self::new(&account, &key)
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn sign(&self, string_to_sign: &str) -> Result<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .map_err(|e| MigrateError::Credentials(e.to_string()))?;
        mac.update(string_to_sign.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// Block blob container reached over HTTPS
#[derive(Clone)]
pub struct BlobStore {
    client: reqwest::Client,
    container: Url,
    credentials: StorageCredentials,
}

impl BlobStore {
    pub fn new(container_url: &str, credentials: StorageCredentials, timeout: Duration) -> Result<Self> {
        let container = Url::parse(container_url)
            .map_err(|e| MigrateError::Validation(format!("invalid storage URL '{}': {}", container_url, e)))?;
        if container.cannot_be_a_base() {
            return Err(MigrateError::Validation(format!(
                "storage URL cannot hold blobs: {}",
                container_url
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| MigrateError::Validation(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            container,
            credentials,
        })
    }

    /// URL of the blob stored under `key`
    pub fn blob_url(&self, key: &str) -> Url {
        let mut url = self.container.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(key);
        }
        url
    }

    fn authorization(
        &self,
        blob: &Url,
        content_length: usize,
        content_type: &str,
        date: &str,
    ) -> Result<String> {
        let string_to_sign = put_blob_string_to_sign(
            self.credentials.account(),
            blob.path(),
            content_length,
            content_type,
            date,
        );
        let signature = self.credentials.sign(&string_to_sign)?;
        Ok(format!("SharedKey {}:{}", self.credentials.account(), signature))
    }
}

/// Canonical string for a Put Blob request
fn put_blob_string_to_sign(
    account: &str,
    path: &str,
    content_length: usize,
    content_type: &str,
    date: &str,
) -> String {
    // an empty body is signed with an empty length
    let length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    format!(
        "PUT\n\n\n{length}\n\n{content_type}\n\n\n\n\n\n\n\
         x-ms-blob-type:BlockBlob\nx-ms-date:{date}\nx-ms-version:{STORAGE_API_VERSION}\n\
         /{account}{path}"
    )
}

#[async_trait]
impl AssetStore for BlobStore {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> std::result::Result<(), StoreError> {
        let blob = self.blob_url(key);
        let content_type = content_type.unwrap_or("");
        let date = chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        let authorization = self
            .authorization(&blob, body.len(), content_type, &date)
            .map_err(|e| StoreError::Rejected {
                status: 401,
                message: e.to_string(),
            })?;

        let mut request = self
            .client
            .put(blob.clone())
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-date", &date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header(reqwest::header::AUTHORIZATION, authorization);
        if !content_type.is_empty() {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Stored blob {}", blob);
        Ok(())
    }
}

/// Stand-in store for dry runs without credentials; refuses every upload
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStore;

#[async_trait]
impl AssetStore for DisabledStore {
    async fn put(
        &self,
        key: &str,
        _body: Bytes,
        _content_type: Option<&str>,
    ) -> std::result::Result<(), StoreError> {
        Err(StoreError::Rejected {
            status: 403,
            message: format!("uploads are disabled, refusing {}", key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> StorageCredentials {
        StorageCredentials::new("acct", &STANDARD.encode(b"secret-key")).unwrap()
    }

    #[test]
    fn test_credentials_validation() {
        assert!(credentials().account() == "acct");

        let err = StorageCredentials::new("", "c2VjcmV0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Credentials);

        let err = StorageCredentials::new("acct", "not base64!").unwrap_err();
        assert!(err.is_fatal());

        // key never shows up in debug output
        assert!(!format!("{:?}", credentials()).contains("secret"));
    }

    #[test]
    fn test_string_to_sign_layout() {
        let s = put_blob_string_to_sign(
            "acct",
            "/$web/abc.png",
            42,
            "image/png",
            "Mon, 19 Oct 2026 10:00:00 GMT",
        );
        assert_eq!(
            s,
            "PUT\n\n\n42\n\nimage/png\n\n\n\n\n\n\n\
             x-ms-blob-type:BlockBlob\n\
             x-ms-date:Mon, 19 Oct 2026 10:00:00 GMT\n\
             x-ms-version:2021-08-06\n\
             /acct/$web/abc.png"
        );

        let empty = put_blob_string_to_sign("acct", "/c/k", 0, "", "d");
        assert!(empty.starts_with("PUT\n\n\n\n\n\n"));
    }

    #[test]
    fn test_signature_is_stable_base64() {
        let creds = credentials();
        let a = creds.sign("payload").unwrap();
        assert_eq!(a, creds.sign("payload").unwrap());
        assert_ne!(a, creds.sign("other").unwrap());
        assert_eq!(STANDARD.decode(&a).unwrap().len(), 32);
    }

    #[test]
    fn test_blob_url_appends_key_to_container() {
        let store = BlobStore::new(
            "https://acct.blob.core.windows.net/$web",
            credentials(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            store.blob_url("id0.png").as_str(),
            "https://acct.blob.core.windows.net/$web/id0.png"
        );

        let store = BlobStore::new(
            "https://acct.blob.core.windows.net/$web/",
            credentials(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            store.blob_url("id0.png").as_str(),
            "https://acct.blob.core.windows.net/$web/id0.png"
        );
    }

    #[tokio::test]
    async fn test_put_sends_signed_block_blob() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/assets/id0.png"))
            .and(header("x-ms-blob-type", "BlockBlob"))
            .and(header("content-type", "image/png"))
            .and(header_exists("x-ms-date"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let store = BlobStore::new(
            &format!("{}/assets", server.uri()),
            credentials(),
            Duration::from_secs(5),
        )
        .unwrap();
        store
            .put("id0.png", Bytes::from_static(b"png-bytes"), Some("image/png"))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let auth = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
        assert!(auth.starts_with("SharedKey acct:"));
        assert_eq!(requests[0].body, b"png-bytes".to_vec());
    }

    #[tokio::test]
    async fn test_disabled_store_refuses() {
        let err = DisabledStore
            .put("id0.png", Bytes::from_static(b"x"), None)
            .await
            .unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_rejection_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("AuthenticationFailed"))
            .mount(&server)
            .await;

        let store = BlobStore::new(
            &format!("{}/assets", server.uri()),
            credentials(),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = store
            .put("id0.png", Bytes::from_static(b"x"), None)
            .await
            .unwrap_err();

        match &err {
            StoreError::Rejected { status, message } => {
                assert_eq!(*status, 403);
                assert_eq!(message, "AuthenticationFailed");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!err.is_transient());
    }
}
