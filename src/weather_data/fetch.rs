//! Access to the remote document store.
//!
//! The client never talks HTTP directly: it asks a [`RemoteStore`] for the bytes
//! behind a drive path. [`GraphDriveStore`] is the production implementation;
//! [`MemoryStore`] serves workbooks from memory for tests and offline use.

use crate::weather_data::error::FetchError;
use log::{info, warn};
use reqwest::{Client, StatusCode, Url};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Supplies the bearer token for drive requests.
pub trait AccessTokenProvider: Send + Sync {
    fn access_token(&self) -> Result<String, FetchError>;
}

/// A token obtained elsewhere and handed to the client as-is.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl AccessTokenProvider for StaticToken {
    fn access_token(&self) -> Result<String, FetchError> {
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on every request, so a refreshed
/// token is picked up without restarting the process.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl AccessTokenProvider for EnvToken {
    fn access_token(&self) -> Result<String, FetchError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(FetchError::MissingToken(format!(
                "environment variable {} is not set",
                self.var
            ))),
        }
    }
}

/// Fetches the raw bytes of a file by its drive path, e.g.
/// `"REGISTRO DIARIO/2024/MARZO/SENAMHI_DZ13_Datos_05_MARZO_2024.xlsx"`.
pub trait RemoteStore: Send + Sync {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Microsoft Graph drive access: `GET {base}/me/drive/root:/{path}:/content`.
pub struct GraphDriveStore<P> {
    client: Client,
    base_url: String,
    tokens: P,
}

impl<P: AccessTokenProvider> GraphDriveStore<P> {
    pub fn new(tokens: P) -> Self {
        Self::with_base_url(DEFAULT_GRAPH_BASE_URL, tokens)
    }

    pub fn with_base_url(base_url: impl Into<String>, tokens: P) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            tokens,
        }
    }

    /// Builds the content URL, percent-encoding every path segment.
    pub fn content_url(&self, path: &str) -> Result<Url, FetchError> {
        let invalid = || FetchError::InvalidUrl {
            path: path.to_string(),
        };
        let mut url = Url::parse(&format!("{}/", self.base_url.trim_end_matches('/')))
            .map_err(|_| invalid())?;

        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (file, folders) = parts.split_last().ok_or_else(invalid)?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
            segments.pop_if_empty();
            segments.extend(["me", "drive", "root:"]);
            segments.extend(folders);
            segments.push(&format!("{}:", file));
            segments.push("content");
        }
        Ok(url)
    }
}

impl<P: AccessTokenProvider> RemoteStore for GraphDriveStore<P> {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.content_url(path)?;
        let token = self.tokens.access_token()?;
        info!("Downloading {}", url);

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP error for {}: {}", url, status);
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;
        info!("Downloaded {} bytes for {}", bytes.len(), path);
        Ok(bytes.to_vec())
    }
}

/// In-memory store keyed by drive path. Unknown paths answer `404 Not Found`,
/// like the drive API does.
#[derive(Default)]
pub struct MemoryStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
    failures: RwLock<HashMap<String, StatusCode>>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.into(), bytes);
        }
    }

    /// Makes every fetch of `path` answer `status`, whether or not a file is stored there.
    pub fn fail_with(&self, path: impl Into<String>, status: StatusCode) {
        if let Ok(mut failures) = self.failures.write() {
            failures.insert(path.into(), status);
        }
    }

    /// Number of `fetch` calls served so far, successful or not.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl RemoteStore for MemoryStore {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        // Let concurrent callers interleave, as a real request would.
        tokio::task::yield_now().await;
        let failure = self
            .failures
            .read()
            .ok()
            .and_then(|failures| failures.get(path).copied());
        if let Some(status) = failure {
            return Err(FetchError::HttpStatus {
                url: format!("memory://{}", path),
                status,
            });
        }
        let found = self
            .files
            .read()
            .ok()
            .and_then(|files| files.get(path).cloned());
        found.ok_or_else(|| FetchError::HttpStatus {
            url: format!("memory://{}", path),
            status: StatusCode::NOT_FOUND,
        })
    }
}
