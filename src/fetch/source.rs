use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::client::HttpClient;
use super::{BasicClient, fetch_text};
use crate::loader::LoadError;

/// Where raw CSV text comes from. The loader is written against this trait
/// so tests can feed it canned payloads without a network.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self) -> Result<String, LoadError>;

    /// Human-readable origin, used in log fields.
    fn origin(&self) -> &str;
}

/// HTTP-backed source for a fixed URL.
pub struct HttpSource<C = BasicClient> {
    client: C,
    url: String,
}

impl HttpSource<BasicClient> {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: BasicClient::new(),
            url: url.into(),
        }
    }
}

impl<C: HttpClient> HttpSource<C> {
    /// Wraps an existing client, e.g. one with extra middleware.
    pub fn with_client(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> DataSource for HttpSource<C> {
    async fn fetch(&self) -> Result<String, LoadError> {
        debug!(url = %self.url, "Fetching CSV over HTTP");
        fetch_text(&self.client, &self.url).await
    }

    fn origin(&self) -> &str {
        &self.url
    }
}

/// Local-file source, for snapshots already on disk.
pub struct FileSource {
    path: PathBuf,
    display: String,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let display = path.display().to_string();
        Self { path, display }
    }
}

#[async_trait]
impl DataSource for FileSource {
    async fn fetch(&self) -> Result<String, LoadError> {
        debug!(path = %self.display, "Reading CSV from file");
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| LoadError::Io {
                path: self.display.clone(),
                source,
            })
    }

    fn origin(&self) -> &str {
        &self.display
    }
}
