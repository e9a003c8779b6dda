use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};

use super::{parse_snapshot, StorageAdapter};
use crate::errors::StorageError;
use crate::state::Snapshot;

/// Adapter talking to an HTTP API:
///
/// - `PUT    {base}/inventory/{key}` with the snapshot as JSON body
/// - `GET    {base}/inventory/{key}` → snapshot, or 404 when absent
/// - `DELETE {base}/inventory/{key}`
/// - `DELETE {base}/inventory` clears everything
///
/// The key is sent as a single percent-encoded path segment.
pub struct RemoteAdapter {
    base_url: String,
    client: Client,
}

impl RemoteAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Adapter whose requests fail once `timeout` elapses.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn item_url(&self, key: &str) -> Result<Url, StorageError> {
        self.endpoint(Some(key))
    }

    fn collection_url(&self) -> Result<Url, StorageError> {
        self.endpoint(None)
    }

    fn endpoint(&self, key: Option<&str>) -> Result<Url, StorageError> {
        let invalid = || StorageError::InvalidUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
            segments.pop_if_empty().push("inventory");
            if let Some(key) = key {
                segments.push(key);
            }
        }
        Ok(url)
    }
}

fn ensure_success(operation: &'static str, response: &Response) -> Result<(), StorageError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(StorageError::Remote {
            operation,
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl StorageAdapter for RemoteAdapter {
    async fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), StorageError> {
        let response = self
            .client
            .put(self.item_url(key)?)
            .json(snapshot)
            .send()
            .await?;
        ensure_success("save", &response)
    }

    async fn load(&self, key: &str) -> Result<Option<Snapshot>, StorageError> {
        let response = self.client.get(self.item_url(key)?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        ensure_success("load", &response)?;

        let body = response.text().await?;
        Ok(parse_snapshot(&body, &self.base_url))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let response = self.client.delete(self.item_url(key)?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success("remove", &response)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let response = self.client.delete(self.collection_url()?).send().await?;
        ensure_success("clear", &response)
    }
}
