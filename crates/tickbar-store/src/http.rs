//! HTTP document store sink.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{BarDocument, BarSink, DEFAULT_COLLECTION, SinkError};

/// Configuration for [`HttpSink`].
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    /// Base URL of the store, without a trailing slash.
    pub base_url: String,
    /// Collection the bars are written to.
    pub collection: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Timeout for the start-up reachability probe.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpSinkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            user_agent: format!("tickbar/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Sink that posts each batch as a JSON array to a document store.
///
/// `ping` issues `GET {base}/health`; `insert_many` issues
/// `POST {base}/collections/{collection}/documents`.
#[derive(Debug)]
pub struct HttpSink {
    client: Client,
    config: HttpSinkConfig,
    closed: AtomicBool,
}

impl HttpSink {
    /// Creates a new HTTP sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(mut config: HttpSinkConfig) -> Result<Self, SinkError> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .pool_max_idle_per_host(1)
            .tcp_nodelay(true)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            client,
            config,
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the sink configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpSinkConfig {
        &self.config
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url)
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/collections/{}/documents",
            self.config.base_url, self.config.collection
        )
    }
}

#[async_trait]
impl BarSink for HttpSink {
    async fn ping(&self) -> Result<(), SinkError> {
        let url = self.health_url();
        let response = self
            .client
            .get(&url)
            .timeout(self.config.connect_timeout)
            .send()
            .await
            .map_err(|e| SinkError::Unreachable {
                target: url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SinkError::Unreachable {
                target: url,
                reason: format!("status {}", response.status()),
            });
        }
        Ok(())
    }

    async fn insert_many(&self, docs: &[BarDocument]) -> Result<usize, SinkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::Closed);
        }

        let response = self
            .client
            .post(self.documents_url())
            .json(docs)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), docs = docs.len(), "Document store refused batch");
            return Err(SinkError::Status {
                status: status.as_u16(),
            });
        }
        debug!(status = status.as_u16(), docs = docs.len(), "Posted documents");
        Ok(docs.len())
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("http:{}", self.documents_url())
    }
}
