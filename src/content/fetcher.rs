//! Upstream page content fetch.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::{ContentConfig, RetryConfig};
use crate::resilience::{retry_with_backoff, RetriesExhausted, RetryPolicy, Transient};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Exhausted(#[from] RetriesExhausted),
}

impl Transient for FetchError {
    fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Only the status counts. Bodies and reqwest messages echo the page id
    /// and URL, so they are never searched.
    fn is_transient(&self) -> bool {
        self.status_code() == Some(503)
    }
}

/// Fetches page JSON from `<base_url>/pages/<page_id>`, retrying while the
/// upstream reports itself unavailable.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    http: Client,
    base_url: Url,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(base_url: &str, timeout: Duration, policy: RetryPolicy) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            policy,
        })
    }

    /// `None` when no upstream is configured.
    pub fn from_config(content: &ContentConfig, retry: &RetryConfig) -> Result<Option<Self>, FetchError> {
        content
            .base_url
            .as_deref()
            .map(|base| {
                Self::new(
                    base,
                    Duration::from_secs(content.request_timeout_secs),
                    RetryPolicy::from_config(retry),
                )
            })
            .transpose()
    }

    pub fn page_url(&self, page_id: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("pages")
            .push(page_id);
        Ok(url)
    }

    async fn fetch_once(&self, url: &Url) -> Result<Value, FetchError> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    pub async fn fetch_page(&self, page_id: &str) -> Result<Value, FetchError> {
        let url = self.page_url(page_id)?;
        tracing::debug!(page_id, url = %url, "Fetching page content");
        retry_with_backoff(&self.policy, || self.fetch_once(&url)).await
    }
}
