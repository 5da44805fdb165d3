//! Proxy to the fine-tuning service

use bytes::Bytes;
use reqwest::{Client, Method};
use std::time::Duration;
use url::Url;

use docchat_core::{Error, Result};

/// Status and body returned by the fine-tuning service, passed through as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxiedReply {
    pub status: u16,
    pub body: Bytes,
}

/// Forwards training requests to the fine-tuning service
#[derive(Clone)]
pub struct TrainingProxy {
    client: Client,
    base_url: Url,
}

impl TrainingProxy {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            Error::InvalidConfiguration(format!("invalid training service URL '{base_url}': {e}"))
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Start a training run
    pub async fn start(&self) -> Result<ProxiedReply> {
        self.forward(Method::POST, "/api/train/start").await
    }

    /// Progress of the current training run
    pub async fn status(&self) -> Result<ProxiedReply> {
        self.forward(Method::GET, "/api/train/status").await
    }

    async fn forward(&self, method: Method, path: &str) -> Result<ProxiedReply> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::InvalidConfiguration(format!("training URL: {e}")))?;

        tracing::debug!(%method, %url, "forwarding to training service");
        let response = self
            .client
            .request(method, url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| transport_error(&url, e))?;
        if status >= 400 {
            tracing::warn!(%url, status, "training service returned an error status");
        }

        Ok(ProxiedReply { status, body })
    }
}

fn transport_error(url: &Url, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(format!("training service at {url} did not answer in time"))
    } else {
        Error::Upstream(format!("training service at {url}: {err}"))
    }
}
