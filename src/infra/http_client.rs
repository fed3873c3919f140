use crate::app::ports::{LinkChecker, LinkStatus};
use crate::config::LinksConfig;
use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Checks URLs over HTTP with a bounded timeout and a fixed number of retries.
pub struct ReqwestLinkChecker {
    client: reqwest::Client,
    retries: u32,
}

impl ReqwestLinkChecker {
    pub fn new(config: &LinksConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CatalogError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            retries: config.retries,
        })
    }

    async fn request_once(&self, url: &str) -> LinkStatus {
        let resp = match self.client.head(url).send().await {
            // Some forges refuse HEAD; fall back to GET before judging
            Ok(r) if r.status() == StatusCode::METHOD_NOT_ALLOWED
                || r.status() == StatusCode::NOT_IMPLEMENTED =>
            {
                self.client.get(url).send().await
            }
            other => other,
        };

        match resp {
            Ok(r) if r.status().is_success() || r.status().is_redirection() => {
                LinkStatus::Reachable
            }
            Ok(r) => LinkStatus::Unreachable(format!("HTTP {}", r.status().as_u16())),
            Err(e) if e.is_timeout() => LinkStatus::Unreachable("timed out".to_string()),
            Err(e) => LinkStatus::Unreachable(e.to_string()),
        }
    }
}

#[async_trait]
impl LinkChecker for ReqwestLinkChecker {
    async fn check(&self, url: &str) -> LinkStatus {
        let mut status = self.request_once(url).await;
        for attempt in 0..self.retries {
            if status == LinkStatus::Reachable {
                break;
            }
            debug!("Retrying {} (attempt {}) after: {:?}", url, attempt + 2, status);
            tokio::time::sleep(RETRY_BACKOFF).await;
            status = self.request_once(url).await;
        }
        status
    }
}
