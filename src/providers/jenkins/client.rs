use std::time::Duration;

use log::{debug, info};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{CrawlError, Result};

use super::types::{BuildDescription, ExecutionDescription, LogRecord};

/// Thin client over the Jenkins pipeline REST API (`wfapi`).
///
/// Every call is a single GET with no retry; the caller decides what a
/// failure means for the crawl.
pub struct JenkinsClient {
    client: Client,
}

impl JenkinsClient {
    /// Creates a client with the given user agent and optional per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(user_agent.to_owned());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| CrawlError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetches the top-level build description from `<build>/wfapi/describe`.
    pub async fn fetch_build(&self, url: &Url) -> Result<BuildDescription> {
        self.get_json(url).await
    }

    /// Fetches a stage's execution description from its self link.
    pub async fn fetch_execution(&self, url: &Url) -> Result<ExecutionDescription> {
        self.get_json(url).await
    }

    /// Fetches the console log of an execution or flow node.
    pub async fn fetch_log(&self, url: &Url) -> Result<LogRecord> {
        self.get_json(url).await
    }

    async fn get_json<T>(&self, url: &Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        info!("Crawling Jenkins API: {url}");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(CrawlError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        debug!("Received {} bytes from {url}", body.len());

        Ok(serde_json::from_str(&body)?)
    }
}
