use super::{map_reqwest_error, Fetcher};
use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::model::RawContent;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

/// Plain HTTP fetcher
pub struct RequestFetcher {
    client: Client,
    timeout: Duration,
}

impl RequestFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Fetcher for RequestFetcher {
    fn name(&self) -> &str {
        "request"
    }

    async fn fetch(&self, url: &str) -> Result<RawContent, FetchError> {
        debug!("Fetching {} over HTTP", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(url, self.timeout, e))?;

        debug!("Fetched {} bytes ({}) from {}", body.len(), content_type, url);
        Ok(RawContent::new(url, body, content_type))
    }
}
