use super::{map_reqwest_error, Fetcher};
use crate::error::FetchError;
use crate::model::RawContent;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct ContentRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ContentResponse {
    content: String,
    #[serde(default)]
    content_type: Option<String>,
}

/// Fetcher backed by a headless-browser rendering service, for pages that
/// only produce their recipe markup after JavaScript runs
pub struct ChromeFetcher {
    endpoint: String,
    client: Client,
    timeout: Duration,
}

impl ChromeFetcher {
    pub fn new(page_scriber_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let endpoint = format!(
            "{}/api/fetch-content",
            page_scriber_url.trim_end_matches('/')
        );
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint,
            client,
            timeout,
        })
    }
}

#[async_trait]
impl Fetcher for ChromeFetcher {
    fn name(&self) -> &str {
        "chrome"
    }

    async fn fetch(&self, url: &str) -> Result<RawContent, FetchError> {
        debug!("Fetching {} through page scriber {}", url, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ContentRequest { url })
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, self.timeout, e))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let content: ContentResponse = response
            .json()
            .await
            .map_err(|e| map_reqwest_error(url, self.timeout, e))?;

        let content_type = content
            .content_type
            .unwrap_or_else(|| "text/html".to_string());
        Ok(RawContent::new(url, content.content, content_type))
    }
}
