mod chrome;
mod request;

pub use chrome::ChromeFetcher;
pub use request::RequestFetcher;

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::model::RawContent;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// Fetches raw page content for a URL.
///
/// One attempt per call; retrying is the importer's job.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Short name used in logs (e.g., "request", "chrome")
    fn name(&self) -> &str;

    async fn fetch(&self, url: &str) -> Result<RawContent, FetchError>;
}

/// Build the fetcher selected by configuration.
///
/// A configured page-rendering service wins over plain HTTP.
pub fn build_fetcher(config: &FetcherConfig) -> Result<Arc<dyn Fetcher>, reqwest::Error> {
    match config.page_scriber_url.as_deref().map(str::trim) {
        Some(endpoint) if !endpoint.is_empty() => {
            info!("Using page scriber at {} for fetching", endpoint);
            Ok(Arc::new(ChromeFetcher::new(endpoint, config.timeout())?))
        }
        _ => Ok(Arc::new(RequestFetcher::new(config)?)),
    }
}

pub(crate) fn map_reqwest_error(url: &str, timeout: Duration, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            after: timeout,
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}
