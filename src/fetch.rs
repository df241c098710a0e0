use scraper::Html;
use thiserror::Error;
use tracing::debug;

use crate::config::SiteConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("Request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0} returned an empty document")]
    EmptyDocument(String),
    #[error("Invalid selector `{0}`")]
    Selector(String),
}

/// A fetched page.
///
/// The document tree is materialized lazily on the consuming task:
/// `scraper`'s DOM is not `Send`, so callers parse, select, and drop the
/// tree before suspending again rather than carrying it across awaits.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    body: String,
}

impl Page {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Page {
            url: url.into(),
            body: body.into(),
        }
    }

    /// Parse the body into a document tree.
    ///
    /// The HTML5 parser is error-tolerant, so the failure boundary here is a
    /// body with nothing in it at all.
    pub fn document(&self) -> Result<Html, ParseError> {
        if self.body.trim().is_empty() {
            return Err(ParseError::EmptyDocument(self.url.clone()));
        }
        Ok(Html::parse_document(&self.body))
    }
}

/// HTTP page fetcher.
///
/// One attempt per call, no retries: retry policy, if any, belongs to the
/// caller.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(config: &SiteConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("metadeck/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;

        Ok(PageFetcher { client })
    }

    /// Fetch one page. Non-2xx responses are errors.
    pub async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        Ok(Page::new(url, body))
    }
}
