//! HTTP fetch capability consumed by the platform scrapers.
//!
//! Scrapers depend on the [`Fetcher`] trait rather than a concrete HTTP
//! client, so tests can script responses without a network. The default
//! implementation, [`HttpFetcher`], wraps a shared [`reqwest::Client`]
//! and sends browser-like headers — product pages otherwise block
//! bot-like requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Browser user-agent sent with every request.
pub(crate) const BROWSER_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Page fetches get the full 10 seconds; the optional pre-check API call
/// (Temu) is bounded tighter so a blocked endpoint does not stall the
/// HTML fallback.
const HTML_TIMEOUT: Duration = Duration::from_secs(10);
const API_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from the fetch stage. Always caught inside a platform scraper
/// and converted into a degraded product; callers of the public API
/// never see these.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An HTTP GET capability accepting a referer and a bounded timeout.
///
/// One attempt per call; there is no retry policy. Persistent failures
/// are assumed to be page-structure or anti-bot mismatches that a retry
/// will not fix.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the body of an HTML page.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] on network failure or timeout and
    /// [`FetchError::Status`] on a non-2xx response.
    async fn fetch_html(&self, url: &str, referer: &str) -> Result<String, FetchError>;

    /// Performs a GET and parses the body as JSON.
    ///
    /// # Errors
    ///
    /// As [`Fetcher::fetch_html`], plus [`FetchError::Json`] when the
    /// body is not valid JSON.
    async fn fetch_json(&self, url: &str, referer: &str) -> Result<serde_json::Value, FetchError>;
}

/// Default [`Fetcher`] backed by [`reqwest`].
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates an `HttpFetcher` with the browser user-agent and a
    /// bounded connect timeout. Per-request timeouts are applied in the
    /// fetch methods (10s HTML, 5s JSON API).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(BROWSER_UA)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_html(&self, url: &str, referer: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(HTML_TIMEOUT)
            .header(reqwest::header::ACCEPT, HTML_ACCEPT)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(reqwest::header::REFERER, referer)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }

    async fn fetch_json(&self, url: &str, referer: &str) -> Result<serde_json::Value, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(API_TIMEOUT)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(reqwest::header::REFERER, referer)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
