//! Extraction dispatcher: routes a product URL to its platform scraper.

use std::sync::Arc;

use crate::error::ExtractError;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::platforms::{amazon, temu, walmart};
use crate::types::{Extraction, Platform, Product};

/// Routes product URLs to platform scrapers and owns the shared fetch
/// capability.
///
/// Temu is always available; Amazon and Walmart are gated behind the
/// `multiplatform` toggle (a subscription-tier distinction in the
/// surrounding product).
pub struct Extractor {
    fetcher: Arc<dyn Fetcher>,
    multiplatform: bool,
}

impl Extractor {
    /// Creates an extractor backed by the default [`HttpFetcher`].
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::ExtractionFailed`] if the HTTP client
    /// cannot be constructed.
    pub fn new(multiplatform: bool) -> Result<Self, ExtractError> {
        let fetcher = HttpFetcher::new().map_err(|err| ExtractError::ExtractionFailed {
            message: err.to_string(),
        })?;
        Ok(Self::with_fetcher(Arc::new(fetcher), multiplatform))
    }

    /// Creates an extractor with an injected fetch capability.
    #[must_use]
    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, multiplatform: bool) -> Self {
        Self {
            fetcher,
            multiplatform,
        }
    }

    /// Extracts a normalized [`Product`] from a product URL.
    ///
    /// Scraping failures degrade into a fallback `Product` carrying
    /// `metadata.extraction_error`; see [`Extractor::extract`] for the
    /// explicit outcome.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::InvalidUrl`] — the input cannot be parsed as a
    ///   URL (after `https://` scheme normalization).
    /// - [`ExtractError::UnsupportedPlatform`] — hostname matches no
    ///   supported platform. No fetch is performed.
    /// - [`ExtractError::MultiplatformDisabled`] — an Amazon/Walmart
    ///   URL while the toggle is off.
    pub async fn extract_product(&self, url: &str) -> Result<Product, ExtractError> {
        Ok(self.extract(url).await?.into_product())
    }

    /// As [`Extractor::extract_product`], but keeps the
    /// complete/degraded distinction explicit for callers that want to
    /// log or surface warnings.
    pub async fn extract(&self, url: &str) -> Result<Extraction, ExtractError> {
        let normalized = normalize_scheme(url);
        let platform = self.route(&normalized)?;
        tracing::debug!(url = %normalized, platform = %platform, "routing product extraction");

        let extraction = match platform {
            Platform::Temu => temu::scrape(self.fetcher.as_ref(), &normalized).await?,
            Platform::Amazon => amazon::scrape(self.fetcher.as_ref(), &normalized).await?,
            Platform::Walmart => walmart::scrape(self.fetcher.as_ref(), &normalized).await?,
        };

        if let Extraction::Degraded { reason, .. } = &extraction {
            tracing::warn!(url = %normalized, platform = %platform, reason, "extraction degraded to fallback product");
        }
        Ok(extraction)
    }

    /// Routing policy, evaluated in order against the hostname.
    fn route(&self, url: &str) -> Result<Platform, ExtractError> {
        let parsed = reqwest::Url::parse(url).map_err(|err| ExtractError::InvalidUrl {
            url: url.to_owned(),
            reason: err.to_string(),
        })?;
        let hostname = parsed
            .host_str()
            .ok_or_else(|| ExtractError::InvalidUrl {
                url: url.to_owned(),
                reason: "URL has no hostname".to_string(),
            })?;

        if hostname.contains(Platform::Temu.domain_marker()) {
            return Ok(Platform::Temu);
        }

        let gated = if hostname.contains(Platform::Amazon.domain_marker()) {
            Some(Platform::Amazon)
        } else if hostname.contains(Platform::Walmart.domain_marker()) {
            Some(Platform::Walmart)
        } else {
            None
        };

        match gated {
            Some(platform) if self.multiplatform => Ok(platform),
            Some(_) => Err(ExtractError::MultiplatformDisabled {
                url: url.to_owned(),
            }),
            None => Err(ExtractError::UnsupportedPlatform {
                url: url.to_owned(),
            }),
        }
    }
}

/// Prefixes `https://` when the input has no scheme.
fn normalize_scheme(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_scheme_prefixes_https() {
        assert_eq!(
            normalize_scheme("www.temu.com/item?goods_id=1"),
            "https://www.temu.com/item?goods_id=1"
        );
        assert_eq!(
            normalize_scheme("http://www.temu.com/item"),
            "http://www.temu.com/item"
        );
        assert_eq!(
            normalize_scheme("  https://www.amazon.com/dp/B000000000  "),
            "https://www.amazon.com/dp/B000000000"
        );
    }
}
