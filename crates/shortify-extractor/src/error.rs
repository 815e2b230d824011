use thiserror::Error;

use crate::types::Platform;

/// Errors surfaced by [`crate::Extractor`].
///
/// These cover input and precondition failures only. Scraping failures
/// (network errors, timeouts, missing fields, unparseable markup) never
/// appear here — scrapers convert them into a degraded
/// [`crate::Product`] instead.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The input could not be parsed as a URL at all.
    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The URL's hostname matches none of the supported platforms.
    #[error(
        "unsupported platform for \"{url}\": currently supporting Temu, \
         Amazon, and Walmart product URLs"
    )]
    UnsupportedPlatform { url: String },

    /// The URL belongs to a gated platform but multi-platform extraction
    /// is disabled for this extractor.
    #[error(
        "multi-platform product extraction is disabled for \"{url}\": \
         currently only supporting Temu product URLs"
    )]
    MultiplatformDisabled { url: String },

    /// Defensive scraper precondition: the routed URL does not contain
    /// the platform's domain marker. The dispatcher should prevent this.
    #[error("URL \"{url}\" is not a {platform} product URL")]
    InvalidPlatformUrl { url: String, platform: Platform },

    /// An unexpected internal failure, wrapped with context. The one
    /// path where extraction itself can fail rather than degrade.
    #[error("product extraction failed: {message}")]
    ExtractionFailed { message: String },
}
