//! Per-platform scrapers.
//!
//! All three share one shape: validate the domain marker, extract the
//! platform identifier from the URL, fetch and parse the page, run the
//! platform's selector tables through [`crate::engine`], and degrade to
//! a fixed fallback product on any failure. Selector lists are
//! best-effort snapshots of each site's markup and are expected to rot
//! as the sites change; that fragility is inherent to the domain.

pub(crate) mod amazon;
pub(crate) mod temu;
pub(crate) mod walmart;

use crate::error::ExtractError;
use crate::types::Platform;

/// Defensive precondition: the routed URL must contain the platform's
/// domain marker. The dispatcher should prevent violations.
fn require_domain(url: &str, platform: Platform) -> Result<(), ExtractError> {
    if url.contains(platform.domain_marker()) {
        Ok(())
    } else {
        Err(ExtractError::InvalidPlatformUrl {
            url: url.to_owned(),
            platform,
        })
    }
}

/// Last non-empty path segment of a URL, query string excluded.
fn last_path_segment(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}
