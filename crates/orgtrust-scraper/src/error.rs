use thiserror::Error;

/// Typed failures of a website scrape.
///
/// Callers route on the variant: `Timeout` and `Unreachable` leave the stored
/// record untouched, `Blocked` is expected behaviour from bot-filtering sites
/// rather than a bug, and `Parse` means the page was fetched but yielded no
/// extractable content.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("{domain} unreachable: {reason}")]
    Unreachable { domain: String, reason: String },

    #[error("fetch of {domain} timed out")]
    Timeout { domain: String },

    #[error("{domain} blocked the request (HTTP {status})")]
    Blocked { domain: String, status: u16 },

    #[error("could not extract content from {domain}: {reason}")]
    Parse { domain: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
