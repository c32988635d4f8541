//! Google News RSS client.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;

use orgtrust_core::NewsSignal;

use crate::error::NewsError;
use crate::feed::parse_feed;

const DEFAULT_BASE_URL: &str = "https://news.google.com";

/// At most this many signals are kept per collection; the trust engine caps
/// the news contribution anyway, and the record stores the list verbatim.
const MAX_SIGNALS: usize = 20;

/// Client for collecting recent news mentions of a business.
///
/// News is an optional signal: callers treat a collection failure as "keep
/// the record's previous signals", never as a failed job.
pub struct NewsClient {
    client: Client,
    base_url: String,
}

impl NewsClient {
    /// Creates a client pointed at the production news feed.
    ///
    /// # Errors
    ///
    /// Returns [`NewsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, NewsError> {
        Self::with_base_url(timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`NewsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(timeout_secs: u64, base_url: &str) -> Result<Self, NewsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("orgtrust/0.1 (business-verification)")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Collects up to 20 scored news mentions for `company_name`, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`NewsError::Http`] on network failure or non-2xx status, and
    /// [`NewsError::Xml`] on a malformed feed. Individual items with bad
    /// dates are skipped, not fatal.
    pub async fn collect(&self, company_name: &str) -> Result<Vec<NewsSignal>, NewsError> {
        let encoded = utf8_percent_encode(company_name, NON_ALPHANUMERIC).to_string();
        let url = format!(
            "{}/rss/search?q={encoded}&hl=en-US&gl=US&ceid=US:en",
            self.base_url
        );

        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let signals = parse_feed(&body, MAX_SIGNALS)?;
        tracing::debug!(
            company = company_name,
            count = signals.len(),
            "collected news signals"
        );
        Ok(signals)
    }
}
