//! Website fetch and scrape orchestration.
//!
//! The fetch policy is an explicit two-step strategy list: try `https`, and
//! on a TLS or connect failure make exactly one plaintext `http` attempt.
//! Success over plaintext is recorded as `ssl_valid = false`. Timeouts do not
//! fall through — the host answered, a slower retry over plaintext won't
//! help. Requests carry a browser-identifying header profile because sites
//! that block unlabeled bots are an expected failure mode, not a bug.

use reqwest::Client;
use std::time::Duration;

use crate::analyze::AiAnalyzer;
use crate::error::ScrapeError;
use crate::fingerprint::content_hash;
use crate::parse::extract_page;
use crate::types::WebsiteData;

/// Cap on how much of a response body is parsed.
const MAX_HTML_BYTES: usize = 512 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchScheme {
    Https,
    Http,
}

impl FetchScheme {
    fn url_for(self, host: &str) -> String {
        match self {
            FetchScheme::Https => format!("https://{host}/"),
            FetchScheme::Http => format!("http://{host}/"),
        }
    }
}

/// Evaluated in order; the plaintext fallback is the deliberate second step,
/// not a retry loop.
const FETCH_STRATEGIES: [FetchScheme; 2] = [FetchScheme::Https, FetchScheme::Http];

/// Scraper for business websites.
///
/// Produces a [`WebsiteData`] or a typed failure; performs no storage writes,
/// so it can be tested in isolation and callers own persistence.
pub struct WebsiteClient {
    client: Client,
    analyzer: AiAnalyzer,
}

impl WebsiteClient {
    /// Creates a client with the configured timeout and browser user agent.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        analyzer: AiAnalyzer,
    ) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client, analyzer })
    }

    /// Fetches and scrapes `domain`'s root page.
    ///
    /// `previous_hash` is the content fingerprint from the last scrape; when
    /// the page is unchanged the AI call is skipped and `quality` is `None`
    /// so the caller keeps its stored analysis.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Timeout`] — the fetch exceeded the configured deadline.
    /// - [`ScrapeError::Blocked`] — the site refused the request (403/429/503).
    /// - [`ScrapeError::Unreachable`] — both strategy steps failed, or the
    ///   site returned a non-2xx status outside the blocked set.
    /// - [`ScrapeError::Parse`] — the page yielded no extractable text at all.
    pub async fn scrape(
        &self,
        domain: &str,
        previous_hash: Option<&str>,
    ) -> Result<WebsiteData, ScrapeError> {
        let host = normalize_domain(domain);
        let (html, ssl_valid) = self.fetch(&host).await?;

        let extract = extract_page(&html);
        if extract.is_empty() {
            return Err(ScrapeError::Parse {
                domain: host,
                reason: "no extractable content".to_string(),
            });
        }

        let combined = extract.combined_text();
        let hash = content_hash(&combined);
        let unchanged = previous_hash == Some(hash.as_str());

        let quality = if unchanged {
            tracing::debug!(domain = %host, "content fingerprint unchanged — skipping AI analysis");
            None
        } else {
            Some(self.analyzer.analyze(&host, &combined).await)
        };

        let description = extract
            .description
            .clone()
            .or_else(|| extract.about_text.clone());

        Ok(WebsiteData {
            domain: host,
            description,
            products: extract.products,
            services: extract.services,
            contact_email: extract.contact_email,
            contact_phone: extract.contact_phone,
            ssl_valid,
            quality,
            content_hash: hash,
            unchanged,
        })
    }

    /// Walks [`FETCH_STRATEGIES`] in order and returns the first fetched body
    /// together with whether it came over TLS.
    async fn fetch(&self, host: &str) -> Result<(String, bool), ScrapeError> {
        let mut https_failure = String::new();

        for scheme in FETCH_STRATEGIES {
            let url = scheme.url_for(host);
            let result = self
                .client
                .get(&url)
                .header(
                    reqwest::header::ACCEPT,
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                )
                .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();

                    if matches!(status.as_u16(), 403 | 429 | 503) {
                        return Err(ScrapeError::Blocked {
                            domain: host.to_string(),
                            status: status.as_u16(),
                        });
                    }

                    if !status.is_success() {
                        return Err(ScrapeError::Unreachable {
                            domain: host.to_string(),
                            reason: format!("HTTP {status}"),
                        });
                    }

                    let body = response.text().await?;
                    let truncated = truncate_bytes(&body, MAX_HTML_BYTES);
                    return Ok((truncated, scheme == FetchScheme::Https));
                }
                Err(e) if e.is_timeout() => {
                    return Err(ScrapeError::Timeout {
                        domain: host.to_string(),
                    });
                }
                Err(e) if scheme == FetchScheme::Https => {
                    // TLS or connect failure: fall through to the single
                    // plaintext attempt.
                    https_failure = e.to_string();
                    tracing::debug!(
                        domain = %host,
                        error = %e,
                        "https fetch failed — attempting plaintext fallback"
                    );
                }
                Err(e) => {
                    return Err(ScrapeError::Unreachable {
                        domain: host.to_string(),
                        reason: if https_failure.is_empty() {
                            e.to_string()
                        } else {
                            format!("https: {https_failure}; http: {e}")
                        },
                    });
                }
            }
        }

        Err(ScrapeError::Unreachable {
            domain: host.to_string(),
            reason: https_failure,
        })
    }
}

/// Strips any scheme, path, and trailing slash so callers can pass either a
/// bare domain or a full URL.
#[must_use]
pub fn normalize_domain(raw: &str) -> String {
    let without_scheme = raw
        .trim()
        .strip_prefix("https://")
        .or_else(|| raw.trim().strip_prefix("http://"))
        .unwrap_or_else(|| raw.trim());
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .trim_end_matches('.')
        .to_lowercase()
}

fn truncate_bytes(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_domain_strips_scheme_and_path() {
        assert_eq!(
            normalize_domain("https://Example.NO/about/"),
            "example.no"
        );
        assert_eq!(normalize_domain("http://example.no"), "example.no");
        assert_eq!(normalize_domain("example.no"), "example.no");
    }

    #[test]
    fn normalize_domain_keeps_port() {
        assert_eq!(
            normalize_domain("http://127.0.0.1:8080/x"),
            "127.0.0.1:8080"
        );
    }

    #[test]
    fn truncate_bytes_respects_char_boundaries() {
        let body = "aé".repeat(10);
        let truncated = truncate_bytes(&body, 3);
        assert!(truncated.len() <= 3);
        assert!(body.starts_with(&truncated));
    }
}
