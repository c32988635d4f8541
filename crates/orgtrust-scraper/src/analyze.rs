//! AI quality analysis of extracted website text.
//!
//! Calls an OpenAI-compatible chat-completions endpoint in JSON mode. The
//! analyzer can never fail a scrape: every failure path — missing key, HTTP
//! error, unparseable response — resolves to
//! [`QualityAnalysis::unavailable`], which maintenance later detects and
//! requeues without re-scraping everything.

use std::time::Duration;

use serde_json::json;

use orgtrust_core::QualityAnalysis;

use crate::error::ScrapeError;

const MAX_ANALYSIS_CHARS: usize = 12_000;

/// Client for the quality-analysis model endpoint.
pub struct AiAnalyzer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl AiAnalyzer {
    /// Creates an analyzer. With `api_key = None` the analyzer is disabled
    /// and every call returns an unavailable analysis.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    /// Analyzes extracted website text into a summary and red flags.
    ///
    /// Never errors; failures resolve to [`QualityAnalysis::unavailable`].
    pub async fn analyze(&self, domain: &str, text: &str) -> QualityAnalysis {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!(domain, "AI analyzer disabled (no API key)");
            return QualityAnalysis::unavailable();
        };

        match self.request_analysis(api_key, text).await {
            Ok(qa) => qa,
            Err(e) => {
                tracing::warn!(domain, error = %e, "AI analysis failed — recording unavailable");
                QualityAnalysis::unavailable()
            }
        }
    }

    async fn request_analysis(
        &self,
        api_key: &str,
        text: &str,
    ) -> Result<QualityAnalysis, ScrapeError> {
        let excerpt: String = text.chars().take(MAX_ANALYSIS_CHARS).collect();
        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                {
                    "role": "system",
                    "content": "You assess business websites for legitimacy. Return JSON with \
                                keys: summary (one factual sentence about what the business \
                                does) and red_flags (array of short strings; empty if none). \
                                Flag thin content, placeholder text, stock-photo-only pages, \
                                and missing contact information."
                },
                {
                    "role": "user",
                    "content": format!("Website text:\n{excerpt}")
                }
            ]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let payload: serde_json::Value = response.json().await?;
        let content = payload
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ScrapeError::Parse {
                domain: self.base_url.clone(),
                reason: "completion response missing choices[0].message.content".to_string(),
            })?;

        let parsed: serde_json::Value =
            serde_json::from_str(content).map_err(|e| ScrapeError::Parse {
                domain: self.base_url.clone(),
                reason: format!("completion content is not JSON: {e}"),
            })?;

        let summary = parsed
            .get("summary")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ScrapeError::Parse {
                domain: self.base_url.clone(),
                reason: "analysis JSON missing summary".to_string(),
            })?;

        let red_flags = parsed
            .get("red_flags")
            .and_then(serde_json::Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(QualityAnalysis::complete(summary, red_flags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_analyzer_returns_unavailable() {
        let analyzer =
            AiAnalyzer::new("https://api.openai.com/v1", "gpt-4o-mini", None, 10).unwrap();
        let qa = analyzer.analyze("example.no", "some text").await;
        assert!(qa.is_unavailable());
    }
}
