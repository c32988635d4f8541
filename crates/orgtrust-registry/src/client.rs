//! HTTP client for national business registries.
//!
//! One client, one capability: verify an identifier against the official
//! registry for its jurisdiction and normalize the response. Dispatch is a
//! match on the upper-cased country code; each jurisdiction's response shape
//! lives in its [`crate::adapters`] module.

use std::time::Duration;

use reqwest::Client;

use orgtrust_core::RegistryRecord;

use crate::adapters;
use crate::error::RegistryError;
use crate::retry::retry_with_backoff;

const DEFAULT_NO_BASE_URL: &str = "https://data.brreg.no/enhetsregisteret/api";
const DEFAULT_DK_BASE_URL: &str = "https://cvrapi.dk";
const DEFAULT_GB_BASE_URL: &str = "https://api.company-information.service.gov.uk";

/// Base URLs per jurisdiction, overridable for tests.
#[derive(Debug, Clone)]
pub struct JurisdictionBaseUrls {
    pub no: String,
    pub dk: String,
    pub gb: String,
}

impl Default for JurisdictionBaseUrls {
    fn default() -> Self {
        Self {
            no: DEFAULT_NO_BASE_URL.to_string(),
            dk: DEFAULT_DK_BASE_URL.to_string(),
            gb: DEFAULT_GB_BASE_URL.to_string(),
        }
    }
}

/// Client for per-jurisdiction registry verification.
///
/// Use [`RegistryClient::new`] for production or
/// [`RegistryClient::with_base_urls`] to point individual jurisdictions at a
/// mock server in tests. Transient network failures and 5xx responses are
/// retried with jittered exponential back-off; 429 is surfaced as
/// [`RegistryError::RateLimited`] for the caller to re-enqueue.
pub struct RegistryClient {
    client: Client,
    base_urls: JurisdictionBaseUrls,
    companies_house_api_key: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl RegistryClient {
    /// Creates a client pointed at the production registries.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        companies_house_api_key: Option<String>,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, RegistryError> {
        Self::with_base_urls(
            timeout_secs,
            companies_house_api_key,
            max_retries,
            backoff_base_ms,
            JurisdictionBaseUrls::default(),
        )
    }

    /// Creates a client with custom base URLs (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_urls(
        timeout_secs: u64,
        companies_house_api_key: Option<String>,
        max_retries: u32,
        backoff_base_ms: u64,
        base_urls: JurisdictionBaseUrls,
    ) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("orgtrust/0.1 (business-verification)")
            .build()?;
        Ok(Self {
            client,
            base_urls,
            companies_house_api_key,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Verifies `(country_code, org_number)` against the official registry
    /// and returns the normalized record.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnsupportedJurisdiction`] for countries without an
    ///   adapter.
    /// - [`RegistryError::NotFound`] when the identifier has no match.
    /// - [`RegistryError::RateLimited`] on HTTP 429 (not retried here).
    /// - [`RegistryError::Http`] / [`RegistryError::UnexpectedStatus`] on
    ///   network failure after retries are exhausted.
    /// - [`RegistryError::Deserialize`] when the payload does not match the
    ///   jurisdiction's expected shape.
    pub async fn verify(
        &self,
        country_code: &str,
        org_number: &str,
    ) -> Result<RegistryRecord, RegistryError> {
        match country_code.to_uppercase().as_str() {
            "NO" => self.verify_no(org_number).await,
            "DK" => self.verify_dk(org_number).await,
            "GB" => self.verify_gb(org_number).await,
            other => Err(RegistryError::UnsupportedJurisdiction(other.to_string())),
        }
    }

    /// Lists businesses registered under an industry code, for discovery.
    ///
    /// Only jurisdictions whose registry exposes a public industry search are
    /// supported; currently that is NO (Brønnøysund `naeringskode` search).
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnsupportedJurisdiction`] for countries without a
    ///   discovery endpoint.
    /// - Otherwise as for [`RegistryClient::verify`].
    pub async fn discover(
        &self,
        country_code: &str,
        nace_code: &str,
        limit: usize,
    ) -> Result<Vec<RegistryRecord>, RegistryError> {
        match country_code.to_uppercase().as_str() {
            "NO" => self.discover_no(nace_code, limit).await,
            other => Err(RegistryError::UnsupportedJurisdiction(other.to_string())),
        }
    }

    async fn discover_no(
        &self,
        nace_code: &str,
        limit: usize,
    ) -> Result<Vec<RegistryRecord>, RegistryError> {
        let url = format!(
            "{}/enheter?naeringskode={nace_code}&size={limit}",
            self.base_urls.no.trim_end_matches('/')
        );
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let body = self.request_json("NO", nace_code, &url, None).await?;
                let page: adapters::no::EnhetSearchResponse = serde_json::from_value(body)
                    .map_err(|e| RegistryError::Deserialize {
                        context: format!("brreg enheter?naeringskode={nace_code}"),
                        source: e,
                    })?;
                Ok(page
                    .embedded
                    .map(|e| e.enheter.iter().map(adapters::no::normalize).collect())
                    .unwrap_or_default())
            }
        })
        .await
    }

    async fn verify_no(&self, org_number: &str) -> Result<RegistryRecord, RegistryError> {
        let url = format!(
            "{}/enheter/{org_number}",
            self.base_urls.no.trim_end_matches('/')
        );
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let body = self.request_json("NO", org_number, &url, None).await?;
                let entity: adapters::no::EnhetResponse = serde_json::from_value(body)
                    .map_err(|e| RegistryError::Deserialize {
                        context: format!("brreg enheter/{org_number}"),
                        source: e,
                    })?;
                Ok(adapters::no::normalize(&entity))
            }
        })
        .await
    }

    async fn verify_dk(&self, org_number: &str) -> Result<RegistryRecord, RegistryError> {
        let url = format!(
            "{}/api?search={org_number}&country=dk",
            self.base_urls.dk.trim_end_matches('/')
        );
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let body = self.request_json("DK", org_number, &url, None).await?;
                // cvrapi reports a miss as 200 + {"error": ...}.
                if body.get("error").is_some_and(|v| !v.is_null()) {
                    return Err(RegistryError::NotFound {
                        country: "DK".to_string(),
                        org_number: org_number.to_string(),
                    });
                }
                let company: adapters::dk::CvrResponse = serde_json::from_value(body)
                    .map_err(|e| RegistryError::Deserialize {
                        context: format!("cvrapi search={org_number}"),
                        source: e,
                    })?;
                Ok(adapters::dk::normalize(&company))
            }
        })
        .await
    }

    async fn verify_gb(&self, org_number: &str) -> Result<RegistryRecord, RegistryError> {
        let api_key = self
            .companies_house_api_key
            .as_deref()
            .ok_or(RegistryError::MissingCredentials("GB"))?
            .to_owned();
        let url = format!(
            "{}/company/{org_number}",
            self.base_urls.gb.trim_end_matches('/')
        );
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let api_key = api_key.clone();
            async move {
                let body = self
                    .request_json("GB", org_number, &url, Some(&api_key))
                    .await?;
                let profile: adapters::gb::CompanyProfile = serde_json::from_value(body)
                    .map_err(|e| RegistryError::Deserialize {
                        context: format!("companies house company/{org_number}"),
                        source: e,
                    })?;
                Ok(adapters::gb::normalize(&profile))
            }
        })
        .await
    }

    /// Sends a GET request, maps registry-meaningful statuses (404, 429) to
    /// typed errors, and parses the body as JSON.
    ///
    /// `basic_auth_user` enables HTTP basic auth with an empty password
    /// (Companies House convention).
    async fn request_json(
        &self,
        country: &str,
        org_number: &str,
        url: &str,
        basic_auth_user: Option<&str>,
    ) -> Result<serde_json::Value, RegistryError> {
        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(user) = basic_auth_user {
            request = request.basic_auth(user, Some(""));
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound {
                country: country.to_string(),
                org_number: org_number.to_string(),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(RegistryError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(RegistryError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| RegistryError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_jurisdiction_is_rejected_without_io() {
        let client = RegistryClient::new(15, None, 0, 0).expect("client should build");
        let err = client.verify("SE", "5560360793").await.unwrap_err();
        assert!(matches!(err, RegistryError::UnsupportedJurisdiction(ref c) if c == "SE"));
    }

    #[tokio::test]
    async fn gb_without_api_key_is_missing_credentials() {
        let client = RegistryClient::new(15, None, 0, 0).expect("client should build");
        let err = client.verify("gb", "01234567").await.unwrap_err();
        assert!(matches!(err, RegistryError::MissingCredentials("GB")));
    }
}
