use thiserror::Error;

/// Errors returned by the registry verification client.
///
/// Network failures and schema mismatches are distinct variants so callers
/// can decide retry-ability: a timeout may succeed later, a payload that does
/// not deserialize will not.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The identifier has no match in the jurisdiction's registry.
    #[error("no registry match for {org_number} in {country}")]
    NotFound { country: String, org_number: String },

    /// The registry asked us to back off (HTTP 429).
    #[error("rate limited by registry (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    /// Any other non-2xx HTTP status.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// No adapter exists for the requested country code.
    #[error("no registry adapter for jurisdiction '{0}'")]
    UnsupportedJurisdiction(String),

    /// The jurisdiction requires credentials that were not configured.
    #[error("missing credentials for jurisdiction '{0}'")]
    MissingCredentials(&'static str),
}
