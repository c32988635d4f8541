//! Canonical domain types shared by every pipeline component.
//!
//! Registry responses, scraped website data, and news feeds all arrive as
//! loosely-shaped JSON from third parties. Each source is normalised into
//! these closed types exactly once, at its adapter boundary, so schema drift
//! surfaces there instead of somewhere downstream.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Verification state of a business record against its national registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed,
}

impl VerificationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Failed => "failed",
        }
    }

    /// Maps a registry company status onto a verification outcome.
    ///
    /// Any status semantically equivalent to "active" verifies the record;
    /// everything else — inactive, dissolved, or a shape the adapter did not
    /// recognise — fails it.
    #[must_use]
    pub fn from_company_status(status: &CompanyStatus) -> Self {
        if status.is_active() {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Failed
        }
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "verified" => Ok(VerificationStatus::Verified),
            "failed" => Ok(VerificationStatus::Failed),
            other => Err(format!("unknown verification status '{other}'")),
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration status of a company as reported by its jurisdiction.
///
/// Jurisdictions use different vocabularies ("active", "NORMAL", "registered",
/// …); adapters map them here so callers match on variants, never on raw
/// strings. Unrecognised values are preserved in `Unknown` for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CompanyStatus {
    Active,
    Inactive,
    Dissolved,
    Unknown(String),
}

impl CompanyStatus {
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, CompanyStatus::Active)
    }

    /// Normalises a raw registry status string.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "active" | "normal" | "registered" | "open" => CompanyStatus::Active,
            "inactive" | "dormant" | "ceased" => CompanyStatus::Inactive,
            "dissolved" | "liquidation" | "removed" | "deregistered" | "konkurs" => {
                CompanyStatus::Dissolved
            }
            _ => CompanyStatus::Unknown(raw.trim().to_string()),
        }
    }
}

impl From<String> for CompanyStatus {
    fn from(raw: String) -> Self {
        CompanyStatus::from_raw(&raw)
    }
}

impl From<CompanyStatus> for String {
    fn from(status: CompanyStatus) -> Self {
        match status {
            CompanyStatus::Active => "active".to_string(),
            CompanyStatus::Inactive => "inactive".to_string(),
            CompanyStatus::Dissolved => "dissolved".to_string(),
            CompanyStatus::Unknown(raw) => raw,
        }
    }
}

/// Postal address as normalised from a registry response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryAddress {
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// A jurisdiction-normalised business registry record.
///
/// This is the single shape all registry adapters produce, persisted verbatim
/// as the record's `registry_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub org_number: String,
    pub legal_name: String,
    pub address: Option<RegistryAddress>,
    pub registration_date: Option<NaiveDate>,
    pub industry_codes: Vec<String>,
    pub employee_count: Option<i32>,
    pub status: CompanyStatus,
}

/// One scored news mention of a business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSignal {
    pub headline: String,
    pub url: String,
    /// Lexicon sentiment in `[-1.0, 1.0]`.
    pub sentiment: f32,
    pub published_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_status_from_raw_maps_active_vocabulary() {
        assert_eq!(CompanyStatus::from_raw("active"), CompanyStatus::Active);
        assert_eq!(CompanyStatus::from_raw("NORMAL"), CompanyStatus::Active);
        assert_eq!(CompanyStatus::from_raw("Registered"), CompanyStatus::Active);
    }

    #[test]
    fn company_status_from_raw_maps_dissolved_vocabulary() {
        assert_eq!(
            CompanyStatus::from_raw("dissolved"),
            CompanyStatus::Dissolved
        );
        assert_eq!(CompanyStatus::from_raw("KONKURS"), CompanyStatus::Dissolved);
    }

    #[test]
    fn company_status_preserves_unknown_raw_value() {
        assert_eq!(
            CompanyStatus::from_raw(" pending-review "),
            CompanyStatus::Unknown("pending-review".to_string())
        );
    }

    #[test]
    fn company_status_round_trips_through_serde_as_string() {
        let json = serde_json::to_string(&CompanyStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
        let back: CompanyStatus = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert_eq!(back, CompanyStatus::Active);
    }

    #[test]
    fn verification_status_from_company_status() {
        assert_eq!(
            VerificationStatus::from_company_status(&CompanyStatus::Active),
            VerificationStatus::Verified
        );
        assert_eq!(
            VerificationStatus::from_company_status(&CompanyStatus::Dissolved),
            VerificationStatus::Failed
        );
        assert_eq!(
            VerificationStatus::from_company_status(&CompanyStatus::Unknown("?".into())),
            VerificationStatus::Failed
        );
    }

    #[test]
    fn verification_status_parses_from_db_string() {
        assert_eq!(
            "verified".parse::<VerificationStatus>().unwrap(),
            VerificationStatus::Verified
        );
        assert!("archived".parse::<VerificationStatus>().is_err());
    }
}
