//! United Kingdom — Companies House.
//!
//! `GET /company/{number}` with HTTP basic auth (API key as username, empty
//! password). The profile carries no employee count.

use chrono::NaiveDate;
use serde::Deserialize;

use orgtrust_core::{CompanyStatus, RegistryAddress, RegistryRecord};

#[derive(Debug, Deserialize)]
pub struct CompanyProfile {
    pub company_name: String,
    pub company_number: String,
    #[serde(default)]
    pub company_status: Option<String>,
    #[serde(default)]
    pub date_of_creation: Option<String>,
    #[serde(default)]
    pub registered_office_address: Option<OfficeAddress>,
    #[serde(default)]
    pub sic_codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct OfficeAddress {
    #[serde(default)]
    pub address_line_1: Option<String>,
    #[serde(default)]
    pub address_line_2: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Converts a Companies House profile into the canonical registry record.
#[must_use]
pub fn normalize(resp: &CompanyProfile) -> RegistryRecord {
    let status = resp
        .company_status
        .as_deref()
        .map_or(CompanyStatus::Unknown(String::new()), map_company_status);

    let address = resp.registered_office_address.as_ref().map(|a| {
        let street = match (&a.address_line_1, &a.address_line_2) {
            (Some(l1), Some(l2)) => Some(format!("{l1}, {l2}")),
            (Some(l1), None) => Some(l1.clone()),
            (None, Some(l2)) => Some(l2.clone()),
            (None, None) => None,
        };
        RegistryAddress {
            street,
            postal_code: a.postal_code.clone(),
            city: a.locality.clone(),
            country: a.country.clone(),
        }
    });

    RegistryRecord {
        org_number: resp.company_number.clone(),
        legal_name: resp.company_name.clone(),
        address,
        registration_date: resp
            .date_of_creation
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
        industry_codes: resp.sic_codes.clone(),
        employee_count: None,
        status,
    }
}

/// Maps Companies House status vocabulary onto [`CompanyStatus`].
///
/// Insolvency-adjacent statuses count as dissolved for verification purposes:
/// the entity no longer trades normally.
fn map_company_status(raw: &str) -> CompanyStatus {
    match raw.trim().to_lowercase().as_str() {
        "active" | "open" => CompanyStatus::Active,
        "dormant" | "closed" => CompanyStatus::Inactive,
        "dissolved" | "liquidation" | "receivership" | "administration"
        | "insolvency-proceedings" | "converted-closed" => CompanyStatus::Dissolved,
        _ => CompanyStatus::from_raw(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn active_profile() -> CompanyProfile {
        serde_json::from_value(json!({
            "company_name": "EXAMPLE SOFTWARE LTD",
            "company_number": "01234567",
            "company_status": "active",
            "date_of_creation": "2015-03-20",
            "registered_office_address": {
                "address_line_1": "1 Example Street",
                "postal_code": "EC1A 1AA",
                "locality": "London",
                "country": "England"
            },
            "sic_codes": ["62012"]
        }))
        .expect("fixture should deserialize")
    }

    #[test]
    fn normalizes_an_active_profile() {
        let record = normalize(&active_profile());
        assert_eq!(record.org_number, "01234567");
        assert_eq!(record.legal_name, "EXAMPLE SOFTWARE LTD");
        assert_eq!(record.status, CompanyStatus::Active);
        assert_eq!(record.industry_codes, vec!["62012".to_string()]);
        assert!(record.employee_count.is_none());
        assert_eq!(
            record.registration_date,
            Some(NaiveDate::from_ymd_opt(2015, 3, 20).unwrap())
        );
    }

    #[test]
    fn liquidation_maps_to_dissolved() {
        let mut resp = active_profile();
        resp.company_status = Some("liquidation".to_string());
        assert_eq!(normalize(&resp).status, CompanyStatus::Dissolved);
    }

    #[test]
    fn dormant_maps_to_inactive() {
        let mut resp = active_profile();
        resp.company_status = Some("dormant".to_string());
        assert_eq!(normalize(&resp).status, CompanyStatus::Inactive);
    }

    #[test]
    fn missing_status_is_unknown_and_not_active() {
        let mut resp = active_profile();
        resp.company_status = None;
        assert!(!normalize(&resp).status.is_active());
    }

    #[test]
    fn address_lines_join_into_street() {
        let mut resp = active_profile();
        resp.registered_office_address = Some(OfficeAddress {
            address_line_1: Some("Unit 4".to_string()),
            address_line_2: Some("Example Park".to_string()),
            postal_code: None,
            locality: None,
            country: None,
        });
        let record = normalize(&resp);
        assert_eq!(
            record.address.unwrap().street.as_deref(),
            Some("Unit 4, Example Park")
        );
    }
}
