//! Denmark — CVR via the public cvrapi.dk mirror.
//!
//! `GET /api?search={cvr}&country=dk`. Unauthenticated. The API reports a
//! miss either as HTTP 404 or as a 200 with an `error` field, so both paths
//! are handled by the caller.

use chrono::NaiveDate;
use serde::Deserialize;

use orgtrust_core::{CompanyStatus, RegistryAddress, RegistryRecord};

#[derive(Debug, Deserialize)]
pub struct CvrResponse {
    pub vat: i64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// `DD/MM - YYYY`, e.g. `01/06 - 2010`.
    #[serde(default)]
    pub startdate: Option<String>,
    #[serde(default)]
    pub enddate: Option<String>,
    /// Either an exact count or a banding string such as `"5-9"`.
    #[serde(default)]
    pub employees: Option<String>,
    #[serde(default)]
    pub industrycode: Option<i64>,
}

/// Converts a CVR company into the canonical registry record.
///
/// CVR has no status field; a populated `enddate` is the terminal marker.
#[must_use]
pub fn normalize(resp: &CvrResponse) -> RegistryRecord {
    let status = if resp.enddate.as_deref().is_some_and(|s| !s.trim().is_empty()) {
        CompanyStatus::Dissolved
    } else {
        CompanyStatus::Active
    };

    let address = if resp.address.is_some() || resp.city.is_some() || resp.zipcode.is_some() {
        Some(RegistryAddress {
            street: resp.address.clone(),
            postal_code: resp.zipcode.clone(),
            city: resp.city.clone(),
            country: Some("DK".to_string()),
        })
    } else {
        None
    };

    RegistryRecord {
        org_number: resp.vat.to_string(),
        legal_name: resp.name.clone(),
        address,
        registration_date: resp.startdate.as_deref().and_then(parse_cvr_date),
        industry_codes: resp
            .industrycode
            .map(|c| vec![c.to_string()])
            .unwrap_or_default(),
        employee_count: resp.employees.as_deref().and_then(parse_employee_band),
        status,
    }
}

/// Parses CVR's `DD/MM - YYYY` date format.
fn parse_cvr_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m - %Y").ok()
}

/// Parses an employee count from either an exact value (`"12"`) or the lower
/// bound of a banding string (`"5-9"`).
fn parse_employee_band(s: &str) -> Option<i32> {
    let lead: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
    lead.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn active_company() -> CvrResponse {
        serde_json::from_value(json!({
            "vat": 37_458_887_i64,
            "name": "EKSEMPEL BYG ApS",
            "address": "Hovedgaden 12",
            "zipcode": "2100",
            "city": "København Ø",
            "startdate": "01/06 - 2010",
            "employees": "5-9",
            "industrycode": 620_100_i64
        }))
        .expect("fixture should deserialize")
    }

    #[test]
    fn normalizes_an_active_company() {
        let record = normalize(&active_company());
        assert_eq!(record.org_number, "37458887");
        assert_eq!(record.legal_name, "EKSEMPEL BYG ApS");
        assert_eq!(record.status, CompanyStatus::Active);
        assert_eq!(
            record.registration_date,
            Some(NaiveDate::from_ymd_opt(2010, 6, 1).unwrap())
        );
        assert_eq!(record.employee_count, Some(5));
        assert_eq!(record.industry_codes, vec!["620100".to_string()]);
        assert_eq!(record.address.unwrap().country.as_deref(), Some("DK"));
    }

    #[test]
    fn enddate_maps_to_dissolved() {
        let mut resp = active_company();
        resp.enddate = Some("31/12 - 2023".to_string());
        assert_eq!(normalize(&resp).status, CompanyStatus::Dissolved);
    }

    #[test]
    fn blank_enddate_stays_active() {
        let mut resp = active_company();
        resp.enddate = Some("  ".to_string());
        assert_eq!(normalize(&resp).status, CompanyStatus::Active);
    }

    #[test]
    fn exact_employee_count_parses() {
        assert_eq!(parse_employee_band("12"), Some(12));
    }

    #[test]
    fn unparseable_date_becomes_none() {
        assert!(parse_cvr_date("June 2010").is_none());
    }
}
