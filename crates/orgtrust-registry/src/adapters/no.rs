//! Norway — Brønnøysund Register Centre (Enhetsregisteret).
//!
//! Public API, no credentials. `GET /enhetsregisteret/api/enheter/{orgnr}`.

use chrono::NaiveDate;
use serde::Deserialize;

use orgtrust_core::{CompanyStatus, RegistryAddress, RegistryRecord};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhetResponse {
    pub organisasjonsnummer: String,
    pub navn: String,
    #[serde(default)]
    pub registreringsdato_enhetsregisteret: Option<String>,
    #[serde(default)]
    pub naeringskode1: Option<Naeringskode>,
    #[serde(default)]
    pub naeringskode2: Option<Naeringskode>,
    #[serde(default)]
    pub naeringskode3: Option<Naeringskode>,
    #[serde(default)]
    pub antall_ansatte: Option<i32>,
    #[serde(default)]
    pub forretningsadresse: Option<Forretningsadresse>,
    #[serde(default)]
    pub konkurs: bool,
    #[serde(default)]
    pub under_avvikling: bool,
    #[serde(default)]
    pub under_tvangsavvikling_eller_tvangsopplosning: bool,
    #[serde(default)]
    pub slettedato: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Naeringskode {
    pub kode: String,
}

/// Paged search response from `GET /enheter?naeringskode=…`.
#[derive(Debug, Deserialize)]
pub struct EnhetSearchResponse {
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<EnhetSearchEmbedded>,
}

#[derive(Debug, Deserialize)]
pub struct EnhetSearchEmbedded {
    #[serde(default)]
    pub enheter: Vec<EnhetResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forretningsadresse {
    #[serde(default)]
    pub adresse: Vec<String>,
    #[serde(default)]
    pub postnummer: Option<String>,
    #[serde(default)]
    pub poststed: Option<String>,
    #[serde(default)]
    pub landkode: Option<String>,
}

/// Converts a Brønnøysund entity into the canonical registry record.
///
/// Status derivation: a deletion date, bankruptcy, or forced liquidation
/// means the entity is gone; voluntary winding-up means inactive; everything
/// else is active (the register has no other terminal markers).
#[must_use]
pub fn normalize(resp: &EnhetResponse) -> RegistryRecord {
    let status = if resp.slettedato.is_some()
        || resp.konkurs
        || resp.under_tvangsavvikling_eller_tvangsopplosning
    {
        CompanyStatus::Dissolved
    } else if resp.under_avvikling {
        CompanyStatus::Inactive
    } else {
        CompanyStatus::Active
    };

    let industry_codes = [
        resp.naeringskode1.as_ref(),
        resp.naeringskode2.as_ref(),
        resp.naeringskode3.as_ref(),
    ]
    .into_iter()
    .flatten()
    .map(|n| n.kode.clone())
    .collect();

    let address = resp.forretningsadresse.as_ref().map(|a| {
        let street = if a.adresse.is_empty() {
            None
        } else {
            Some(a.adresse.join(", "))
        };
        RegistryAddress {
            street,
            postal_code: a.postnummer.clone(),
            city: a.poststed.clone(),
            country: a.landkode.clone(),
        }
    });

    let registration_date = resp
        .registreringsdato_enhetsregisteret
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

    RegistryRecord {
        org_number: resp.organisasjonsnummer.clone(),
        legal_name: resp.navn.clone(),
        address,
        registration_date,
        industry_codes,
        employee_count: resp.antall_ansatte,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn active_entity() -> EnhetResponse {
        serde_json::from_value(json!({
            "organisasjonsnummer": "923609016",
            "navn": "EKSEMPEL RØR AS",
            "registreringsdatoEnhetsregisteret": "2010-06-01",
            "naeringskode1": { "kode": "43.221", "beskrivelse": "Rørleggerarbeid" },
            "antallAnsatte": 12,
            "forretningsadresse": {
                "adresse": ["Storgata 1"],
                "postnummer": "0155",
                "poststed": "OSLO",
                "landkode": "NO"
            },
            "konkurs": false,
            "underAvvikling": false
        }))
        .expect("fixture should deserialize")
    }

    #[test]
    fn normalizes_an_active_entity() {
        let record = normalize(&active_entity());
        assert_eq!(record.org_number, "923609016");
        assert_eq!(record.legal_name, "EKSEMPEL RØR AS");
        assert_eq!(record.status, CompanyStatus::Active);
        assert_eq!(record.industry_codes, vec!["43.221".to_string()]);
        assert_eq!(record.employee_count, Some(12));
        assert_eq!(
            record.registration_date,
            Some(NaiveDate::from_ymd_opt(2010, 6, 1).unwrap())
        );
        let address = record.address.unwrap();
        assert_eq!(address.street.as_deref(), Some("Storgata 1"));
        assert_eq!(address.city.as_deref(), Some("OSLO"));
    }

    #[test]
    fn bankruptcy_maps_to_dissolved() {
        let mut resp = active_entity();
        resp.konkurs = true;
        assert_eq!(normalize(&resp).status, CompanyStatus::Dissolved);
    }

    #[test]
    fn winding_up_maps_to_inactive() {
        let mut resp = active_entity();
        resp.under_avvikling = true;
        assert_eq!(normalize(&resp).status, CompanyStatus::Inactive);
    }

    #[test]
    fn deletion_date_wins_over_winding_up() {
        let mut resp = active_entity();
        resp.under_avvikling = true;
        resp.slettedato = Some("2024-01-01".to_string());
        assert_eq!(normalize(&resp).status, CompanyStatus::Dissolved);
    }

    #[test]
    fn minimal_payload_still_normalizes() {
        let resp: EnhetResponse = serde_json::from_value(json!({
            "organisasjonsnummer": "999999999",
            "navn": "MINIMAL AS"
        }))
        .expect("minimal fixture should deserialize");
        let record = normalize(&resp);
        assert_eq!(record.status, CompanyStatus::Active);
        assert!(record.address.is_none());
        assert!(record.industry_codes.is_empty());
        assert!(record.registration_date.is_none());
    }
}
