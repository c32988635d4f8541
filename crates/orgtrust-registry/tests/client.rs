//! Integration tests for `RegistryClient` using wiremock HTTP mocks.

use orgtrust_core::{CompanyStatus, VerificationStatus};
use orgtrust_registry::{JurisdictionBaseUrls, RegistryClient, RegistryError};
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(base_urls: JurisdictionBaseUrls, gb_key: Option<&str>) -> RegistryClient {
    RegistryClient::with_base_urls(15, gb_key.map(ToOwned::to_owned), 0, 0, base_urls)
        .expect("client construction should not fail")
}

fn urls_all(server_uri: &str) -> JurisdictionBaseUrls {
    JurisdictionBaseUrls {
        no: server_uri.to_string(),
        dk: server_uri.to_string(),
        gb: server_uri.to_string(),
    }
}

#[tokio::test]
async fn norwegian_active_entity_verifies() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
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
    });

    Mock::given(method("GET"))
        .and(path("/enheter/923609016"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = client_for(urls_all(&server.uri()), None);
    let record = client.verify("NO", "923609016").await.expect("should verify");

    assert_eq!(record.legal_name, "EKSEMPEL RØR AS");
    assert_eq!(record.status, CompanyStatus::Active);
    assert_eq!(
        VerificationStatus::from_company_status(&record.status),
        VerificationStatus::Verified
    );
}

#[tokio::test]
async fn norwegian_bankrupt_entity_fails_verification() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "organisasjonsnummer": "913609016",
        "navn": "KONKURS AS",
        "konkurs": true
    });

    Mock::given(method("GET"))
        .and(path("/enheter/913609016"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = client_for(urls_all(&server.uri()), None);
    let record = client.verify("NO", "913609016").await.expect("should parse");

    assert_eq!(record.status, CompanyStatus::Dissolved);
    assert_eq!(
        VerificationStatus::from_company_status(&record.status),
        VerificationStatus::Failed
    );
}

#[tokio::test]
async fn missing_identifier_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/enheter/000000000"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(urls_all(&server.uri()), None);
    let err = client.verify("NO", "000000000").await.unwrap_err();

    assert!(matches!(
        err,
        RegistryError::NotFound { ref country, ref org_number }
            if country == "NO" && org_number == "000000000"
    ));
}

#[tokio::test]
async fn malformed_payload_maps_to_deserialize_error() {
    let server = MockServer::start().await;

    // An array where an object is expected — schema mismatch, not a network
    // failure, so callers know retrying is pointless.
    Mock::given(method("GET"))
        .and(path("/enheter/923609016"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["wat"])))
        .mount(&server)
        .await;

    let client = client_for(urls_all(&server.uri()), None);
    let err = client.verify("NO", "923609016").await.unwrap_err();

    assert!(matches!(err, RegistryError::Deserialize { .. }));
}

#[tokio::test]
async fn rate_limiting_surfaces_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/enheter/923609016"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "120"))
        .mount(&server)
        .await;

    let client = client_for(urls_all(&server.uri()), None);
    let err = client.verify("NO", "923609016").await.unwrap_err();

    assert!(matches!(
        err,
        RegistryError::RateLimited {
            retry_after_secs: 120
        }
    ));
}

#[tokio::test]
async fn danish_company_verifies_via_search_endpoint() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "vat": 37_458_887_i64,
        "name": "EKSEMPEL BYG ApS",
        "address": "Hovedgaden 12",
        "zipcode": "2100",
        "city": "København Ø",
        "startdate": "01/06 - 2010",
        "employees": "5-9",
        "industrycode": 620_100_i64
    });

    Mock::given(method("GET"))
        .and(path("/api"))
        .and(query_param("search", "37458887"))
        .and(query_param("country", "dk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = client_for(urls_all(&server.uri()), None);
    let record = client.verify("DK", "37458887").await.expect("should verify");

    assert_eq!(record.org_number, "37458887");
    assert_eq!(record.status, CompanyStatus::Active);
    assert_eq!(record.employee_count, Some(5));
}

#[tokio::test]
async fn danish_error_body_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "NOT_FOUND"})),
        )
        .mount(&server)
        .await;

    let client = client_for(urls_all(&server.uri()), None);
    let err = client.verify("DK", "99999999").await.unwrap_err();

    assert!(matches!(err, RegistryError::NotFound { ref country, .. } if country == "DK"));
}

#[tokio::test]
async fn british_profile_verifies_with_basic_auth() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "company_name": "EXAMPLE SOFTWARE LTD",
        "company_number": "01234567",
        "company_status": "active",
        "date_of_creation": "2015-03-20",
        "sic_codes": ["62012"]
    });

    Mock::given(method("GET"))
        .and(path("/company/01234567"))
        .and(basic_auth("ch-test-key", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = client_for(urls_all(&server.uri()), Some("ch-test-key"));
    let record = client.verify("GB", "01234567").await.expect("should verify");

    assert_eq!(record.legal_name, "EXAMPLE SOFTWARE LTD");
    assert_eq!(record.status, CompanyStatus::Active);
}

#[tokio::test]
async fn lowercase_country_code_dispatches() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "organisasjonsnummer": "923609016",
        "navn": "EKSEMPEL RØR AS"
    });

    Mock::given(method("GET"))
        .and(path("/enheter/923609016"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = client_for(urls_all(&server.uri()), None);
    assert!(client.verify("no", "923609016").await.is_ok());
}

#[tokio::test]
async fn server_errors_are_retried_then_succeed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/enheter/923609016"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/enheter/923609016"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "organisasjonsnummer": "923609016",
            "navn": "EKSEMPEL RØR AS"
        })))
        .mount(&server)
        .await;

    let client = RegistryClient::with_base_urls(15, None, 3, 0, urls_all(&server.uri()))
        .expect("client construction should not fail");
    let record = client
        .verify("NO", "923609016")
        .await
        .expect("should succeed after retries");
    assert_eq!(record.org_number, "923609016");
}

#[tokio::test]
async fn discovery_lists_entities_by_industry_code() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "_embedded": {
            "enheter": [
                { "organisasjonsnummer": "923609016", "navn": "EKSEMPEL RØR AS" },
                { "organisasjonsnummer": "913609017", "navn": "ANNEN BEDRIFT AS", "konkurs": true }
            ]
        }
    });

    Mock::given(method("GET"))
        .and(path("/enheter"))
        .and(query_param("naeringskode", "62"))
        .and(query_param("size", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = client_for(urls_all(&server.uri()), None);
    let records = client.discover("NO", "62", 20).await.expect("should discover");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].org_number, "923609016");
    assert_eq!(records[1].status, CompanyStatus::Dissolved);
}

#[tokio::test]
async fn discovery_empty_page_yields_no_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/enheter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let client = client_for(urls_all(&server.uri()), None);
    let records = client.discover("no", "62", 20).await.expect("should parse");
    assert!(records.is_empty());
}

#[tokio::test]
async fn discovery_rejects_jurisdictions_without_search() {
    let server = MockServer::start().await;
    let client = client_for(urls_all(&server.uri()), None);
    let err = client.discover("DK", "62", 20).await.unwrap_err();
    assert!(matches!(err, RegistryError::UnsupportedJurisdiction(ref c) if c == "DK"));
}
