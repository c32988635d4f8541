//! Offline unit tests for orgtrust-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use orgtrust_core::{AppConfig, Environment, VerificationStatus};
use orgtrust_db::{BusinessRow, CrawlJobRow, PoolConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use uuid::Uuid;

fn test_app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        seeds_path: PathBuf::from("./config/seeds.yaml"),
        maintenance_token: None,
        companies_house_api_key: None,
        ai_base_url: "https://api.openai.com/v1".to_string(),
        ai_model: "gpt-4o-mini".to_string(),
        ai_api_key: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        registry_request_timeout_secs: 15,
        registry_max_retries: 3,
        registry_backoff_base_ms: 1000,
        scraper_request_timeout_secs: 10,
        scraper_user_agent: "ua".to_string(),
        news_request_timeout_secs: 10,
        staleness_threshold_days: 30,
        maintenance_batch_limit: 50,
        maintenance_inter_record_delay_ms: 1000,
        queue_lease_secs: 600,
        queue_max_attempts: 3,
        worker_count: 4,
        worker_batch_size: 5,
        worker_poll_interval_secs: 5,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&test_app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`BusinessRow`] has all expected
/// fields with the correct types, and that the accessor helpers tolerate
/// missing optional data. No database required.
#[test]
fn business_row_accessors_handle_missing_data() {
    let row = BusinessRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        org_number: "923609016".to_string(),
        country_code: "NO".to_string(),
        legal_name: None,
        registry_data: None,
        verification_status: "pending".to_string(),
        last_verified_at: None,
        domain: None,
        company_description: None,
        products: None,
        services: None,
        quality_analysis: None,
        content_hash: None,
        ssl_valid: None,
        website_last_crawled: None,
        trust_score: None,
        trust_score_breakdown: None,
        news_signals: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.verification_status(), VerificationStatus::Pending);
    assert!(row.quality().is_none());
    assert!(row.news().is_empty());
    assert!(row.registry().is_none());
}

#[test]
fn business_row_normalises_legacy_quality_shape() {
    let mut row = BusinessRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        org_number: "923609016".to_string(),
        country_code: "NO".to_string(),
        legal_name: None,
        registry_data: None,
        verification_status: "verified".to_string(),
        last_verified_at: None,
        domain: None,
        company_description: None,
        products: None,
        services: None,
        quality_analysis: Some(serde_json::json!({
            "aiSummary": "Legacy shape.",
            "redFlags": ["AI Analysis Unavailable"]
        })),
        content_hash: None,
        ssl_valid: None,
        website_last_crawled: None,
        trust_score: None,
        trust_score_breakdown: None,
        news_signals: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let quality = row.quality().expect("legacy shape should normalise");
    assert!(quality.is_unavailable());
    assert_eq!(quality.summary.as_deref(), Some("Legacy shape."));

    row.verification_status = "verified".to_string();
    assert_eq!(row.verification_status(), VerificationStatus::Verified);
}

/// Compile-time smoke test for [`CrawlJobRow`].
#[test]
fn crawl_job_row_has_expected_fields() {
    let row = CrawlJobRow {
        id: 1_i64,
        job_type: "registry".to_string(),
        target: "NO:923609016".to_string(),
        details: serde_json::json!({"country": "NO"}),
        priority: 60_i32,
        status: "pending".to_string(),
        attempts: 0_i32,
        last_error: None,
        claimed_at: None,
        completed_at: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.job_type().unwrap(), orgtrust_db::JobType::Registry);
    assert_eq!(row.priority, 60);
    assert_eq!(row.status, "pending");
    assert!(row.claimed_at.is_none());
}
