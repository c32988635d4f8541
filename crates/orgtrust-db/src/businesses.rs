//! Database operations for the `businesses` table.
//!
//! All mutation is key-scoped upsert/update — never multi-record
//! transactions — which bounds the blast radius of a partial failure to one
//! record.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use orgtrust_core::{NewsSignal, QualityAnalysis, RegistryRecord, TrustScoreBreakdown,
    VerificationStatus};

use crate::DbError;

const BUSINESS_COLUMNS: &str = "id, public_id, org_number, country_code, legal_name, \
     registry_data, verification_status, last_verified_at, domain, company_description, \
     products, services, quality_analysis, content_hash, ssl_valid, website_last_crawled, \
     trust_score, trust_score_breakdown, news_signals, created_at, updated_at";

/// A row from the `businesses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BusinessRow {
    pub id: i64,
    pub public_id: Uuid,
    pub org_number: String,
    pub country_code: String,
    pub legal_name: Option<String>,
    pub registry_data: Option<serde_json::Value>,
    pub verification_status: String,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub domain: Option<String>,
    pub company_description: Option<String>,
    pub products: Option<serde_json::Value>,
    pub services: Option<serde_json::Value>,
    pub quality_analysis: Option<serde_json::Value>,
    pub content_hash: Option<String>,
    pub ssl_valid: Option<bool>,
    pub website_last_crawled: Option<DateTime<Utc>>,
    pub trust_score: Option<i32>,
    pub trust_score_breakdown: Option<serde_json::Value>,
    pub news_signals: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BusinessRow {
    /// Parses the stored verification status; unknown values read as pending.
    #[must_use]
    pub fn verification_status(&self) -> VerificationStatus {
        self.verification_status
            .parse()
            .unwrap_or(VerificationStatus::Pending)
    }

    /// Normalises the stored quality analysis, tolerating legacy shapes.
    #[must_use]
    pub fn quality(&self) -> Option<QualityAnalysis> {
        self.quality_analysis
            .as_ref()
            .and_then(QualityAnalysis::from_legacy_value)
    }

    /// Deserializes the stored news signals; unreadable entries read as none.
    #[must_use]
    pub fn news(&self) -> Vec<NewsSignal> {
        self.news_signals
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Deserializes the stored registry record.
    #[must_use]
    pub fn registry(&self) -> Option<RegistryRecord> {
        self.registry_data
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Website-sourced fields for [`update_website_data`].
///
/// `quality = None` means "keep the stored analysis" (used when the content
/// fingerprint was unchanged and the AI call was skipped).
#[derive(Debug)]
pub struct WebsiteUpdate<'a> {
    pub domain: &'a str,
    pub description: Option<&'a str>,
    pub products: &'a [String],
    pub services: &'a [String],
    pub quality: Option<&'a QualityAnalysis>,
    pub ssl_valid: bool,
    pub content_hash: &'a str,
}

/// Upserts the registry-sourced fields of a business record.
///
/// Conflict key is `(org_number, country_code)`; re-ingesting identical
/// registry data only refreshes `last_verified_at`/`updated_at`, so the
/// operation is idempotent for the enrichment fields.
///
/// # Errors
///
/// Returns [`DbError::Serialize`] if the registry record cannot be encoded,
/// or [`DbError::Sqlx`] on query failure.
pub async fn upsert_registry_verification(
    pool: &PgPool,
    country_code: &str,
    org_number: &str,
    record: &RegistryRecord,
    status: VerificationStatus,
) -> Result<BusinessRow, DbError> {
    let registry_data = serde_json::to_value(record)?;
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, BusinessRow>(&format!(
        "INSERT INTO businesses \
           (public_id, org_number, country_code, legal_name, registry_data, \
            verification_status, last_verified_at) \
         VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
         ON CONFLICT (org_number, country_code) DO UPDATE SET \
           legal_name = EXCLUDED.legal_name, \
           registry_data = EXCLUDED.registry_data, \
           verification_status = EXCLUDED.verification_status, \
           last_verified_at = NOW(), \
           updated_at = NOW() \
         RETURNING {BUSINESS_COLUMNS}"
    ))
    .bind(public_id)
    .bind(org_number)
    .bind(country_code.to_uppercase())
    .bind(&record.legal_name)
    .bind(registry_data)
    .bind(status.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches one business by its jurisdiction-scoped key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn get_business(
    pool: &PgPool,
    country_code: &str,
    org_number: &str,
) -> Result<Option<BusinessRow>, DbError> {
    let row = sqlx::query_as::<_, BusinessRow>(&format!(
        "SELECT {BUSINESS_COLUMNS} FROM businesses \
         WHERE country_code = $1 AND org_number = $2"
    ))
    .bind(country_code.to_uppercase())
    .bind(org_number)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Writes website-sourced fields after a successful scrape.
///
/// `company_description` and `quality_analysis` use `COALESCE` so a scrape
/// that extracted no description (or skipped the AI call) never blanks
/// previously stored data.
///
/// # Errors
///
/// Returns [`DbError::Serialize`] on encoding failure, [`DbError::NotFound`]
/// if the row is gone, or [`DbError::Sqlx`] on query failure.
pub async fn update_website_data(
    pool: &PgPool,
    id: i64,
    update: &WebsiteUpdate<'_>,
) -> Result<(), DbError> {
    let quality = update
        .quality
        .map(serde_json::to_value)
        .transpose()?;

    let result = sqlx::query(
        "UPDATE businesses SET \
           domain = $1, \
           company_description = COALESCE($2, company_description), \
           products = $3, \
           services = $4, \
           quality_analysis = COALESCE($5, quality_analysis), \
           ssl_valid = $6, \
           content_hash = $7, \
           website_last_crawled = NOW(), \
           updated_at = NOW() \
         WHERE id = $8",
    )
    .bind(update.domain)
    .bind(update.description)
    .bind(serde_json::to_value(update.products)?)
    .bind(serde_json::to_value(update.services)?)
    .bind(quality)
    .bind(update.ssl_valid)
    .bind(update.content_hash)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Persists a freshly computed trust score and its breakdown.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the row is gone, or [`DbError::Sqlx`] on
/// query failure.
pub async fn update_trust_score(
    pool: &PgPool,
    id: i64,
    score: u8,
    breakdown: &TrustScoreBreakdown,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE businesses SET \
           trust_score = $1, trust_score_breakdown = $2, updated_at = NOW() \
         WHERE id = $3",
    )
    .bind(i32::from(score))
    .bind(serde_json::to_value(breakdown)?)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Replaces the stored news signals for a record.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the row is gone, or [`DbError::Sqlx`] on
/// query failure.
pub async fn update_news_signals(
    pool: &PgPool,
    id: i64,
    signals: &[NewsSignal],
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE businesses SET news_signals = $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(serde_json::to_value(signals)?)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Businesses due for re-verification: never-verified rows first, then
/// oldest-verified, up to `limit`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_stale_businesses(
    pool: &PgPool,
    threshold_days: i64,
    limit: i64,
) -> Result<Vec<BusinessRow>, DbError> {
    let rows = sqlx::query_as::<_, BusinessRow>(&format!(
        "SELECT {BUSINESS_COLUMNS} FROM businesses \
         WHERE last_verified_at IS NULL \
            OR last_verified_at < NOW() - make_interval(days => $1) \
         ORDER BY last_verified_at ASC NULLS FIRST \
         LIMIT $2"
    ))
    .bind(i32::try_from(threshold_days).unwrap_or(i32::MAX))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Marks a record's verification as failed. Soft state only — the pipeline
/// never deletes records.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the row is gone, or [`DbError::Sqlx`] on
/// query failure.
pub async fn mark_verification_failed(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE businesses SET verification_status = 'failed', updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Records whose AI analysis failed, detected via the explicit status field
/// with a fallback to the legacy flag literal in either field-name variant.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_failed_analyses(pool: &PgPool, limit: i64) -> Result<Vec<BusinessRow>, DbError> {
    let rows = sqlx::query_as::<_, BusinessRow>(&format!(
        "SELECT {BUSINESS_COLUMNS} FROM businesses \
         WHERE quality_analysis IS NOT NULL AND ( \
               quality_analysis->>'analysis_status' = 'unavailable' \
            OR quality_analysis->'red_flags' ? 'AI Analysis Unavailable' \
            OR quality_analysis->'redFlags' ? 'AI Analysis Unavailable') \
         ORDER BY website_last_crawled ASC NULLS FIRST \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Nulls the failed analyses and fingerprints for `ids` so those records
/// re-enter the scrape queue and get a fresh AI pass.
///
/// Returns the number of rows reset.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn reset_failed_analyses(pool: &PgPool, ids: &[i64]) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE businesses SET \
           quality_analysis = NULL, content_hash = NULL, updated_at = NOW() \
         WHERE id = ANY($1)",
    )
    .bind(ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
