//! Per-record pipeline operations.
//!
//! Each operation here is key-scoped: it reads one business record, calls the
//! relevant collaborators, and persists via idempotent upserts. The queue
//! worker and the maintenance loop both drive these; neither holds shared
//! mutable state beyond the store itself.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;

use orgtrust_core::{compute_trust_score, AppConfig, NewsSignal, QualityAnalysis,
    VerificationStatus};
use orgtrust_db::{DbError, JobType, NewCrawlJob};
use orgtrust_news::NewsClient;
use orgtrust_registry::{RegistryClient, RegistryError};
use orgtrust_scraper::{AiAnalyzer, ScrapeError, WebsiteClient};

/// How many registry entries one discovery job expands.
const DISCOVER_PAGE_SIZE: usize = 20;

/// Everything a worker needs to process any job type.
pub struct PipelineContext {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub registry: RegistryClient,
    pub website: WebsiteClient,
    pub news: NewsClient,
}

impl PipelineContext {
    /// Constructs all external-API clients from config.
    ///
    /// # Errors
    ///
    /// Returns an error if any underlying HTTP client cannot be built.
    pub fn build(pool: PgPool, config: Arc<AppConfig>) -> anyhow::Result<Arc<Self>> {
        let registry = RegistryClient::new(
            config.registry_request_timeout_secs,
            config.companies_house_api_key.clone(),
            config.registry_max_retries,
            config.registry_backoff_base_ms,
        )?;
        let analyzer = AiAnalyzer::new(
            &config.ai_base_url,
            &config.ai_model,
            config.ai_api_key.clone(),
            config.scraper_request_timeout_secs,
        )?;
        let website = WebsiteClient::new(
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            analyzer,
        )?;
        let news = NewsClient::new(config.news_request_timeout_secs)?;

        Ok(Arc::new(Self {
            pool,
            config,
            registry,
            website,
            news,
        }))
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("business {country}:{org_number} not found in store")]
    MissingRecord { country: String, org_number: String },

    #[error("job payload invalid: {0}")]
    Payload(String),
}

impl PipelineError {
    /// True when the upstream explicitly asked us to back off; the caller
    /// re-enqueues instead of burning the retry budget.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PipelineError::Registry(RegistryError::RateLimited { .. }))
    }
}

/// Verifies one business against its registry and recomputes its trust score.
///
/// On success the registry fields are upserted and, when `refresh_news` is
/// set, news signals are re-collected (best-effort — a feed failure keeps the
/// stored signals). A registry miss for a record we already hold marks that
/// record failed and rescores it rather than erroring: "this entity no longer
/// exists" is a verification outcome, not a pipeline fault.
///
/// # Errors
///
/// Returns [`PipelineError`] on registry, news, or storage failure.
pub async fn verify_and_score(
    ctx: &PipelineContext,
    country_code: &str,
    org_number: &str,
    refresh_news: bool,
) -> Result<VerificationStatus, PipelineError> {
    match ctx.registry.verify(country_code, org_number).await {
        Ok(record) => {
            let status = VerificationStatus::from_company_status(&record.status);
            let row = orgtrust_db::upsert_registry_verification(
                &ctx.pool,
                country_code,
                org_number,
                &record,
                status,
            )
            .await?;

            let news = if refresh_news {
                match ctx.news.collect(&record.legal_name).await {
                    Ok(signals) => {
                        orgtrust_db::update_news_signals(&ctx.pool, row.id, &signals).await?;
                        signals
                    }
                    Err(e) => {
                        tracing::warn!(
                            org_number,
                            error = %e,
                            "news collection failed — keeping stored signals"
                        );
                        row.news()
                    }
                }
            } else {
                row.news()
            };

            store_score(&ctx.pool, row.id, status, row.quality(), row.ssl_valid, &news).await?;
            Ok(status)
        }
        Err(RegistryError::NotFound { .. }) => {
            let Some(row) = orgtrust_db::get_business(&ctx.pool, country_code, org_number).await?
            else {
                return Err(PipelineError::MissingRecord {
                    country: country_code.to_string(),
                    org_number: org_number.to_string(),
                });
            };
            orgtrust_db::mark_verification_failed(&ctx.pool, row.id).await?;
            store_score(
                &ctx.pool,
                row.id,
                VerificationStatus::Failed,
                row.quality(),
                row.ssl_valid,
                &row.news(),
            )
            .await?;
            Ok(VerificationStatus::Failed)
        }
        Err(e) => Err(e.into()),
    }
}

/// Scrapes a business website and recomputes its trust score.
///
/// Fetch failures (`unreachable`, `timeout`, `blocked`) propagate without
/// touching the record — stored website data is never overwritten with
/// emptiness, and the scraper guarantees no AI call was attempted.
///
/// # Errors
///
/// Returns [`PipelineError`] on scrape or storage failure, or
/// [`PipelineError::MissingRecord`] when no record matches the payload key.
pub async fn scrape_and_score(
    ctx: &PipelineContext,
    domain: &str,
    country_code: &str,
    org_number: &str,
) -> Result<(), PipelineError> {
    let Some(row) = orgtrust_db::get_business(&ctx.pool, country_code, org_number).await? else {
        return Err(PipelineError::MissingRecord {
            country: country_code.to_string(),
            org_number: org_number.to_string(),
        });
    };

    let data = ctx
        .website
        .scrape(domain, row.content_hash.as_deref())
        .await?;

    orgtrust_db::update_website_data(
        &ctx.pool,
        row.id,
        &orgtrust_db::WebsiteUpdate {
            domain: &data.domain,
            description: data.description.as_deref(),
            products: &data.products,
            services: &data.services,
            quality: data.quality.as_ref(),
            ssl_valid: data.ssl_valid,
            content_hash: &data.content_hash,
        },
    )
    .await?;

    let quality = data.quality.or_else(|| row.quality());
    store_score(
        &ctx.pool,
        row.id,
        row.verification_status(),
        quality,
        Some(data.ssl_valid),
        &row.news(),
    )
    .await?;

    Ok(())
}

/// Expands a discovery seed into registry verification jobs.
///
/// Returns the number of jobs enqueued. Already-queued targets are skipped so
/// at most one job is in flight per business key.
///
/// # Errors
///
/// Returns [`PipelineError`] on registry or storage failure.
pub async fn discover_and_enqueue(
    ctx: &PipelineContext,
    country_code: &str,
    nace_code: &str,
    priority: i32,
) -> Result<usize, PipelineError> {
    let records = ctx
        .registry
        .discover(country_code, nace_code, DISCOVER_PAGE_SIZE)
        .await?;

    let mut enqueued = 0usize;
    for record in &records {
        let target = format!("{}:{}", country_code.to_uppercase(), record.org_number);
        if orgtrust_db::job_exists_for_target(&ctx.pool, JobType::Registry, &target).await? {
            continue;
        }
        orgtrust_db::enqueue(
            &ctx.pool,
            &NewCrawlJob {
                job_type: JobType::Registry,
                target: &target,
                details: serde_json::json!({
                    "country": country_code.to_uppercase(),
                    "orgNumber": record.org_number,
                }),
                priority,
            },
        )
        .await?;
        enqueued += 1;
    }

    Ok(enqueued)
}

/// Recomputes the trust score from the given signals and persists it.
async fn store_score(
    pool: &PgPool,
    id: i64,
    status: VerificationStatus,
    quality: Option<QualityAnalysis>,
    ssl_valid: Option<bool>,
    news: &[NewsSignal],
) -> Result<(), DbError> {
    let result = compute_trust_score(status, quality.as_ref(), ssl_valid, news, Utc::now());
    orgtrust_db::update_trust_score(pool, id, result.score, &result.breakdown).await
}

/// Splits a `{country}:{org_number}` queue target.
pub(crate) fn split_target(target: &str) -> Result<(&str, &str), PipelineError> {
    target
        .split_once(':')
        .filter(|(country, org)| !country.is_empty() && !org.is_empty())
        .ok_or_else(|| {
            PipelineError::Payload(format!(
                "target '{target}' is not a country:org_number key"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_target_parses_jurisdiction_keys() {
        assert_eq!(split_target("NO:923609016").unwrap(), ("NO", "923609016"));
    }

    #[test]
    fn split_target_rejects_bare_values() {
        assert!(split_target("923609016").is_err());
        assert!(split_target(":923609016").is_err());
        assert!(split_target("NO:").is_err());
    }

    #[test]
    fn rate_limited_registry_errors_are_detected() {
        let err = PipelineError::Registry(RegistryError::RateLimited {
            retry_after_secs: 60,
        });
        assert!(err.is_rate_limited());
        assert!(!PipelineError::Payload("x".to_string()).is_rate_limited());
    }
}
