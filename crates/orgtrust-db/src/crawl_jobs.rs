//! The durable crawl queue.
//!
//! The queue owns job identity and state; adapters and scrapers interpret
//! payloads but never touch queue state except through
//! [`complete_job`]/[`fail_job`]. Claims are atomic — a single
//! `UPDATE … WHERE id IN (SELECT … FOR UPDATE SKIP LOCKED)` statement — so
//! concurrent workers can never double-claim a pending job.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

const JOB_COLUMNS: &str = "id, job_type, target, details, priority, status, attempts, \
     last_error, claimed_at, completed_at, created_at";

/// The four kinds of queued work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    /// Expand a seed (country + industry code) into registry jobs.
    Discover,
    /// Verify one business against its national registry.
    Registry,
    /// Scrape a business website for the first time.
    Scrape,
    /// Re-scrape a previously crawled website.
    Rescan,
}

impl JobType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::Discover => "discover",
            JobType::Registry => "registry",
            JobType::Scrape => "scrape",
            JobType::Rescan => "rescan",
        }
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discover" => Ok(JobType::Discover),
            "registry" => Ok(JobType::Registry),
            "scrape" => Ok(JobType::Scrape),
            "rescan" => Ok(JobType::Rescan),
            other => Err(format!("unknown job type '{other}'")),
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row from the `crawl_jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CrawlJobRow {
    pub id: i64,
    pub job_type: String,
    pub target: String,
    pub details: serde_json::Value,
    pub priority: i32,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CrawlJobRow {
    /// Parses the stored job type.
    ///
    /// # Errors
    ///
    /// Returns the raw string if it matches no known type (only possible if
    /// the table's CHECK constraint has been bypassed).
    pub fn job_type(&self) -> Result<JobType, String> {
        self.job_type.parse()
    }
}

/// Parameters for [`enqueue`].
#[derive(Debug)]
pub struct NewCrawlJob<'a> {
    pub job_type: JobType,
    /// A URL or a `{country}:{org_number}` jurisdiction key.
    pub target: &'a str,
    pub details: serde_json::Value,
    /// Higher runs first.
    pub priority: i32,
}

/// Inserts a job with `status = 'pending'`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn enqueue(pool: &PgPool, job: &NewCrawlJob<'_>) -> Result<CrawlJobRow, DbError> {
    let row = sqlx::query_as::<_, CrawlJobRow>(&format!(
        "INSERT INTO crawl_jobs (job_type, target, details, priority) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {JOB_COLUMNS}"
    ))
    .bind(job.job_type.as_str())
    .bind(job.target)
    .bind(&job.details)
    .bind(job.priority)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// True when a pending or in-flight job already targets `target`.
///
/// Enqueue paths use this to keep at most one job in flight per key, so two
/// workers are never scheduled against the same `org_number` simultaneously.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn job_exists_for_target(
    pool: &PgPool,
    job_type: JobType,
    target: &str,
) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS ( \
           SELECT 1 FROM crawl_jobs \
           WHERE job_type = $1 AND target = $2 \
             AND status IN ('pending', 'in_progress'))",
    )
    .bind(job_type.as_str())
    .bind(target)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Atomically claims up to `n` pending jobs, ordered by
/// `(priority DESC, created_at ASC)`, marking them `in_progress`.
///
/// The claim is a single statement with `FOR UPDATE SKIP LOCKED`: rows locked
/// by a concurrent claimer are skipped, never double-claimed. `attempts`
/// counts the claim itself, so a job that dies with its worker still burns an
/// attempt.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn dequeue_batch(pool: &PgPool, n: i64) -> Result<Vec<CrawlJobRow>, DbError> {
    let mut rows = sqlx::query_as::<_, CrawlJobRow>(&format!(
        "UPDATE crawl_jobs SET \
           status = 'in_progress', claimed_at = NOW(), attempts = attempts + 1 \
         WHERE id IN ( \
           SELECT id FROM crawl_jobs WHERE status = 'pending' \
           ORDER BY priority DESC, created_at ASC \
           LIMIT $1 \
           FOR UPDATE SKIP LOCKED) \
         RETURNING {JOB_COLUMNS}"
    ))
    .bind(n)
    .fetch_all(pool)
    .await?;

    // The UPDATE does not preserve subselect order; restore claim order.
    rows.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
    Ok(rows)
}

/// Marks an in-flight job `done`.
///
/// # Errors
///
/// Returns [`DbError::InvalidJobTransition`] if the job was not
/// `in_progress` (lost lease race), or [`DbError::Sqlx`] on query failure.
pub async fn complete_job(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE crawl_jobs SET \
           status = 'done', completed_at = NOW(), claimed_at = NULL \
         WHERE id = $1 AND status = 'in_progress'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidJobTransition {
            id,
            expected_status: "in_progress",
        });
    }
    Ok(())
}

/// Outcome of [`fail_job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// Attempts remain; the job went back to `pending`.
    Requeued,
    /// Attempt budget exhausted; the job is terminally `failed`.
    Failed,
}

/// Records a job failure.
///
/// While `attempts < max_attempts` the job is re-enqueued (back to
/// `pending`); once the budget is exhausted it becomes terminally `failed`.
/// Retries are bounded, never infinite.
///
/// # Errors
///
/// Returns [`DbError::InvalidJobTransition`] if the job was not
/// `in_progress`, or [`DbError::Sqlx`] on query failure.
pub async fn fail_job(
    pool: &PgPool,
    id: i64,
    reason: &str,
    max_attempts: i32,
) -> Result<FailOutcome, DbError> {
    let status = sqlx::query_scalar::<_, String>(
        "UPDATE crawl_jobs SET \
           status = CASE WHEN attempts >= $3 THEN 'failed' ELSE 'pending' END, \
           completed_at = CASE WHEN attempts >= $3 THEN NOW() ELSE NULL END, \
           last_error = $2, \
           claimed_at = NULL \
         WHERE id = $1 AND status = 'in_progress' \
         RETURNING status",
    )
    .bind(id)
    .bind(reason)
    .bind(max_attempts)
    .fetch_optional(pool)
    .await?;

    match status.as_deref() {
        Some("pending") => Ok(FailOutcome::Requeued),
        Some(_) => Ok(FailOutcome::Failed),
        None => Err(DbError::InvalidJobTransition {
            id,
            expected_status: "in_progress",
        }),
    }
}

/// Returns in-flight jobs whose lease has expired to `pending`.
///
/// Recovers work claimed by workers that crashed mid-job. Returns the number
/// of reclaimed jobs.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn reclaim_stale_jobs(pool: &PgPool, lease_secs: i64) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE crawl_jobs SET status = 'pending', claimed_at = NULL \
         WHERE status = 'in_progress' \
           AND claimed_at < NOW() - make_interval(secs => $1::double precision)",
    )
    .bind(lease_secs)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Number of jobs currently in `status`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn count_jobs_by_status(pool: &PgPool, status: &str) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM crawl_jobs WHERE status = $1")
        .bind(status)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
