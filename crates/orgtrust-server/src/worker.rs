//! Queue worker pool.
//!
//! A fixed pool of independent tasks, each claiming batches from the crawl
//! queue and routing jobs to the pipeline operations. Workers share nothing
//! but the store: coordination happens entirely through the queue's atomic
//! claim and the per-record upserts.

use std::sync::Arc;
use std::time::Duration;

use orgtrust_db::{CrawlJobRow, FailOutcome, JobType};

use crate::pipeline::{
    discover_and_enqueue, scrape_and_score, split_target, verify_and_score, PipelineContext,
    PipelineError,
};

/// Spawns the configured number of worker tasks. Handles run for the process
/// lifetime; the tasks abort when the runtime shuts down.
pub fn spawn_workers(ctx: &Arc<PipelineContext>) -> Vec<tokio::task::JoinHandle<()>> {
    (0..ctx.config.worker_count)
        .map(|worker_id| {
            let ctx = Arc::clone(ctx);
            tokio::spawn(async move { worker_loop(worker_id, &ctx).await })
        })
        .collect()
}

async fn worker_loop(worker_id: usize, ctx: &PipelineContext) {
    let poll_interval = Duration::from_secs(ctx.config.worker_poll_interval_secs);
    loop {
        let batch = match orgtrust_db::dequeue_batch(&ctx.pool, ctx.config.worker_batch_size).await
        {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!(worker_id, error = %e, "worker: dequeue failed");
                tokio::time::sleep(poll_interval).await;
                continue;
            }
        };

        if batch.is_empty() {
            tokio::time::sleep(poll_interval).await;
            continue;
        }

        tracing::debug!(worker_id, count = batch.len(), "worker: claimed batch");
        for job in &batch {
            process_job(ctx, job).await;
        }
    }
}

/// Runs one claimed job and reports its terminal state to the queue.
async fn process_job(ctx: &PipelineContext, job: &CrawlJobRow) {
    let job_type = match job.job_type() {
        Ok(job_type) => job_type,
        Err(raw) => {
            // Only reachable if the table's CHECK constraint was bypassed.
            tracing::error!(job_id = job.id, job_type = %raw, "worker: unknown job type");
            report_failure(ctx, job, &format!("unknown job type '{raw}'")).await;
            return;
        }
    };

    let result = match job_type {
        JobType::Discover => run_discover(ctx, job).await,
        JobType::Registry => run_registry(ctx, job).await,
        JobType::Scrape | JobType::Rescan => run_scrape(ctx, job).await,
    };

    match result {
        Ok(()) => {
            if let Err(e) = orgtrust_db::complete_job(&ctx.pool, job.id).await {
                tracing::error!(job_id = job.id, error = %e, "worker: complete failed");
            }
        }
        Err(e) => {
            if e.is_rate_limited() {
                tracing::info!(
                    job_id = job.id,
                    target = %job.target,
                    "worker: rate limited — re-enqueueing for later"
                );
            } else {
                tracing::warn!(
                    job_id = job.id,
                    job_type = %job.job_type,
                    target = %job.target,
                    error = %e,
                    "worker: job failed"
                );
            }
            report_failure(ctx, job, &e.to_string()).await;
        }
    }
}

async fn report_failure(ctx: &PipelineContext, job: &CrawlJobRow, reason: &str) {
    match orgtrust_db::fail_job(&ctx.pool, job.id, reason, ctx.config.queue_max_attempts).await {
        Ok(FailOutcome::Requeued) => {
            tracing::debug!(job_id = job.id, attempts = job.attempts, "worker: job requeued");
        }
        Ok(FailOutcome::Failed) => {
            tracing::warn!(job_id = job.id, attempts = job.attempts, "worker: job terminally failed");
        }
        Err(e) => {
            tracing::error!(job_id = job.id, error = %e, "worker: failure report failed");
        }
    }
}

async fn run_discover(ctx: &PipelineContext, job: &CrawlJobRow) -> Result<(), PipelineError> {
    let country = payload_str(job, "country")?;
    let nace_code = payload_str(job, "naceCode")?;

    let enqueued = discover_and_enqueue(ctx, &country, &nace_code, job.priority).await?;
    tracing::info!(
        country = %country,
        nace_code = %nace_code,
        enqueued,
        "worker: discovery expanded seed"
    );
    Ok(())
}

async fn run_registry(ctx: &PipelineContext, job: &CrawlJobRow) -> Result<(), PipelineError> {
    let (country, org_number) = split_target(&job.target)?;
    let status = verify_and_score(ctx, country, org_number, true).await?;
    tracing::info!(
        target = %job.target,
        status = %status,
        "worker: registry verification done"
    );
    Ok(())
}

async fn run_scrape(ctx: &PipelineContext, job: &CrawlJobRow) -> Result<(), PipelineError> {
    let country = payload_str(job, "country")?;
    let org_number = payload_str(job, "orgNumber")?;
    scrape_and_score(ctx, &job.target, &country, &org_number).await?;
    tracing::info!(domain = %job.target, "worker: website scrape done");
    Ok(())
}

/// Reads a required string field from the job's `details` payload.
fn payload_str(job: &CrawlJobRow, key: &str) -> Result<String, PipelineError> {
    job.details
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            PipelineError::Payload(format!("job {} details missing '{key}'", job.id))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job_with_details(details: serde_json::Value) -> CrawlJobRow {
        CrawlJobRow {
            id: 1,
            job_type: "scrape".to_string(),
            target: "example.no".to_string(),
            details,
            priority: 10,
            status: "in_progress".to_string(),
            attempts: 1,
            last_error: None,
            claimed_at: Some(Utc::now()),
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn payload_str_reads_present_fields() {
        let job = job_with_details(serde_json::json!({"country": "NO"}));
        assert_eq!(payload_str(&job, "country").unwrap(), "NO");
    }

    #[test]
    fn payload_str_rejects_missing_or_non_string_fields() {
        let job = job_with_details(serde_json::json!({"country": 42}));
        assert!(payload_str(&job, "country").is_err());
        assert!(payload_str(&job, "orgNumber").is_err());
    }
}
