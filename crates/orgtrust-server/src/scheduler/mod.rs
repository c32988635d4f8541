//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring pipeline jobs: the daily maintenance pass, the stale-lease
//! reclaim, the failed-AI-analysis requeue, and the weekly discovery seeding.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use orgtrust_db::{JobType, NewCrawlJob};

use crate::maintenance::run_maintenance;
use crate::pipeline::PipelineContext;

/// How many failed analyses one requeue pass resets.
const ANALYSIS_REQUEUE_LIMIT: i64 = 100;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(ctx: Arc<PipelineContext>) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_maintenance_job(&scheduler, Arc::clone(&ctx)).await?;
    register_lease_reclaim_job(&scheduler, Arc::clone(&ctx)).await?;
    register_analysis_requeue_job(&scheduler, Arc::clone(&ctx)).await?;
    register_discovery_job(&scheduler, ctx).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the daily maintenance pass.
///
/// Runs at 03:00 UTC by default (`0 0 3 * * *`) and can be overridden with
/// `ORGTRUST_MAINTENANCE_CRON`.
async fn register_maintenance_job(
    scheduler: &JobScheduler,
    ctx: Arc<PipelineContext>,
) -> Result<(), JobSchedulerError> {
    let cron =
        std::env::var("ORGTRUST_MAINTENANCE_CRON").unwrap_or_else(|_| "0 0 3 * * *".to_string());

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let ctx = Arc::clone(&ctx);
        Box::pin(async move {
            tracing::info!("scheduler: starting daily maintenance run");
            let limit = ctx.config.maintenance_batch_limit;
            let summary = run_maintenance(&ctx, limit).await;
            tracing::info!(
                processed = summary.processed,
                verified = summary.verified,
                failed = summary.failed,
                "scheduler: daily maintenance run complete"
            );
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered maintenance job");
    Ok(())
}

/// Register the stale-lease reclaim, every five minutes.
///
/// Returns jobs claimed by crashed workers to `pending` so no work is
/// permanently blocked.
async fn register_lease_reclaim_job(
    scheduler: &JobScheduler,
    ctx: Arc<PipelineContext>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 */5 * * * *", move |_uuid, _lock| {
        let ctx = Arc::clone(&ctx);
        Box::pin(async move {
            match orgtrust_db::reclaim_stale_jobs(&ctx.pool, ctx.config.queue_lease_secs).await {
                Ok(0) => {}
                Ok(reclaimed) => {
                    tracing::warn!(reclaimed, "scheduler: reclaimed stale job leases");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: lease reclaim failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!("scheduler: registered lease reclaim job");
    Ok(())
}

/// Register the daily failed-AI-analysis requeue.
///
/// Runs at 04:30 UTC (`0 30 4 * * *`). Finds records whose analysis is
/// unavailable, nulls the analysis and fingerprint, and enqueues rescan jobs
/// so exactly these records get a fresh AI pass without re-scraping the
/// whole corpus.
async fn register_analysis_requeue_job(
    scheduler: &JobScheduler,
    ctx: Arc<PipelineContext>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 30 4 * * *", move |_uuid, _lock| {
        let ctx = Arc::clone(&ctx);
        Box::pin(async move {
            tracing::info!("scheduler: starting failed-analysis requeue");
            run_analysis_requeue(&ctx).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!("scheduler: registered analysis requeue job");
    Ok(())
}

async fn run_analysis_requeue(ctx: &PipelineContext) {
    let failed = match orgtrust_db::list_failed_analyses(&ctx.pool, ANALYSIS_REQUEUE_LIMIT).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to list failed analyses");
            return;
        }
    };

    if failed.is_empty() {
        tracing::info!("scheduler: no failed analyses; skipping");
        return;
    }

    let ids: Vec<i64> = failed.iter().map(|b| b.id).collect();
    if let Err(e) = orgtrust_db::reset_failed_analyses(&ctx.pool, &ids).await {
        tracing::error!(error = %e, "scheduler: failed to reset analyses");
        return;
    }

    let mut enqueued = 0usize;
    for record in &failed {
        let Some(domain) = record.domain.as_deref() else {
            continue;
        };
        match enqueue_rescan(ctx, domain, record).await {
            Ok(true) => enqueued += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    org_number = %record.org_number,
                    error = %e,
                    "scheduler: rescan enqueue failed"
                );
            }
        }
    }

    tracing::info!(
        reset = ids.len(),
        enqueued,
        "scheduler: failed-analysis requeue complete"
    );
}

async fn enqueue_rescan(
    ctx: &PipelineContext,
    domain: &str,
    record: &orgtrust_db::BusinessRow,
) -> Result<bool, orgtrust_db::DbError> {
    if orgtrust_db::job_exists_for_target(&ctx.pool, JobType::Rescan, domain).await? {
        return Ok(false);
    }
    orgtrust_db::enqueue(
        &ctx.pool,
        &NewCrawlJob {
            job_type: JobType::Rescan,
            target: domain,
            details: serde_json::json!({
                "country": record.country_code,
                "orgNumber": record.org_number,
            }),
            priority: 20,
        },
    )
    .await?;
    Ok(true)
}

/// Register the weekly discovery seeding.
///
/// Runs Monday 05:00 UTC (`0 0 5 * * MON`). Loads the seeds file and
/// enqueues one `discover` job per jurisdiction/industry slice that does not
/// already have one queued.
async fn register_discovery_job(
    scheduler: &JobScheduler,
    ctx: Arc<PipelineContext>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 0 5 * * MON", move |_uuid, _lock| {
        let ctx = Arc::clone(&ctx);
        Box::pin(async move {
            tracing::info!("scheduler: starting weekly discovery seeding");
            run_discovery_seeding(&ctx).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!("scheduler: registered discovery job");
    Ok(())
}

async fn run_discovery_seeding(ctx: &PipelineContext) {
    let seeds = match orgtrust_core::load_seeds(&ctx.config.seeds_path) {
        Ok(file) => file.seeds,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load seeds file");
            return;
        }
    };

    let mut enqueued = 0usize;
    for seed in &seeds {
        let target = format!("{}:{}", seed.country.to_uppercase(), seed.nace_code);
        match orgtrust_db::job_exists_for_target(&ctx.pool, JobType::Discover, &target).await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(target = %target, error = %e, "scheduler: dedup check failed");
                continue;
            }
        }

        let result = orgtrust_db::enqueue(
            &ctx.pool,
            &NewCrawlJob {
                job_type: JobType::Discover,
                target: &target,
                details: serde_json::json!({
                    "country": seed.country.to_uppercase(),
                    "naceCode": seed.nace_code,
                }),
                priority: seed.priority,
            },
        )
        .await;

        match result {
            Ok(_) => enqueued += 1,
            Err(e) => {
                tracing::warn!(target = %target, error = %e, "scheduler: discover enqueue failed");
            }
        }
    }

    tracing::info!(
        seeds = seeds.len(),
        enqueued,
        "scheduler: discovery seeding complete"
    );
}
