//! Maintenance loop: keep previously verified records fresh.
//!
//! Selects stale or never-verified records and re-runs registry verification
//! for each, strictly sequentially with a fixed inter-record delay to respect
//! third-party rate limits. Website data is refreshed by its own job type —
//! this loop only rescores with the freshest registry data plus the record's
//! existing website/news signals.

use std::time::Duration;

use serde::Serialize;

use crate::pipeline::{verify_and_score, PipelineContext};

/// Outcome counts for one maintenance run.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct MaintenanceSummary {
    pub processed: usize,
    pub verified: usize,
    pub failed: usize,
}

/// Runs one maintenance pass over up to `limit` stale records.
///
/// A failure on one record is logged and the loop continues — one bad record
/// never aborts the batch. The exception is an explicit rate-limit signal,
/// which ends the run early; the remaining records stay stale and the next
/// scheduled pass picks them up.
pub async fn run_maintenance(ctx: &PipelineContext, limit: i64) -> MaintenanceSummary {
    let mut summary = MaintenanceSummary::default();

    let stale = match orgtrust_db::list_stale_businesses(
        &ctx.pool,
        ctx.config.staleness_threshold_days,
        limit,
    )
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "maintenance: failed to select stale records");
            return summary;
        }
    };

    if stale.is_empty() {
        tracing::info!("maintenance: no stale records; skipping");
        return summary;
    }

    tracing::info!(count = stale.len(), "maintenance: re-verifying stale records");
    let delay = Duration::from_millis(ctx.config.maintenance_inter_record_delay_ms);

    for (index, record) in stale.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        summary.processed += 1;
        match verify_and_score(ctx, &record.country_code, &record.org_number, false).await {
            Ok(status) if status == orgtrust_core::VerificationStatus::Verified => {
                summary.verified += 1;
            }
            Ok(_) => {
                summary.failed += 1;
            }
            Err(e) if e.is_rate_limited() => {
                tracing::warn!(
                    org_number = %record.org_number,
                    "maintenance: registry rate limited — ending run early"
                );
                summary.processed -= 1;
                break;
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(
                    org_number = %record.org_number,
                    country = %record.country_code,
                    error = %e,
                    "maintenance: verification failed — continuing batch"
                );
                mark_failed(ctx, record.id).await;
            }
        }
    }

    tracing::info!(
        processed = summary.processed,
        verified = summary.verified,
        failed = summary.failed,
        "maintenance: run complete"
    );
    summary
}

/// Best-effort failure mark; a storage error here only loses the soft state.
async fn mark_failed(ctx: &PipelineContext, id: i64) {
    if let Err(e) = orgtrust_db::mark_verification_failed(&ctx.pool, id).await {
        tracing::error!(business_id = id, error = %e, "maintenance: failed to mark record");
    }
}
