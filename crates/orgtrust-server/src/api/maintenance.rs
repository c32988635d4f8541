//! On-demand maintenance trigger.
//!
//! The only authenticated surface of the pipeline: the bearer token is
//! checked by [`crate::middleware::require_maintenance_token`] before this
//! handler runs. The pass itself executes in the background — it is
//! deliberately slow (fixed inter-record delays), so the trigger returns
//! 202 Accepted with the run's parameters rather than holding the connection.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::{ApiResponse, AppState, ResponseMeta};
use crate::maintenance::run_maintenance;
use crate::middleware::RequestId;

#[derive(Debug, Default, Deserialize)]
pub(super) struct TriggerBody {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct TriggerAccepted {
    status: &'static str,
    limit: i64,
}

pub(super) async fn trigger_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Option<Json<TriggerBody>>,
) -> impl IntoResponse {
    let requested = body.and_then(|Json(b)| b.limit);
    let limit = requested
        .unwrap_or(state.ctx.config.maintenance_batch_limit)
        .clamp(1, 1000);

    tracing::info!(limit, "maintenance: on-demand run triggered");

    let ctx = Arc::clone(&state.ctx);
    tokio::spawn(async move {
        run_maintenance(&ctx, limit).await;
    });

    (
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: TriggerAccepted {
                status: "started",
                limit,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}
