//! Read-only business record endpoint.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use orgtrust_db::BusinessRow;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub(super) struct BusinessDetail {
    pub org_number: String,
    pub country_code: String,
    pub legal_name: Option<String>,
    pub verification_status: String,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub domain: Option<String>,
    pub company_description: Option<String>,
    pub products: Option<serde_json::Value>,
    pub services: Option<serde_json::Value>,
    pub quality_analysis: Option<serde_json::Value>,
    pub ssl_valid: Option<bool>,
    pub website_last_crawled: Option<DateTime<Utc>>,
    pub trust_score: Option<i32>,
    pub trust_score_breakdown: Option<serde_json::Value>,
    pub news_signals: Option<serde_json::Value>,
}

impl From<BusinessRow> for BusinessDetail {
    fn from(row: BusinessRow) -> Self {
        Self {
            org_number: row.org_number,
            country_code: row.country_code,
            legal_name: row.legal_name,
            verification_status: row.verification_status,
            last_verified_at: row.last_verified_at,
            domain: row.domain,
            company_description: row.company_description,
            products: row.products,
            services: row.services,
            quality_analysis: row.quality_analysis,
            ssl_valid: row.ssl_valid,
            website_last_crawled: row.website_last_crawled,
            trust_score: row.trust_score,
            trust_score_breakdown: row.trust_score_breakdown,
            news_signals: row.news_signals,
        }
    }
}

pub(super) async fn get_business(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((country, org_number)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let row = orgtrust_db::get_business(&state.ctx.pool, &country, &org_number)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    match row {
        Some(row) => Ok(Json(ApiResponse {
            data: BusinessDetail::from(row),
            meta: ResponseMeta::new(req_id.0),
        })),
        None => Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("no business {org_number} in {country}"),
        )),
    }
}
