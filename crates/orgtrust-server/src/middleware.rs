use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer-token auth for the maintenance trigger — the only authenticated
/// surface of the pipeline.
#[derive(Debug, Clone)]
pub struct MaintenanceAuth {
    token: Option<Arc<str>>,
    pub enabled: bool,
}

impl MaintenanceAuth {
    /// Builds auth config from the maintenance token.
    ///
    /// In development a missing token disables auth for local iteration.
    /// In non-development environments a missing token fails startup.
    ///
    /// # Errors
    ///
    /// Returns an error when the token is missing outside development.
    pub fn from_token(token: Option<&str>, is_development: bool) -> anyhow::Result<Self> {
        match token {
            Some(token) if !token.trim().is_empty() => Ok(Self {
                token: Some(Arc::from(token)),
                enabled: true,
            }),
            _ if is_development => {
                tracing::warn!(
                    "ORGTRUST_MAINTENANCE_TOKEN not set; trigger auth disabled in development"
                );
                Ok(Self {
                    token: None,
                    enabled: false,
                })
            }
            _ => anyhow::bail!(
                "ORGTRUST_MAINTENANCE_TOKEN is required outside development; \
                 provide a shared secret for the maintenance trigger"
            ),
        }
    }

    /// Constant-time token comparison; length mismatches compare unequal.
    fn allows(&self, provided: &str) -> bool {
        self.token
            .as_deref()
            .is_some_and(|expected| expected.as_bytes().ct_eq(provided.as_bytes()).into())
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Sliding fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing the maintenance bearer token when enabled.
pub async fn require_maintenance_token(
    State(auth): State<MaintenanceAuth>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let token = extract_bearer_token(req.headers().get(AUTHORIZATION));

    match token {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "unauthorized",
                    message: "missing or invalid bearer token",
                },
            }),
        )
            .into_response(),
    }
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "rate_limited",
                    message: "rate limit exceeded",
                },
            }),
        )
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_disables_when_no_token_in_dev() {
        let auth = MaintenanceAuth::from_token(None, true).expect("dev should allow missing token");
        assert!(!auth.enabled);
    }

    #[test]
    fn auth_fails_startup_without_token_outside_dev() {
        assert!(MaintenanceAuth::from_token(None, false).is_err());
    }

    #[test]
    fn auth_accepts_exact_token_only() {
        let auth = MaintenanceAuth::from_token(Some("s3cret"), false).expect("should build");
        assert!(auth.allows("s3cret"));
        assert!(!auth.allows("s3cret "));
        assert!(!auth.allows("wrong"));
        assert!(!auth.allows(""));
    }
}
