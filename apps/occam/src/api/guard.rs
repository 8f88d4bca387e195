//! # Request Guard
//!
//! Access control for the Occam HTTP API, built once from [`ServerConfig`]:
//!
//! - **API key**: when configured (`OCCAM_API_KEY`), every route except
//!   `/health` requires `Authorization: Bearer <key>` (a bare key is also
//!   accepted).
//! - **Step quota**: a global `governor` quota of `rate_limit` decisions per
//!   second on `POST /step`. Introspection routes are not metered.
//!
//! Rejections carry the same ERROR body as `/step`, so clients parse one
//! shape.

use super::{HEALTH_PATH, STEP_PATH};
use crate::config::ServerConfig;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use occam_core::StepResponse;
use std::num::NonZeroU32;
use std::sync::Arc;
use subtle::ConstantTimeEq;

// =============================================================================
// API KEY
// =============================================================================

/// A non-empty API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key; empty or whitespace-only keys disable authentication.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        (!key.trim().is_empty()).then_some(Self(key))
    }

    /// Constant-time comparison against a presented credential.
    ///
    /// Both sides are padded to the longer length so the comparison time
    /// does not depend on where the first mismatch is.
    #[must_use]
    pub fn matches(&self, provided: &str) -> bool {
        let expected = self.0.as_bytes();
        let provided = provided.as_bytes();

        let len = expected.len().max(provided.len());
        let mut lhs = vec![0u8; len];
        let mut rhs = vec![0u8; len];
        lhs[..expected.len()].copy_from_slice(expected);
        rhs[..provided.len()].copy_from_slice(provided);

        bool::from(lhs.ct_eq(&rhs)) && expected.len() == provided.len()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

// =============================================================================
// REJECTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    MissingCredentials,
    InvalidCredentials,
    StepQuotaExceeded,
}

impl Rejection {
    fn reason(self) -> &'static str {
        match self {
            Rejection::MissingCredentials => "missing_authorization_header",
            Rejection::InvalidCredentials => "invalid_api_key",
            Rejection::StepQuotaExceeded => "step_quota_exceeded",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Rejection::MissingCredentials | Rejection::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Unauthorized")
            }
            Rejection::StepQuotaExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many step requests, retry shortly",
            ),
        };
        (status, Json(StepResponse::error(message))).into_response()
    }
}

// =============================================================================
// GUARD
// =============================================================================

type StepRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Access policy shared by every request.
#[derive(Clone, Default)]
pub struct RequestGuard {
    api_key: Option<ApiKey>,
    step_quota: Option<Arc<StepRateLimiter>>,
}

impl RequestGuard {
    /// Build the guard from server settings. A `rate_limit` of 0 leaves
    /// `/step` unmetered.
    #[must_use]
    pub fn from_settings(settings: &ServerConfig) -> Self {
        let step_quota = NonZeroU32::new(settings.rate_limit)
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));

        Self {
            api_key: settings.api_key.clone(),
            step_quota,
        }
    }

    /// Whether an API key is required.
    #[must_use]
    pub fn requires_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Whether `POST /step` is metered.
    #[must_use]
    pub fn meters_steps(&self) -> bool {
        self.step_quota.is_some()
    }

    /// Admit or reject a request. Credentials are checked before the quota
    /// so rejected callers do not consume it.
    fn check(&self, request: &Request<Body>) -> Result<(), Rejection> {
        let path = request.uri().path();

        if let Some(expected) = &self.api_key
            && path != HEALTH_PATH
        {
            let provided = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .ok_or(Rejection::MissingCredentials)?;
            let provided = provided.strip_prefix("Bearer ").unwrap_or(provided);
            if !expected.matches(provided) {
                return Err(Rejection::InvalidCredentials);
            }
        }

        if let Some(quota) = &self.step_quota
            && request.method() == Method::POST
            && path == STEP_PATH
            && quota.check().is_err()
        {
            return Err(Rejection::StepQuotaExceeded);
        }

        Ok(())
    }
}

/// Middleware applying a [`RequestGuard`].
pub async fn guard_middleware(
    State(guard): State<RequestGuard>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match guard.check(&request) {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            tracing::warn!(
                event = "request_rejected",
                reason = rejection.reason(),
                method = %request.method(),
                path = %request.uri().path(),
                "Request rejected"
            );
            rejection.into_response()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, path: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).expect("request")
    }

    fn guard(api_key: Option<&str>, rate_limit: u32) -> RequestGuard {
        RequestGuard::from_settings(&ServerConfig {
            api_key: api_key.and_then(ApiKey::new),
            rate_limit,
            ..ServerConfig::default()
        })
    }

    #[test]
    fn api_key_matches_exactly() {
        let key = ApiKey::new("s3cret").expect("key");
        assert!(key.matches("s3cret"));
        assert!(!key.matches("s3cre"));
        assert!(!key.matches("s3cret\0"));
        assert!(!key.matches(""));
    }

    #[test]
    fn api_key_rejects_blank_and_redacts() {
        assert!(ApiKey::new("").is_none());
        assert!(ApiKey::new("   ").is_none());
        let key = ApiKey::new("hunter2").expect("key");
        assert!(!format!("{key:?}").contains("hunter2"));
    }

    #[test]
    fn quota_meters_only_step_posts() {
        let guard = guard(None, 1);
        assert!(guard.meters_steps());

        assert_eq!(guard.check(&request(Method::POST, "/step", None)), Ok(()));
        assert_eq!(
            guard.check(&request(Method::POST, "/step", None)),
            Err(Rejection::StepQuotaExceeded)
        );
        for path in ["/health", "/stages", "/prompts"] {
            assert_eq!(guard.check(&request(Method::GET, path, None)), Ok(()));
        }
    }

    #[test]
    fn zero_rate_limit_disables_quota() {
        let guard = guard(None, 0);
        assert!(!guard.meters_steps());
        for _ in 0..10 {
            assert_eq!(guard.check(&request(Method::POST, "/step", None)), Ok(()));
        }
    }

    #[test]
    fn credentials_checked_before_quota() {
        let guard = guard(Some("key"), 1);
        assert!(guard.requires_key());

        assert_eq!(
            guard.check(&request(Method::POST, "/step", Some("Bearer nope"))),
            Err(Rejection::InvalidCredentials)
        );
        assert_eq!(
            guard.check(&request(Method::POST, "/step", None)),
            Err(Rejection::MissingCredentials)
        );
        // The rejected calls above left the single permit unused.
        assert_eq!(
            guard.check(&request(Method::POST, "/step", Some("Bearer key"))),
            Ok(())
        );
    }

    #[test]
    fn health_is_open_without_credentials() {
        let guard = guard(Some("key"), 0);
        assert_eq!(guard.check(&request(Method::GET, "/health", None)), Ok(()));
        assert_eq!(
            guard.check(&request(Method::GET, "/stages", None)),
            Err(Rejection::MissingCredentials)
        );
    }
}
