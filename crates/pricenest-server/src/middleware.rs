//! Request id, bearer auth, and rate limiting for the protected routes.
//!
//! Routes that trigger a live price search spend provider quota, so they are
//! limited by their own, tighter window on top of the general one.

use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

const API_KEYS_VAR: &str = "PRICENEST_API_KEYS";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map_or_else(String::new, |id| id.0.clone())
}

/// Tags every request with an id, taken from `x-request-id` when the caller
/// sent one, and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));
    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    res
}

// ---------------------------------------------------------------------------
// Bearer auth
// ---------------------------------------------------------------------------

/// Accepted bearer tokens. An empty set means auth is off.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
}

impl AuthState {
    /// Reads comma-separated tokens from `PRICENEST_API_KEYS`.
    ///
    /// # Errors
    ///
    /// Returns an error outside development when no keys are configured.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var(API_KEYS_VAR).unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    /// Parses a comma-separated token list. Development tolerates an empty
    /// list and runs without auth.
    ///
    /// # Errors
    ///
    /// Returns an error outside development when `raw` holds no keys.
    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let api_keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if api_keys.is_empty() {
            if !is_development {
                anyhow::bail!("{API_KEYS_VAR} must list at least one bearer token");
            }
            tracing::warn!("{API_KEYS_VAR} empty; API auth disabled in development");
        }

        Ok(Self {
            api_keys: Arc::new(api_keys),
        })
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys.contains(token)
    }
}

fn bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled() {
        return next.run(req).await;
    }

    match bearer_token(req.headers().get(header::AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => ApiError::new(
            request_id_of(&req),
            "unauthorized",
            "missing or invalid bearer token",
        )
        .into_response(),
    }
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

/// `max_requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: usize,
    pub window: Duration,
}

impl RateLimit {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

#[derive(Debug)]
struct FixedWindow {
    started_at: Instant,
    count: usize,
}

impl FixedWindow {
    fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            count: 0,
        }
    }

    /// Counts one request. On rejection returns how long until the window
    /// resets.
    fn admit(&mut self, limit: RateLimit, now: Instant) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.started_at);
        if elapsed >= limit.window {
            self.started_at = now;
            self.count = 0;
        }
        if self.count >= limit.max_requests {
            return Err(limit.window.saturating_sub(elapsed));
        }
        self.count += 1;
        Ok(())
    }
}

/// Whether a request triggers a live provider search.
fn spends_search_quota(method: &Method, path: &str) -> bool {
    matches!(
        (method, path),
        (&Method::GET, "/api/v1/compare") | (&Method::POST, "/api/v1/alerts")
    )
}

/// Shared limiter state: one window for all protected traffic and a second
/// one for routes that hit the price-search provider.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    general: RateLimit,
    search: RateLimit,
    general_window: Arc<Mutex<FixedWindow>>,
    search_window: Arc<Mutex<FixedWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(general: RateLimit, search: RateLimit) -> Self {
        let now = Instant::now();
        Self {
            general,
            search,
            general_window: Arc::new(Mutex::new(FixedWindow::new(now))),
            search_window: Arc::new(Mutex::new(FixedWindow::new(now))),
        }
    }

    async fn admit(&self, spends_quota: bool) -> Result<(), Duration> {
        let now = Instant::now();
        if spends_quota {
            self.search_window.lock().await.admit(self.search, now)?;
        }
        self.general_window.lock().await.admit(self.general, now)
    }
}

pub async fn enforce_rate_limit(
    State(limits): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let spends_quota = spends_search_quota(req.method(), req.uri().path());

    match limits.admit(spends_quota).await {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            let message = if spends_quota {
                "price search rate limit exceeded"
            } else {
                "rate limit exceeded"
            };
            tracing::warn!(
                path = req.uri().path(),
                retry_after_secs = retry_after.as_secs(),
                "request rate limited"
            );
            let mut res = ApiError::new(request_id_of(&req), "rate_limited", message)
                .into_response();
            // Round up so clients never retry inside the window.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            if let Ok(val) = HeaderValue::from_str(&secs.max(1).to_string()) {
                res.headers_mut().insert(header::RETRY_AFTER, val);
            }
            res
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_read_from_authorization_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(bearer_token(Some(&header)), Some("test-token"));

        let basic = HeaderValue::from_static("Basic abc123");
        assert_eq!(bearer_token(Some(&basic)), None);

        let blank = HeaderValue::from_static("Bearer   ");
        assert_eq!(bearer_token(Some(&blank)), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn empty_key_list_disables_auth_only_in_development() {
        let dev = AuthState::from_keys("", true).expect("dev allows missing keys");
        assert!(!dev.enabled());
        assert!(AuthState::from_keys(" , ", false).is_err());
    }

    #[test]
    fn key_list_is_trimmed_and_split() {
        let state = AuthState::from_keys(" alpha , beta,,", false).expect("keys present");
        assert!(state.enabled());
        assert!(state.allows("alpha"));
        assert!(state.allows("beta"));
        assert!(!state.allows(""));
    }

    #[test]
    fn only_live_search_routes_spend_quota() {
        assert!(spends_search_quota(&Method::GET, "/api/v1/compare"));
        assert!(spends_search_quota(&Method::POST, "/api/v1/alerts"));
        assert!(!spends_search_quota(&Method::GET, "/api/v1/alerts"));
        assert!(!spends_search_quota(&Method::GET, "/api/v1/offers"));
        assert!(!spends_search_quota(&Method::GET, "/api/v1/analytics"));
    }

    #[test]
    fn fixed_window_rejects_then_resets() {
        let limit = RateLimit::new(2, Duration::from_secs(60));
        let start = Instant::now();
        let mut window = FixedWindow::new(start);

        assert!(window.admit(limit, start).is_ok());
        assert!(window.admit(limit, start + Duration::from_secs(1)).is_ok());

        let retry = window
            .admit(limit, start + Duration::from_secs(20))
            .expect_err("third request is over the limit");
        assert_eq!(retry, Duration::from_secs(40));

        assert!(window.admit(limit, start + Duration::from_secs(60)).is_ok());
    }

    #[tokio::test]
    async fn search_window_is_separate_from_general_window() {
        let limits = RateLimitState::new(
            RateLimit::new(10, Duration::from_secs(60)),
            RateLimit::new(1, Duration::from_secs(60)),
        );

        assert!(limits.admit(true).await.is_ok());
        assert!(limits.admit(true).await.is_err());
        // Stored-data routes keep working while search is throttled.
        assert!(limits.admit(false).await.is_ok());
    }
}
