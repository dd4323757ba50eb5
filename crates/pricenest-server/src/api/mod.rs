mod alerts;
mod analytics;
mod compare;
mod offers;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use pricenest_scraper::{FetchPool, ScraperError, SearchClient};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimit, RateLimitState,
    RequestId,
};

/// Longest accepted product query, in characters.
const MAX_QUERY_CHARS: usize = 200;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// `None` when no provider key is configured; fetch routes answer 503.
    pub search: Option<SearchClient>,
    pub fetch_pool: FetchPool,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

/// `?q=` parameter shared by the query-scoped routes.
#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    pub q: Option<String>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            "search_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            "upstream_timeout" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Trims `q` and rejects a missing, blank, or oversized query.
pub(super) fn require_query(request_id: &str, q: Option<&str>) -> Result<String, ApiError> {
    let query = q.map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "query parameter 'q' is required",
        ));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            format!("query must be at most {MAX_QUERY_CHARS} characters"),
        ));
    }
    Ok(query.to_owned())
}

pub(super) fn search_client<'a>(
    state: &'a AppState,
    request_id: &str,
) -> Result<&'a SearchClient, ApiError> {
    state.search.as_ref().ok_or_else(|| {
        ApiError::new(
            request_id,
            "search_unavailable",
            "price search is not configured on this server",
        )
    })
}

pub(super) fn map_db_error(request_id: String, error: &pricenest_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_scraper_error(request_id: String, error: &ScraperError) -> ApiError {
    if error.is_timeout() {
        tracing::warn!(error = %error, "price search timed out");
        return ApiError::new(
            request_id,
            "upstream_timeout",
            "price search did not respond in time",
        );
    }
    if matches!(error, ScraperError::MissingApiKey) {
        return ApiError::new(
            request_id,
            "search_unavailable",
            "price search is not configured on this server",
        );
    }
    tracing::error!(error = %error, "price search failed");
    ApiError::new(request_id, "upstream_error", "price search failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/compare", get(compare::compare))
        .route("/api/v1/offers", get(offers::list_offers))
        .route("/api/v1/analytics", get(analytics::get_analytics))
        .route(
            "/api/v1/alerts",
            get(alerts::list_alerts).post(alerts::create_alert),
        )
        .route(
            "/api/v1/alerts/{id}",
            patch(alerts::update_alert).delete(alerts::delete_alert),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match pricenest_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

/// 120 requests a minute overall, of which at most 20 may start a live
/// price search.
pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(
        RateLimit::new(120, Duration::from_secs(60)),
        RateLimit::new(20, Duration::from_secs(60)),
    )
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
