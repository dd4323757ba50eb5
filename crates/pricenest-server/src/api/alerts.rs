//! Price-alert handlers: create, list by email, pause/resume, delete.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pricenest_core::{format_inr, PRICE_MAX, PRICE_MIN};
use pricenest_db::{AlertRow, DbError, NewAlert};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, require_query, ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_EMAIL_CHARS: usize = 254;
const DEFAULT_NOTIFY_METHOD: &str = "email";

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateAlertRequest {
    pub email: String,
    pub query: String,
    pub target_price: i64,
    pub notify_method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateAlertRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct AlertListParams {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AlertItem {
    id: Uuid,
    email: String,
    query: String,
    target_price: i64,
    notify_method: String,
    last_alerted_price: Option<i64>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AlertRow> for AlertItem {
    fn from(row: AlertRow) -> Self {
        Self {
            id: row.public_id,
            email: row.email,
            query: row.query,
            target_price: row.target_price,
            notify_method: row.notify_method,
            last_alerted_price: row.last_alerted_price,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_email(req_id: &str, value: &str) -> Result<String, ApiError> {
    let email = value.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    let too_long = email.chars().count() > MAX_EMAIL_CHARS;
    if !well_formed || too_long || email.contains(char::is_whitespace) {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("'{email}' is not a valid email address"),
        ));
    }
    Ok(email.to_owned())
}

fn validate_target_price(req_id: &str, value: i64) -> Result<(), ApiError> {
    if (PRICE_MIN..=PRICE_MAX).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::new(
            req_id,
            "validation_error",
            format!(
                "target_price must be between {} and {}",
                format_inr(PRICE_MIN),
                format_inr(PRICE_MAX)
            ),
        ))
    }
}

fn validate_notify_method(req_id: &str, value: Option<&str>) -> Result<String, ApiError> {
    match value.map(str::trim) {
        None | Some(DEFAULT_NOTIFY_METHOD) => Ok(DEFAULT_NOTIFY_METHOD.to_owned()),
        Some(other) => Err(ApiError::new(
            req_id,
            "validation_error",
            format!("notify_method must be 'email', got '{other}'"),
        )),
    }
}

fn parse_alert_id(req_id: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::new(
            req_id,
            "validation_error",
            format!("'{raw}' is not a valid alert id"),
        )
    })
}

fn map_alert_error(req_id: &str, e: &DbError) -> ApiError {
    if matches!(e, DbError::NotFound) {
        return ApiError::new(req_id, "not_found", "alert not found");
    }
    map_db_error(req_id.to_owned(), e)
}

/// Captures offers for a query nobody has searched yet so the first alert
/// check has history to compare against. Failures only log.
async fn seed_offers_if_missing(state: &AppState, query: &str) {
    let Some(client) = state.search.as_ref() else {
        return;
    };

    match pricenest_db::get_offers(&state.pool, query).await {
        Ok(existing) if !existing.is_empty() => return,
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(query, error = %e, "alert seed: could not read offers");
            return;
        }
    }

    let comparison =
        match pricenest_scraper::compare_product(client, &state.fetch_pool, query).await {
            Ok(comparison) => comparison,
            Err(e) => {
                tracing::warn!(query, error = %e, "alert seed: price search failed");
                return;
            }
        };

    if let Err(e) = pricenest_db::upsert_offers(&state.pool, query, &comparison.offers).await {
        tracing::warn!(query, error = %e, "alert seed: failed to store offers");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/alerts: register a price alert.
pub(super) async fn create_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AlertItem>>), ApiError> {
    let rid = &req_id.0;

    let email = validate_email(rid, &body.email)?;
    let query = require_query(rid, Some(body.query.as_str()))?;
    validate_target_price(rid, body.target_price)?;
    let notify_method = validate_notify_method(rid, body.notify_method.as_deref())?;

    seed_offers_if_missing(&state, &query).await;

    let row = pricenest_db::create_alert(
        &state.pool,
        &NewAlert {
            email,
            query,
            target_price: body.target_price,
            notify_method,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(alert_id = row.id, query = %row.query, "alert created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: AlertItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/alerts?email=: alerts registered by one address.
pub(super) async fn list_alerts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<AlertListParams>,
) -> Result<Json<ApiResponse<Vec<AlertItem>>>, ApiError> {
    let rid = &req_id.0;
    let Some(raw_email) = params.email.as_deref() else {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "query parameter 'email' is required",
        ));
    };
    let email = validate_email(rid, raw_email)?;

    let rows = pricenest_db::list_alerts_for_email(&state.pool, &email)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(AlertItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PATCH /api/v1/alerts/:id: pause or resume an alert.
pub(super) async fn update_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<UpdateAlertRequest>,
) -> Result<Json<ApiResponse<AlertItem>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_alert_id(rid, &id)?;

    let row = pricenest_db::set_alert_active(&state.pool, public_id, body.is_active)
        .await
        .map_err(|e| map_alert_error(rid, &e))?;

    Ok(Json(ApiResponse {
        data: AlertItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/alerts/:id: remove an alert permanently.
pub(super) async fn delete_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_alert_id(rid, &id)?;

    pricenest_db::delete_alert(&state.pool, public_id)
        .await
        .map_err(|e| map_alert_error(rid, &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert_eq!(
            validate_email("r", "  buyer@example.com ").expect("valid"),
            "buyer@example.com"
        );
    }

    #[test]
    fn email_validation_rejects_malformed_addresses() {
        for bad in ["", "buyer", "@example.com", "buyer@localhost", "a b@example.com"] {
            assert!(validate_email("r", bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn target_price_must_be_in_tracked_range() {
        assert!(validate_target_price("r", PRICE_MIN).is_ok());
        assert!(validate_target_price("r", PRICE_MAX).is_ok());
        assert!(validate_target_price("r", PRICE_MIN - 1).is_err());
        assert!(validate_target_price("r", PRICE_MAX + 1).is_err());
    }

    #[test]
    fn notify_method_defaults_to_email() {
        assert_eq!(validate_notify_method("r", None).expect("default"), "email");
        assert_eq!(
            validate_notify_method("r", Some("email")).expect("email"),
            "email"
        );
        assert!(validate_notify_method("r", Some("sms")).is_err());
    }

    #[test]
    fn alert_ids_are_uuids() {
        assert!(parse_alert_id("r", "67e55044-10b1-426f-9247-bb680e5fe0c8").is_ok());
        assert!(parse_alert_id("r", "42").is_err());
    }

    #[test]
    fn alert_item_exposes_public_id() {
        let public_id = Uuid::new_v4();
        let item = AlertItem::from(AlertRow {
            id: 99,
            public_id,
            email: "buyer@example.com".to_string(),
            query: "iphone 15".to_string(),
            target_price: 60_000,
            notify_method: "email".to_string(),
            last_alerted_price: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["id"], public_id.to_string());
        assert_eq!(json["target_price"], 60_000);
        assert!(json["last_alerted_price"].is_null());
    }
}
