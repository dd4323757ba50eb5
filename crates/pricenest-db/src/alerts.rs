//! Database operations for `alerts`.

use chrono::{DateTime, Utc};
use pricenest_core::normalize_query;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `alerts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertRow {
    pub id: i64,
    pub public_id: Uuid,
    pub email: String,
    /// Normalized query key (trimmed, lowercased).
    pub query: String,
    pub target_price: i64,
    /// Only `"email"` is delivered today; stored for forward compatibility.
    pub notify_method: String,
    /// Price included in the last notification sent, if any.
    pub last_alerted_price: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`create_alert`].
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub email: String,
    pub query: String,
    pub target_price: i64,
    pub notify_method: String,
}

const ALERT_COLUMNS: &str = "id, public_id, email, query, target_price, notify_method, \
                             last_alerted_price, is_active, created_at, updated_at";

// ---------------------------------------------------------------------------
// alerts operations
// ---------------------------------------------------------------------------

/// Creates an active alert. The query is normalized before storage.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_alert(pool: &PgPool, alert: &NewAlert) -> Result<AlertRow, DbError> {
    let row = sqlx::query_as::<_, AlertRow>(&format!(
        "INSERT INTO alerts (public_id, email, query, target_price, notify_method) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {ALERT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(alert.email.trim())
    .bind(normalize_query(&alert.query))
    .bind(alert.target_price)
    .bind(&alert.notify_method)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches one alert by its public id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_alert(pool: &PgPool, public_id: Uuid) -> Result<Option<AlertRow>, DbError> {
    let row = sqlx::query_as::<_, AlertRow>(&format!(
        "SELECT {ALERT_COLUMNS} FROM alerts WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists every alert registered by `email`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_alerts_for_email(pool: &PgPool, email: &str) -> Result<Vec<AlertRow>, DbError> {
    let rows = sqlx::query_as::<_, AlertRow>(&format!(
        "SELECT {ALERT_COLUMNS} FROM alerts \
         WHERE email = $1 \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(email.trim())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Lists active alerts, oldest first. Used by the scheduled alert check.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_alerts(pool: &PgPool) -> Result<Vec<AlertRow>, DbError> {
    let rows = sqlx::query_as::<_, AlertRow>(&format!(
        "SELECT {ALERT_COLUMNS} FROM alerts \
         WHERE is_active \
         ORDER BY id ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Activates or pauses an alert.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no alert has `public_id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_alert_active(
    pool: &PgPool,
    public_id: Uuid,
    is_active: bool,
) -> Result<AlertRow, DbError> {
    sqlx::query_as::<_, AlertRow>(&format!(
        "UPDATE alerts SET is_active = $2, updated_at = NOW() \
         WHERE public_id = $1 \
         RETURNING {ALERT_COLUMNS}"
    ))
    .bind(public_id)
    .bind(is_active)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Deletes an alert.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no alert has `public_id`, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_alert(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM alerts WHERE public_id = $1")
        .bind(public_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Stores the price just sent in a notification so the same price does not
/// trigger again.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the alert no longer exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn record_alerted_price(pool: &PgPool, id: i64, price: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE alerts SET last_alerted_price = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(price)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
