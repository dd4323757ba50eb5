//! Read access to the append-only `price_observations` history. Rows are
//! written by [`crate::upsert_offers`].

use chrono::{DateTime, Utc};
use pricenest_core::{normalize_query, PriceObservation};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `price_observations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ObservationRow {
    pub id: i64,
    pub query: String,
    pub store: String,
    pub price: i64,
    /// Listing the price was read from. `NULL` for rows imported without one.
    pub link: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl From<ObservationRow> for PriceObservation {
    fn from(row: ObservationRow) -> Self {
        PriceObservation {
            query: row.query,
            store: row.store,
            price: row.price,
            timestamp: row.observed_at,
        }
    }
}

/// Returns the full observation history for `query`, oldest first.
///
/// Rows sharing a timestamp are returned in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_observations(
    pool: &PgPool,
    query: &str,
) -> Result<Vec<PriceObservation>, DbError> {
    let rows = sqlx::query_as::<_, ObservationRow>(
        "SELECT id, query, store, price, link, observed_at \
         FROM price_observations \
         WHERE query = $1 \
         ORDER BY observed_at ASC, id ASC",
    )
    .bind(normalize_query(query))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PriceObservation::from).collect())
}
