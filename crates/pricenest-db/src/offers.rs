//! Database operations for `offers` and the observation append that
//! accompanies every offer capture.

use chrono::{DateTime, Utc};
use pricenest_core::{normalize_query, NormalizedOffer, StoredOffer};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `offers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferRow {
    pub id: i64,
    /// Normalized query key (trimmed, lowercased).
    pub query: String,
    pub title: String,
    pub store: String,
    pub link: String,
    pub price: i64,
    pub image: Option<String>,
    pub store_logo: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl From<OfferRow> for StoredOffer {
    fn from(row: OfferRow) -> Self {
        StoredOffer {
            id: row.id,
            query: row.query,
            offer: NormalizedOffer {
                title: row.title,
                store: row.store,
                link: row.link,
                price: row.price,
                image: row.image,
                store_logo: row.store_logo,
            },
            captured_at: row.captured_at,
        }
    }
}

const OFFER_COLUMNS: &str =
    "id, query, title, store, link, price, image, store_logo, captured_at";

// ---------------------------------------------------------------------------
// offers operations
// ---------------------------------------------------------------------------

/// Records one capture of `offers` for `query`.
///
/// Each offer is upserted on `(query, link)`: an existing row has its price,
/// title, store, image, store logo, and `captured_at` overwritten in place.
/// One `price_observations` row is appended per offer regardless. Everything
/// runs in a single transaction and every row of the capture shares one
/// timestamp, so reapplying a batch leaves one offer row per link while the
/// observation history grows.
///
/// Offer rows are written in `link` order so concurrent captures of the same
/// query lock rows in the same sequence and cannot deadlock. Observations are
/// appended in input order.
///
/// Returns the stored offers in input order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written in
/// that case.
pub async fn upsert_offers(
    pool: &PgPool,
    query: &str,
    offers: &[NormalizedOffer],
) -> Result<Vec<StoredOffer>, DbError> {
    let key = normalize_query(query);
    let captured_at = Utc::now();

    let mut lock_order: Vec<usize> = (0..offers.len()).collect();
    lock_order.sort_by(|&a, &b| offers[a].link.cmp(&offers[b].link));

    let mut stored: Vec<Option<StoredOffer>> = vec![None; offers.len()];

    let mut tx = pool.begin().await?;

    for index in lock_order {
        let offer = &offers[index];
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "INSERT INTO offers \
                 (query, title, store, link, price, image, store_logo, captured_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (query, link) DO UPDATE SET \
                 title       = EXCLUDED.title, \
                 store       = EXCLUDED.store, \
                 price       = EXCLUDED.price, \
                 image       = EXCLUDED.image, \
                 store_logo  = EXCLUDED.store_logo, \
                 captured_at = EXCLUDED.captured_at \
             RETURNING {OFFER_COLUMNS}"
        ))
        .bind(&key)
        .bind(&offer.title)
        .bind(&offer.store)
        .bind(&offer.link)
        .bind(offer.price)
        .bind(&offer.image)
        .bind(&offer.store_logo)
        .bind(captured_at)
        .fetch_one(&mut *tx)
        .await?;

        stored[index] = Some(StoredOffer::from(row));
    }

    for offer in offers {
        sqlx::query(
            "INSERT INTO price_observations (query, store, price, link, observed_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&key)
        .bind(&offer.store)
        .bind(offer.price)
        .bind(&offer.link)
        .bind(captured_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(stored.into_iter().flatten().collect())
}

/// Returns the current offers for `query`, cheapest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_offers(pool: &PgPool, query: &str) -> Result<Vec<StoredOffer>, DbError> {
    let rows = sqlx::query_as::<_, OfferRow>(&format!(
        "SELECT {OFFER_COLUMNS} FROM offers \
         WHERE query = $1 \
         ORDER BY price ASC, id ASC"
    ))
    .bind(normalize_query(query))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StoredOffer::from).collect())
}
