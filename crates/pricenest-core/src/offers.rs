use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Smallest amount accepted as a product price, in whole rupees.
///
/// Anything lower is assumed to be a unit price, a rating, or a stray number.
pub const PRICE_MIN: i64 = 500;

/// Largest amount accepted as a product price, in whole rupees.
pub const PRICE_MAX: i64 = 5_000_000;

/// Canonical storage key for a user query: trimmed and lowercased.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// A price listing extracted from one search result, normalized for storage
/// and comparison across stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedOffer {
    pub title: String,
    /// Store identifier: the listing's domain with `www.` stripped, or the
    /// provider's store name when the link has no usable host.
    pub store: String,
    /// Listing URL; unique per `(query, link)` in storage.
    pub link: String,
    /// Whole rupees, always within [`PRICE_MIN`]`..=`[`PRICE_MAX`].
    pub price: i64,
    pub image: Option<String>,
    pub store_logo: Option<String>,
}

impl NormalizedOffer {
    /// Display form of the price, e.g. `"₹1,49,999"`.
    #[must_use]
    pub fn display_price(&self) -> String {
        crate::format_inr(self.price)
    }
}

/// An offer row as persisted: the current-state view of one listing for a
/// query, overwritten in place on every capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOffer {
    pub id: i64,
    pub query: String,
    #[serde(flatten)]
    pub offer: NormalizedOffer,
    pub captured_at: DateTime<Utc>,
}

/// One immutable price reading captured for a query.
///
/// The ordered sequence of observations for a query is the only input to
/// the analytics engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub query: String,
    pub store: String,
    pub price: i64,
    pub timestamp: DateTime<Utc>,
}
