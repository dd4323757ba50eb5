use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Body returned when a query has no recorded observations.
pub const INSUFFICIENT_DATA_MESSAGE: &str = "No price data available yet";

/// Result of analyzing one query's history.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsOutcome {
    Report(Box<AnalyticsReport>),
    /// Nothing has been captured for the query yet. Carries no fields so no
    /// default can be mistaken for a real statistic.
    InsufficientData,
}

impl AnalyticsOutcome {
    #[must_use]
    pub fn report(&self) -> Option<&AnalyticsReport> {
        match self {
            AnalyticsOutcome::Report(report) => Some(report),
            AnalyticsOutcome::InsufficientData => None,
        }
    }

    #[must_use]
    pub fn is_insufficient(&self) -> bool {
        matches!(self, AnalyticsOutcome::InsufficientData)
    }
}

/// A report serializes as itself; insufficient data serializes as
/// `{"error": "No price data available yet"}`.
impl Serialize for AnalyticsOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AnalyticsOutcome::Report(report) => report.serialize(serializer),
            AnalyticsOutcome::InsufficientData => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", INSUFFICIENT_DATA_MESSAGE)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub summary: PriceSummary,
    /// Latest observed price per store, keyed by store.
    pub store_prices: BTreeMap<String, i64>,
    /// Every observation, oldest first.
    pub price_trend: Vec<TrendPoint>,
    pub volatility: Volatility,
    pub best_time_to_buy: String,
    /// How often each store held the lowest price of a capture, most wins
    /// first.
    pub store_consistency: Vec<StoreWins>,
    pub data_points: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceSummary {
    pub lowest_price: i64,
    pub highest_price: i64,
    /// Mean price truncated to whole rupees.
    pub average_price: i64,
    /// `"₹<lowest> – ₹<highest>"` with Indian digit grouping.
    pub price_range: String,
    /// Store of the earliest observation at the lowest price.
    pub cheapest_store: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub store: String,
    pub price: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Volatility {
    /// Population standard deviation of all prices, rounded to two decimals.
    pub score: f64,
    pub stability: Stability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    Stable,
    Moderate,
    Volatile,
}

impl Stability {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stability::Stable => "stable",
            Stability::Moderate => "moderate",
            Stability::Volatile => "volatile",
        }
    }
}

impl std::fmt::Display for Stability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreWins {
    pub store: String,
    pub buckets_won: usize,
}
