//! Capture-event bucketing.
//!
//! One capture writes an observation per store within a few seconds, so
//! observations are grouped into one-hour windows (timestamp floored to the
//! hour) and each window is treated as a single capture event.

use std::collections::BTreeMap;

use pricenest_core::{format_inr, PriceObservation};

use crate::report::StoreWins;

const BUCKET_SECS: i64 = 3_600;

/// Lowest price seen in one capture window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketMin {
    /// Start of the window as a Unix timestamp.
    pub bucket_start: i64,
    pub price: i64,
    /// Store of the first observation in the window at `price`.
    pub store: String,
}

/// Per-window minimum prices, oldest window first. `observations` must be
/// sorted by timestamp.
#[must_use]
pub fn bucket_minimums(observations: &[PriceObservation]) -> Vec<BucketMin> {
    let mut buckets: BTreeMap<i64, BucketMin> = BTreeMap::new();

    for obs in observations {
        let bucket_start = obs.timestamp.timestamp().div_euclid(BUCKET_SECS) * BUCKET_SECS;
        buckets
            .entry(bucket_start)
            .and_modify(|current| {
                if obs.price < current.price {
                    current.price = obs.price;
                    current.store.clone_from(&obs.store);
                }
            })
            .or_insert_with(|| BucketMin {
                bucket_start,
                price: obs.price,
                store: obs.store.clone(),
            });
    }

    buckets.into_values().collect()
}

/// Compares the first and last capture windows' best prices.
#[must_use]
pub fn best_time_to_buy(buckets: &[BucketMin]) -> String {
    let [first, .., last] = buckets else {
        return single_event_message();
    };

    let diff = last.price - first.price;
    match diff.signum() {
        -1 => format!(
            "Prices have dropped by {} since your first search! Good time to buy.",
            format_inr(-diff)
        ),
        1 => format!(
            "Prices have increased by {} since your first search.",
            format_inr(diff)
        ),
        _ => "Prices are currently equal to the earliest recorded price.".to_string(),
    }
}

fn single_event_message() -> String {
    "Only one search event found. Search again later to see price movement.".to_string()
}

/// Number of capture windows in which each store held the lowest price.
/// Sorted by wins descending, then store name.
#[must_use]
pub fn store_consistency(buckets: &[BucketMin]) -> Vec<StoreWins> {
    let mut wins: BTreeMap<&str, usize> = BTreeMap::new();
    for bucket in buckets {
        *wins.entry(bucket.store.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<StoreWins> = wins
        .into_iter()
        .map(|(store, buckets_won)| StoreWins {
            store: store.to_string(),
            buckets_won,
        })
        .collect();
    // BTreeMap iteration is already name-ordered; a stable sort keeps that
    // as the tie-break.
    ranked.sort_by(|a, b| b.buckets_won.cmp(&a.buckets_won));
    ranked
}
