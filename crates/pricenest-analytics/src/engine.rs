use std::collections::BTreeMap;

use pricenest_core::{format_price_range, PriceObservation};

use crate::buckets::{best_time_to_buy, bucket_minimums, store_consistency};
use crate::report::{AnalyticsOutcome, AnalyticsReport, PriceSummary, TrendPoint};
use crate::volatility::volatility;

/// Builds the analytics report for one query's full observation history.
///
/// Observations are re-sorted by timestamp (stable, so equal timestamps keep
/// their input order). An empty history yields
/// [`AnalyticsOutcome::InsufficientData`].
#[must_use]
pub fn analyze(observations: &[PriceObservation]) -> AnalyticsOutcome {
    if observations.is_empty() {
        return AnalyticsOutcome::InsufficientData;
    }

    let mut ordered = observations.to_vec();
    ordered.sort_by_key(|obs| obs.timestamp);

    let prices: Vec<i64> = ordered.iter().map(|obs| obs.price).collect();
    let Some(summary) = summarize(&ordered) else {
        return AnalyticsOutcome::InsufficientData;
    };

    let buckets = bucket_minimums(&ordered);
    let report = AnalyticsReport {
        summary,
        store_prices: latest_store_prices(&ordered),
        price_trend: ordered
            .iter()
            .map(|obs| TrendPoint {
                timestamp: obs.timestamp,
                store: obs.store.clone(),
                price: obs.price,
            })
            .collect(),
        volatility: volatility(&prices),
        best_time_to_buy: best_time_to_buy(&buckets),
        store_consistency: store_consistency(&buckets),
        data_points: ordered.len(),
    };

    tracing::debug!(
        data_points = report.data_points,
        capture_events = buckets.len(),
        stability = %report.volatility.stability,
        "price history analyzed"
    );
    AnalyticsOutcome::Report(Box::new(report))
}

/// Min, max, truncated mean, and cheapest store over time-ordered history.
fn summarize(ordered: &[PriceObservation]) -> Option<PriceSummary> {
    // `min_by_key` returns the first minimum, i.e. the earliest observation.
    let cheapest = ordered.iter().min_by_key(|obs| obs.price)?;
    let highest = ordered.iter().map(|obs| obs.price).max()?;
    let lowest = cheapest.price;

    Some(PriceSummary {
        lowest_price: lowest,
        highest_price: highest,
        average_price: truncated_mean(ordered),
        price_range: format_price_range(lowest, highest),
        cheapest_store: cheapest.store.clone(),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn truncated_mean(ordered: &[PriceObservation]) -> i64 {
    let total: i128 = ordered.iter().map(|obs| i128::from(obs.price)).sum();
    (total / ordered.len() as i128) as i64
}

/// Latest price per store; for equal timestamps the later input wins.
fn latest_store_prices(ordered: &[PriceObservation]) -> BTreeMap<String, i64> {
    let mut latest = BTreeMap::new();
    for obs in ordered {
        latest.insert(obs.store.clone(), obs.price);
    }
    latest
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
