use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use super::*;
use crate::report::{Stability, INSUFFICIENT_DATA_MESSAGE};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
}

fn obs(store: &str, price: i64, at: DateTime<Utc>) -> PriceObservation {
    PriceObservation {
        query: "iphone 15".to_string(),
        store: store.to_string(),
        price,
        timestamp: at,
    }
}

fn report(outcome: &AnalyticsOutcome) -> &AnalyticsReport {
    outcome.report().expect("expected a report")
}

// -----------------------------------------------------------------------
// insufficient data
// -----------------------------------------------------------------------

#[test]
fn empty_history_is_insufficient_data() {
    let outcome = analyze(&[]);
    assert!(outcome.is_insufficient());
    assert!(outcome.report().is_none());
}

#[test]
fn insufficient_data_serializes_without_statistics() {
    let value = serde_json::to_value(analyze(&[])).unwrap();
    assert_eq!(value, json!({"error": INSUFFICIENT_DATA_MESSAGE}));
    assert!(value.get("summary").is_none());
    assert!(value.get("volatility").is_none());
}

// -----------------------------------------------------------------------
// summary
// -----------------------------------------------------------------------

#[test]
fn summary_reports_min_max_and_truncated_mean() {
    let history = vec![
        obs("flipkart.com", 65_999, t0()),
        obs("amazon.in", 64_900, t0() + Duration::seconds(2)),
        obs("croma.com", 66_490, t0() + Duration::seconds(4)),
    ];
    let outcome = analyze(&history);
    let summary = &report(&outcome).summary;

    assert_eq!(summary.lowest_price, 64_900);
    assert_eq!(summary.highest_price, 66_490);
    // (65_999 + 64_900 + 66_490) / 3 = 65_796.33
    assert_eq!(summary.average_price, 65_796);
    assert_eq!(summary.price_range, "₹64,900 – ₹66,490");
    assert_eq!(summary.cheapest_store, "amazon.in");
}

#[test]
fn cheapest_store_is_earliest_minimum() {
    let history = vec![
        obs("b.in", 1_000, t0() + Duration::hours(5)),
        obs("a.in", 1_000, t0()),
        obs("c.in", 1_500, t0() + Duration::hours(1)),
    ];
    let outcome = analyze(&history);
    assert_eq!(report(&outcome).summary.cheapest_store, "a.in");
}

// -----------------------------------------------------------------------
// store prices and trend
// -----------------------------------------------------------------------

#[test]
fn store_prices_hold_latest_price_per_store() {
    let history = vec![
        obs("a.in", 1_000, t0()),
        obs("b.in", 1_200, t0() + Duration::minutes(1)),
        obs("a.in", 800, t0() + Duration::hours(2)),
    ];
    let outcome = analyze(&history);
    let prices = &report(&outcome).store_prices;

    assert_eq!(prices.len(), 2);
    assert_eq!(prices["a.in"], 800);
    assert_eq!(prices["b.in"], 1_200);
}

#[test]
fn price_trend_is_time_ordered() {
    let history = vec![
        obs("a.in", 900, t0() + Duration::hours(3)),
        obs("a.in", 1_000, t0()),
        obs("a.in", 950, t0() + Duration::hours(1)),
    ];
    let outcome = analyze(&history);
    let trend: Vec<i64> = report(&outcome).price_trend.iter().map(|p| p.price).collect();
    assert_eq!(trend, vec![1_000, 950, 900]);
}

// -----------------------------------------------------------------------
// volatility and insight
// -----------------------------------------------------------------------

#[test]
fn single_observation_is_stable_with_zero_score() {
    let outcome = analyze(&[obs("a.in", 64_999, t0())]);
    let r = report(&outcome);
    assert!(r.volatility.score.abs() < f64::EPSILON);
    assert_eq!(r.volatility.stability, Stability::Stable);
    assert!(r.best_time_to_buy.starts_with("Only one search event"));
    assert_eq!(r.data_points, 1);
}

#[test]
fn volatility_bands_follow_spread() {
    let at = |h| t0() + Duration::hours(h);
    let cases = [
        ([10_000, 10_998], Stability::Stable),
        ([10_000, 11_000], Stability::Moderate),
        ([10_000, 12_998], Stability::Moderate),
        ([10_000, 13_000], Stability::Volatile),
    ];
    for ([first, second], expected) in cases {
        let history = vec![obs("a.in", first, at(0)), obs("a.in", second, at(1))];
        let outcome = analyze(&history);
        assert_eq!(
            report(&outcome).volatility.stability,
            expected,
            "prices {first} and {second}"
        );
    }
}

#[test]
fn drop_across_capture_events_is_reported() {
    let history = vec![
        obs("A", 1_000, t0()),
        obs("B", 1_200, t0() + Duration::minutes(1)),
        obs("A", 800, t0() + Duration::hours(2)),
    ];
    let outcome = analyze(&history);
    let insight = &report(&outcome).best_time_to_buy;
    assert!(insight.contains("dropped by ₹200"), "got: {insight}");
}

#[test]
fn report_serializes_expected_shape() {
    let history = vec![
        obs("a.in", 1_000, t0()),
        obs("b.in", 1_200, t0() + Duration::minutes(1)),
    ];
    let value = serde_json::to_value(analyze(&history)).unwrap();

    assert_eq!(value["summary"]["lowest_price"], 1_000);
    assert_eq!(value["summary"]["price_range"], "₹1,000 – ₹1,200");
    assert_eq!(value["store_prices"]["b.in"], 1_200);
    assert_eq!(value["volatility"]["stability"], "stable");
    assert_eq!(value["volatility"]["score"], 100.0);
    assert_eq!(value["price_trend"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["store_consistency"][0]["store"], "a.in");
    assert!(value.get("error").is_none());
}
