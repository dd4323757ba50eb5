//! Installment ("EMI") noise detection.
//!
//! Two independent guards. [`signals_emi`] rejects a whole result when any
//! of its descriptive fields talks about financing. [`filter_emi_outliers`]
//! catches installment amounts that slipped through as prices by dropping
//! offers far below the median of the batch.

use std::sync::LazyLock;

use pricenest_core::NormalizedOffer;
use regex::Regex;
use serde_json::{Map, Value};

/// Offers priced below this fraction of the batch median are dropped.
pub const EMI_OUTLIER_RATIO: f64 = 0.40;

static EMI_KEYWORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bemi\b|no[\s-]?cost|per\s*month|/mo\b|monthly\s*instal?l?ments?")
        .expect("valid regex")
});

const URL_FIELDS: &[&str] = &[
    "link",
    "thumbnail",
    "image",
    "source_icon",
    "favicon",
    "serpapi_link",
];

fn is_url_field(key: &str) -> bool {
    URL_FIELDS.contains(&key) || key.ends_with("_link")
}

/// Returns `true` when any non-URL field of a raw result mentions financing.
///
/// Nested arrays and objects are scanned recursively. URL-typed keys are
/// skipped at every depth so tracking parameters in links cannot trigger a
/// false positive.
#[must_use]
pub fn signals_emi(fields: &Map<String, Value>) -> bool {
    fields
        .iter()
        .filter(|(key, _)| !is_url_field(key))
        .any(|(_, value)| value_signals_emi(value))
}

fn value_signals_emi(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => EMI_KEYWORDS_RE.is_match(s),
        Value::Bool(_) | Value::Number(_) => false,
        Value::Array(items) => items.iter().any(value_signals_emi),
        Value::Object(map) => signals_emi(map),
    }
}

/// Drops offers priced strictly below `0.40 × median` of the batch.
///
/// Batches of fewer than two offers pass through untouched, and a batch is
/// never emptied: if every offer would be dropped the input is returned as
/// is. Input order is preserved.
#[must_use]
pub fn filter_emi_outliers(offers: Vec<NormalizedOffer>) -> Vec<NormalizedOffer> {
    if offers.len() < 2 {
        return offers;
    }

    let mut prices: Vec<i64> = offers.iter().map(|o| o.price).collect();
    prices.sort_unstable();
    let median_x2 = doubled_median(&prices);

    // price >= 0.4 * median  <=>  5 * price >= 2 * median
    let kept: Vec<NormalizedOffer> = offers
        .iter()
        .filter(|o| o.price * 5 >= median_x2)
        .cloned()
        .collect();

    if kept.is_empty() {
        return offers;
    }

    let dropped = offers.len() - kept.len();
    if dropped > 0 {
        #[allow(clippy::cast_precision_loss)]
        let threshold = median_x2 as f64 / 2.0 * EMI_OUTLIER_RATIO;
        tracing::debug!(dropped, threshold, "removed installment-priced outliers");
    }
    kept
}

/// Twice the median of an ascending, non-empty slice. Kept doubled so the
/// even-length case (mean of the two middle values) stays exact.
fn doubled_median(sorted: &[i64]) -> i64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        sorted[mid - 1] + sorted[mid]
    } else {
        sorted[mid] * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn offer(link: &str, price: i64) -> NormalizedOffer {
        NormalizedOffer {
            title: format!("Item {link}"),
            store: "example.in".to_string(),
            link: link.to_string(),
            price,
            image: None,
            store_logo: None,
        }
    }

    fn prices(offers: &[NormalizedOffer]) -> Vec<i64> {
        offers.iter().map(|o| o.price).collect()
    }

    #[test]
    fn clean_record_has_no_signal() {
        let item = fields(json!({
            "title": "Apple iPhone 15",
            "price": "₹65,999",
            "source": "Flipkart",
            "rating": 4.6,
            "delivery": null
        }));
        assert!(!signals_emi(&item));
    }

    #[test]
    fn emi_keyword_in_any_text_field_signals() {
        for text in [
            "EMI available",
            "No Cost EMI",
            "no-cost offers",
            "₹2,000 per month",
            "₹2,000/mo",
            "Easy monthly instalment",
            "Monthly installments from ₹3,000",
        ] {
            let item = fields(json!({"title": "Phone", "extensions": text}));
            assert!(signals_emi(&item), "expected signal for {text:?}");
        }
    }

    #[test]
    fn word_containing_emi_does_not_signal() {
        let item = fields(json!({"title": "Premium Chemical Resistant Gloves"}));
        assert!(!signals_emi(&item));
    }

    #[test]
    fn url_fields_are_ignored() {
        let item = fields(json!({
            "title": "Phone",
            "link": "https://shop.example.in/p?offer=no-cost-emi",
            "thumbnail": "https://img.example.in/emi.jpg",
            "serpapi_link": "https://serpapi.com/search?q=emi",
            "product_link": "https://example.in/emi/phone",
            "source_icon": "https://example.in/emi.ico"
        }));
        assert!(!signals_emi(&item));
    }

    #[test]
    fn nested_values_are_scanned() {
        let item = fields(json!({
            "title": "Phone",
            "extensions": ["Free delivery", "No Cost EMI"],
        }));
        assert!(signals_emi(&item));

        let item = fields(json!({
            "title": "Phone",
            "installment": {"down_payment": "₹0", "note": "6 months EMI"}
        }));
        assert!(signals_emi(&item));
    }

    #[test]
    fn nested_url_fields_are_ignored() {
        let item = fields(json!({
            "title": "Phone",
            "seller": {"name": "Croma", "link": "https://croma.com/emi-offers"}
        }));
        assert!(!signals_emi(&item));
    }

    #[test]
    fn outlier_filter_leaves_small_batches_alone() {
        assert!(filter_emi_outliers(Vec::new()).is_empty());
        let single = vec![offer("a", 2_000)];
        assert_eq!(filter_emi_outliers(single.clone()), single);
    }

    #[test]
    fn outlier_filter_drops_installment_values() {
        let batch = vec![
            offer("a", 2_999),
            offer("b", 62_999),
            offer("c", 64_999),
            offer("d", 65_999),
        ];
        let kept = filter_emi_outliers(batch);
        assert_eq!(prices(&kept), vec![62_999, 64_999, 65_999]);
    }

    #[test]
    fn outlier_threshold_uses_mean_of_middle_values() {
        // median = (1_000 + 3_000) / 2 = 2_000, threshold = 800
        let batch = vec![
            offer("a", 799),
            offer("b", 800),
            offer("c", 1_000),
            offer("d", 3_000),
            offer("e", 3_000),
            offer("f", 3_000),
        ];
        let kept = filter_emi_outliers(batch);
        assert_eq!(prices(&kept), vec![800, 1_000, 3_000, 3_000, 3_000]);
    }

    #[test]
    fn value_exactly_at_threshold_is_kept() {
        // median = 5_000, threshold = 2_000
        let batch = vec![offer("a", 2_000), offer("b", 5_000), offer("c", 9_000)];
        assert_eq!(filter_emi_outliers(batch).len(), 3);
    }

    #[test]
    fn outlier_filter_never_empties_non_empty_input() {
        for batch in [
            vec![offer("a", 500), offer("b", 500)],
            vec![offer("a", 600), offer("b", 5_000_000)],
            vec![offer("a", 1_000), offer("b", 1_000), offer("c", 1_000)],
        ] {
            let len = batch.len();
            let kept = filter_emi_outliers(batch);
            assert!(!kept.is_empty());
            assert!(kept.len() <= len);
        }
    }

    #[test]
    fn outlier_filter_preserves_order() {
        let batch = vec![offer("x", 9_000), offer("y", 7_000), offer("z", 8_000)];
        let kept = filter_emi_outliers(batch);
        let links: Vec<&str> = kept.iter().map(|o| o.link.as_str()).collect();
        assert_eq!(links, vec!["x", "y", "z"]);
    }
}
