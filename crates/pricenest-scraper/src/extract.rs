//! Price-text extraction.
//!
//! Only currency-marked amounts (`₹`, `Rs`, `Rs.`, `INR`) are considered.
//! Financing phrases such as `₹2,499/mo` or `No Cost EMI from ₹4,167` are
//! removed before the scan so an installment amount can never surface as a
//! product price.

use std::sync::LazyLock;

use pricenest_core::{PRICE_MAX, PRICE_MIN};
use regex::Regex;

static FINANCING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        (?:₹|\bRs\.?|\bINR)\s?\d(?:[\d,]*\d)?\s*
            (?:/\s*mo(?:nth)?\b|per\s*month|x\s*\d+\s*(?:months?|emis?)\b)
        |
        (?:no[\s-]?cost[\s-]?)?\bemi\s*(?:from|starting|at|of|:|,)?\s*(?:₹|\bRs\.?|\bINR)?\s*\d(?:[\d,]*\d)?
        |
        (?:₹|\bRs\.?|\bINR)\s?\d(?:[\d,]*\d)?\s*emi\b
        ",
    )
    .expect("valid regex")
});

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:₹|\bRs\.?|\bINR)\s?(\d[\d,]*)").expect("valid regex")
});

/// Extracts candidate prices from free text, in order of appearance.
///
/// Returns an empty vector when the text carries no currency-marked amount
/// inside [`PRICE_MIN`]`..=`[`PRICE_MAX`].
#[must_use]
pub fn extract_prices(text: &str) -> Vec<i64> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let cleaned = FINANCING_RE.replace_all(text, " ");

    AMOUNT_RE
        .captures_iter(&cleaned)
        .filter_map(|caps| parse_amount(caps.get(1)?.as_str()))
        .filter(|value| in_price_range(*value))
        .collect()
}

/// `true` when `value` is a plausible product price.
#[must_use]
pub fn in_price_range(value: i64) -> bool {
    (PRICE_MIN..=PRICE_MAX).contains(&value)
}

/// Parses a digit group like `"1,49,999"`. Overflowing groups yield `None`.
fn parse_amount(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<i64>().ok()
}
