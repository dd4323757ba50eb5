//! Price volatility: population standard deviation, banded into a fixed
//! stability scale measured in rupees.

use crate::report::{Stability, Volatility};

/// Scores below this are [`Stability::Stable`].
pub const STABLE_BELOW: f64 = 500.0;
/// Scores below this (and at least [`STABLE_BELOW`]) are
/// [`Stability::Moderate`]; anything higher is [`Stability::Volatile`].
pub const MODERATE_BELOW: f64 = 1500.0;

/// Bands an unrounded score.
#[must_use]
pub fn classify(score: f64) -> Stability {
    if score < STABLE_BELOW {
        Stability::Stable
    } else if score < MODERATE_BELOW {
        Stability::Moderate
    } else {
        Stability::Volatile
    }
}

/// Population standard deviation of `prices`; zero for fewer than two.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn std_dev(prices: &[i64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }

    let n = prices.len() as f64;
    let mean = prices.iter().map(|&p| p as f64).sum::<f64>() / n;
    let variance = prices
        .iter()
        .map(|&p| {
            let delta = p as f64 - mean;
            delta * delta
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}

#[must_use]
pub fn volatility(prices: &[i64]) -> Volatility {
    from_raw_score(std_dev(prices))
}

fn from_raw_score(raw: f64) -> Volatility {
    Volatility {
        score: (raw * 100.0).round() / 100.0,
        stability: classify(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries_are_exact() {
        assert_eq!(classify(0.0), Stability::Stable);
        assert_eq!(classify(499.0), Stability::Stable);
        assert_eq!(classify(499.999), Stability::Stable);
        assert_eq!(classify(500.0), Stability::Moderate);
        assert_eq!(classify(1499.0), Stability::Moderate);
        assert_eq!(classify(1500.0), Stability::Volatile);
        assert_eq!(classify(25_000.0), Stability::Volatile);
    }

    #[test]
    fn fewer_than_two_prices_score_zero() {
        assert!(std_dev(&[]).abs() < f64::EPSILON);
        assert!(std_dev(&[64_999]).abs() < f64::EPSILON);
    }

    #[test]
    fn std_dev_is_population_not_sample() {
        // Two points 2d apart have a population std-dev of exactly d.
        assert!((std_dev(&[10_000, 10_998]) - 499.0).abs() < 1e-9);
        assert!((std_dev(&[10_000, 13_000]) - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn banding_uses_observed_spreads() {
        assert_eq!(volatility(&[10_000, 10_998]).stability, Stability::Stable);
        assert_eq!(volatility(&[10_000, 11_000]).stability, Stability::Moderate);
        assert_eq!(volatility(&[10_000, 12_998]).stability, Stability::Moderate);
        assert_eq!(volatility(&[10_000, 13_000]).stability, Stability::Volatile);
    }

    #[test]
    fn banding_uses_unrounded_score() {
        let v = from_raw_score(499.996);
        assert!((v.score - 500.0).abs() < 1e-9);
        assert_eq!(v.stability, Stability::Stable);

        let v = from_raw_score(1499.999);
        assert!((v.score - 1500.0).abs() < 1e-9);
        assert_eq!(v.stability, Stability::Moderate);
    }

    #[test]
    fn score_is_rounded_to_two_decimals() {
        // [1, 2, 4]: mean 7/3, population std-dev ≈ 1.247219
        let v = volatility(&[1, 2, 4]);
        assert!((v.score - 1.25).abs() < 1e-9);
    }
}
