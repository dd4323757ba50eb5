//! Price-history analytics for a tracked query.
//!
//! Pure and synchronous: callers load the ordered observation history and
//! pass it to [`analyze`].

pub mod buckets;
mod engine;
pub mod report;
pub mod volatility;

pub use engine::analyze;
pub use report::{
    AnalyticsOutcome, AnalyticsReport, PriceSummary, Stability, StoreWins, TrendPoint, Volatility,
    INSUFFICIENT_DATA_MESSAGE,
};
