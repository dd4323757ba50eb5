//! `analyze` command: prints the analytics report for a stored query.

use pricenest_analytics::{analyze, AnalyticsOutcome};
use sqlx::PgPool;

/// # Errors
///
/// Returns an error if the price history cannot be loaded or the report
/// cannot be serialized.
pub(crate) async fn run_analyze(pool: &PgPool, query: &str) -> anyhow::Result<()> {
    let history = pricenest_db::get_observations(pool, query).await?;
    let outcome = analyze(&history);

    if let AnalyticsOutcome::Report(report) = &outcome {
        tracing::debug!(
            query,
            data_points = report.data_points,
            stability = %report.volatility.stability,
            "analytics computed"
        );
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
