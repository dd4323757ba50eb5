//! `alerts` commands.

use clap::Subcommand;
use pricenest_core::AppConfig;
use pricenest_scraper::{FetchPool, SearchClient};
use pricenest_server::alerts::run_alert_check;
use pricenest_server::notify::notifier_from_config;

/// Sub-commands available under `alerts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum AlertsCommands {
    /// Run one alert check now instead of waiting for the scheduler
    Check,
}

/// # Errors
///
/// Returns an error if the search client, notifier, or database pool cannot
/// be set up, or the active alerts cannot be loaded. Per-query and
/// per-alert failures are logged and counted, not returned.
pub(crate) async fn run_alerts(config: &AppConfig, command: AlertsCommands) -> anyhow::Result<()> {
    match command {
        AlertsCommands::Check => {
            let search = SearchClient::from_config(config)?;
            let fetch_pool = FetchPool::from_config(config);
            let notifier = notifier_from_config(config)?;
            let pool = crate::connect(config).await?;

            let summary = run_alert_check(&pool, &search, &fetch_pool, notifier.as_ref()).await?;
            println!(
                "checked {} alert(s): refreshed {} queries ({} failed), sent {} notification(s) ({} failed)",
                summary.active_alerts,
                summary.queries_refreshed,
                summary.queries_failed,
                summary.notifications_sent,
                summary.notifications_failed
            );
        }
    }
    Ok(())
}
