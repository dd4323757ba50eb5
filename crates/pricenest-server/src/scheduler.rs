//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring price-alert check.

use std::sync::Arc;

use pricenest_core::AppConfig;
use pricenest_scraper::{FetchPool, SearchClient};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::alerts::run_alert_check;
use crate::notify::Notifier;

/// Everything the alert-check job needs, shared across runs.
#[derive(Clone)]
pub struct AlertJobContext {
    pub pool: PgPool,
    pub search: SearchClient,
    pub fetch_pool: FetchPool,
    pub notifier: Arc<dyn Notifier>,
}

/// Builds and starts the background job scheduler.
///
/// The alert check is registered on `config.alert_cron` when a search
/// client is available. Returns the running [`JobScheduler`] handle, which
/// must be kept alive for the lifetime of the process; dropping it shuts
/// down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is rejected, or the scheduler fails to start.
pub async fn build_scheduler(
    config: &AppConfig,
    context: Option<AlertJobContext>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    if let Some(context) = context {
        register_alert_check_job(&scheduler, &config.alert_cron, context).await?;
    } else {
        tracing::warn!("SERPAPI_KEY not set; scheduled alert checks are disabled");
    }

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring alert check (default every six hours,
/// `0 0 */6 * * *`).
async fn register_alert_check_job(
    scheduler: &JobScheduler,
    cron: &str,
    context: AlertJobContext,
) -> Result<(), JobSchedulerError> {
    let context = Arc::new(context);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let context = Arc::clone(&context);

        Box::pin(async move {
            tracing::info!("scheduler: starting alert check");
            if let Err(e) = run_alert_check(
                &context.pool,
                &context.search,
                &context.fetch_pool,
                context.notifier.as_ref(),
            )
            .await
            {
                tracing::error!(error = %e, "scheduler: alert check failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: alert check registered");
    Ok(())
}
