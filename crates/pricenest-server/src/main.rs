use std::sync::Arc;

use pricenest_scraper::{FetchPool, ScraperError, SearchClient};
use pricenest_server::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    notify::notifier_from_config,
    scheduler::{self, AlertJobContext},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(pricenest_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = pricenest_db::PoolConfig::from_app_config(&config);
    let pool = pricenest_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = pricenest_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let search = match SearchClient::from_config(&config) {
        Ok(client) => Some(client),
        Err(ScraperError::MissingApiKey) => {
            tracing::warn!("SERPAPI_KEY not set; live price search is disabled");
            None
        }
        Err(e) => return Err(e.into()),
    };
    let fetch_pool = FetchPool::from_config(&config);
    let notifier = notifier_from_config(&config)?;

    let alert_context = search.clone().map(|search| AlertJobContext {
        pool: pool.clone(),
        search,
        fetch_pool: fetch_pool.clone(),
        notifier,
    });
    let _scheduler = scheduler::build_scheduler(&config, alert_context).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        pricenest_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            pool,
            search,
            fetch_pool,
        },
        auth,
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "pricenest-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
