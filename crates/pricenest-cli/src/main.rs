mod alerts;
mod analyze;
mod compare;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::alerts::AlertsCommands;

#[derive(Debug, Parser)]
#[command(name = "pricenest-cli")]
#[command(about = "PriceNest command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Search stores for a product and record the offers found
    Compare {
        /// Product to search for, e.g. "iphone 15 128gb"
        query: String,
        /// Print the offers without writing them to the database
        #[arg(long)]
        dry_run: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print price analytics for a tracked product
    Analyze {
        /// Product query as previously compared
        query: String,
    },
    /// Price alert jobs
    Alerts {
        #[command(subcommand)]
        command: AlertsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("pricenest-cli: run with --help to list commands");
        return Ok(());
    };

    let config = pricenest_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    pricenest_db::ping(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = pricenest_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        Commands::Compare {
            query,
            dry_run,
            json,
        } => compare::run_compare(&config, &query, dry_run, json).await?,
        Commands::Analyze { query } => {
            let pool = connect(&config).await?;
            analyze::run_analyze(&pool, &query).await?;
        }
        Commands::Alerts { command } => alerts::run_alerts(&config, command).await?,
    }

    Ok(())
}

pub(crate) async fn connect(config: &pricenest_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = pricenest_db::PoolConfig::from_app_config(config);
    let pool = pricenest_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests;
