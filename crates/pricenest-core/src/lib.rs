mod app_config;
mod config;
pub mod money;
pub mod offers;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use money::{format_inr, format_price_range};
pub use offers::{
    normalize_query, NormalizedOffer, PriceObservation, StoredOffer, PRICE_MAX, PRICE_MIN,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
