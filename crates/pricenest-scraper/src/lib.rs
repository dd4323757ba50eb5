pub mod assemble;
pub mod client;
pub mod compare;
pub mod domain;
pub mod emi;
pub mod error;
pub mod extract;
pub mod pool;
pub mod relevance;
pub mod types;

pub use assemble::{assemble_offers, build_search_query, CandidateOffer, PricePolicy, PriceSource};
pub use client::SearchClient;
pub use compare::{compare_product, Comparison};
pub use domain::normalize_domain;
pub use emi::{filter_emi_outliers, signals_emi};
pub use error::ScraperError;
pub use extract::extract_prices;
pub use pool::FetchPool;
pub use relevance::is_relevant_title;
pub use types::{ProductResult, RawResultRecord, ResultSection, SearchPayload};
