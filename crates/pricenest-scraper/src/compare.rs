use pricenest_core::{normalize_query, NormalizedOffer};
use serde::Serialize;

use crate::assemble::assemble_offers;
use crate::client::SearchClient;
use crate::error::ScraperError;
use crate::pool::FetchPool;

/// Ranked offers for one user query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    /// The query as the user typed it, trimmed.
    pub query: String,
    pub offers: Vec<NormalizedOffer>,
}

impl Comparison {
    /// Storage key for this comparison's query.
    #[must_use]
    pub fn storage_key(&self) -> String {
        normalize_query(&self.query)
    }
}

/// Searches for `query` through `pool` and assembles the ranked offers.
///
/// # Errors
///
/// Any [`ScraperError`] from the fetch, including
/// [`ScraperError::Timeout`] when the provider does not answer in time. A
/// search that finds nothing is `Ok` with no offers.
pub async fn compare_product(
    client: &SearchClient,
    pool: &FetchPool,
    query: &str,
) -> Result<Comparison, ScraperError> {
    let query = query.trim();
    let payload = pool.run(query, client.search(query)).await?;
    let offers = assemble_offers(&payload, query);

    tracing::info!(query, offers = offers.len(), "price comparison complete");
    Ok(Comparison {
        query: query.to_owned(),
        offers,
    })
}
