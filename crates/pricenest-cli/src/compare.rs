//! `compare` command: one live search, optionally persisted.

use pricenest_core::{format_inr, format_price_range, AppConfig, NormalizedOffer};
use pricenest_scraper::{compare_product, FetchPool, SearchClient};

/// Searches for `query` and prints the ranked offers.
///
/// Without `dry_run` the offers are also upserted and one observation per
/// offer is appended to the price history.
///
/// # Errors
///
/// Returns an error if the search client cannot be built (for example
/// `SERPAPI_KEY` is unset), the search fails or times out, or the offers
/// cannot be stored.
pub(crate) async fn run_compare(
    config: &AppConfig,
    query: &str,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let client = SearchClient::from_config(config)?;
    let fetch_pool = FetchPool::from_config(config);

    let comparison = compare_product(&client, &fetch_pool, query).await?;

    if dry_run {
        println!(
            "dry-run: {} offer(s) for \"{}\" not stored",
            comparison.offers.len(),
            comparison.query
        );
    } else {
        let pool = crate::connect(config).await?;
        let stored =
            pricenest_db::upsert_offers(&pool, &comparison.query, &comparison.offers).await?;
        tracing::info!(
            query = %comparison.storage_key(),
            stored = stored.len(),
            "offers recorded"
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print!("{}", render_table(&comparison.offers));
    }
    Ok(())
}

/// One line per offer, cheapest first, followed by the price band.
pub(crate) fn render_table(offers: &[NormalizedOffer]) -> String {
    let (Some(lowest), Some(highest)) = (offers.first(), offers.last()) else {
        return "no offers found\n".to_string();
    };

    let mut out = String::new();
    for offer in offers {
        out.push_str(&format!(
            "{:>12}  {:<24}  {}\n",
            format_inr(offer.price),
            offer.store,
            offer.title
        ));
    }
    out.push_str(&format!(
        "{} offer(s), {}\n",
        offers.len(),
        format_price_range(lowest.price, highest.price)
    ));
    out
}
