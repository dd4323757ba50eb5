//! Offer assembly: raw provider payload → ranked [`NormalizedOffer`] list.
//!
//! Sections are processed in priority order, structured seller pricing
//! first, then shopping, inline shopping, and organic results. When two
//! sections list the same link the earlier section wins.

use std::collections::HashSet;

use pricenest_core::NormalizedOffer;

use crate::domain::normalize_domain;
use crate::emi::{filter_emi_outliers, signals_emi};
use crate::extract::{extract_prices, in_price_range};
use crate::relevance::is_relevant_title;
use crate::types::{RawResultRecord, ResultSection, SearchPayload};

/// Text keys on a seller entry that may carry an alternative price.
const SELLER_PRICE_TEXT_KEYS: &[&str] = &["price", "base_price", "total_price"];

/// Where a candidate's price comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceSource {
    /// Free text to run through [`extract_prices`].
    Text(String),
    /// Amounts already read from structured seller fields.
    Fields(Vec<i64>),
}

/// How to pick one price when a candidate yields several.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricePolicy {
    /// Largest extracted amount. Used for free-text sections.
    Highest,
    /// Smallest listed amount. Used for structured seller pricing, where a
    /// listing may state both the list price and the sale price.
    Lowest,
}

impl PricePolicy {
    fn pick(self, prices: &[i64]) -> Option<i64> {
        match self {
            PricePolicy::Highest => prices.iter().copied().max(),
            PricePolicy::Lowest => prices.iter().copied().min(),
        }
    }
}

/// A result that passed the shape checks but has not been priced yet.
#[derive(Debug, Clone)]
pub struct CandidateOffer {
    pub title: String,
    pub source_url: String,
    pub price_source: PriceSource,
    /// Provider store name, used when the link has no usable host.
    pub source_name: Option<String>,
    pub image: Option<String>,
    pub store_logo: Option<String>,
}

impl CandidateOffer {
    fn prices(&self) -> Vec<i64> {
        match &self.price_source {
            PriceSource::Text(text) => extract_prices(text),
            PriceSource::Fields(values) => values
                .iter()
                .copied()
                .filter(|value| in_price_range(*value))
                .collect(),
        }
    }

    /// Applies `policy` and normalizes the store. `None` when no valid price
    /// survives extraction.
    fn into_offer(self, policy: PricePolicy) -> Option<NormalizedOffer> {
        let price = policy.pick(&self.prices())?;

        let mut store = normalize_domain(&self.source_url);
        if store.is_empty() {
            store = self.source_name.unwrap_or_default();
        }

        Some(NormalizedOffer {
            title: self.title,
            store,
            link: self.source_url,
            price,
            image: self.image,
            store_logo: self.store_logo,
        })
    }
}

/// The query actually sent to the search provider for a user's product
/// query.
#[must_use]
pub fn build_search_query(query: &str) -> String {
    format!("{} buy price", query.trim())
}

/// Builds the ranked offer list for `query` from one provider payload.
///
/// Offers are deduplicated by link, sorted ascending by price (ties keep
/// section order), and passed through the installment outlier filter.
#[must_use]
pub fn assemble_offers(payload: &SearchPayload, query: &str) -> Vec<NormalizedOffer> {
    let mut offers: Vec<NormalizedOffer> = Vec::new();

    if let Some(product) = &payload.product_result {
        for seller in &product.sellers {
            let title = product.title.as_deref().or(seller.title.as_deref());
            let image = product.thumbnail.clone().or_else(|| seller.thumbnail.clone());
            if let Some(offer) = seller_candidate(seller, title, image, query)
                .and_then(|c| c.into_offer(PricePolicy::Lowest))
            {
                offers.push(offer);
            }
        }
    }

    let text_sections = [
        &payload.shopping_results,
        &payload.inline_shopping_results,
        &payload.organic_results,
    ];
    for record in text_sections.into_iter().flatten() {
        if let Some(offer) =
            text_candidate(record, query).and_then(|c| c.into_offer(PricePolicy::Highest))
        {
            offers.push(offer);
        }
    }

    let mut seen: HashSet<String> = HashSet::with_capacity(offers.len());
    offers.retain(|offer| seen.insert(offer.link.clone()));

    offers.sort_by_key(|offer| offer.price);
    let ranked = filter_emi_outliers(offers);

    tracing::debug!(
        query,
        records = payload.record_count(),
        offers = ranked.len(),
        "assembled offers"
    );
    ranked
}

/// Shopping, inline shopping, and organic items.
fn text_candidate(record: &RawResultRecord, query: &str) -> Option<CandidateOffer> {
    let title = record.title.as_deref()?;
    let link = record.link.as_deref()?;

    let text = match record.section {
        ResultSection::Organic => match record.snippet.as_deref() {
            Some(snippet) => format!("{title} {snippet}"),
            None => title.to_string(),
        },
        _ => record.price.clone()?,
    };

    if !is_relevant_title(title, query) {
        return None;
    }
    // Organic results carry no structured price fields to scan.
    if record.section != ResultSection::Organic && signals_emi(&record.fields) {
        tracing::trace!(link, section = record.section.as_str(), "skipping EMI-flagged result");
        return None;
    }

    Some(CandidateOffer {
        title: title.to_string(),
        source_url: link.to_string(),
        price_source: PriceSource::Text(text),
        source_name: record.source.clone(),
        image: record.thumbnail.clone(),
        store_logo: record.store_logo.clone(),
    })
}

/// One seller entry of the product panel.
fn seller_candidate(
    seller: &RawResultRecord,
    title: Option<&str>,
    image: Option<String>,
    query: &str,
) -> Option<CandidateOffer> {
    let title = title?;
    let link = seller.link.as_deref()?;

    let values = seller_price_fields(seller);
    if values.is_empty() {
        return None;
    }
    if !is_relevant_title(title, query) {
        return None;
    }
    if signals_emi(&seller.fields) {
        tracing::trace!(link, section = seller.section.as_str(), "skipping EMI-flagged result");
        return None;
    }

    Some(CandidateOffer {
        title: title.to_string(),
        source_url: link.to_string(),
        price_source: PriceSource::Fields(values),
        source_name: seller.source.clone(),
        image,
        store_logo: seller.store_logo.clone(),
    })
}

/// Every amount a seller entry states: the provider's parsed number plus
/// anything currency-marked in its price text fields.
fn seller_price_fields(seller: &RawResultRecord) -> Vec<i64> {
    let mut values: Vec<i64> = Vec::new();

    if let Some(value) = seller.extracted_price.and_then(whole_rupees) {
        values.push(value);
    }
    for key in SELLER_PRICE_TEXT_KEYS {
        if let Some(text) = seller.fields.get(*key).and_then(serde_json::Value::as_str) {
            values.extend(extract_prices(text));
        }
    }
    values
}

#[allow(clippy::cast_possible_truncation)]
fn whole_rupees(value: f64) -> Option<i64> {
    // The range check also rejects NaN and infinities.
    let rounded = value.round();
    (0.0..=1e12).contains(&rounded).then(|| rounded as i64)
}

#[cfg(test)]
#[path = "assemble_test.rs"]
mod tests;
