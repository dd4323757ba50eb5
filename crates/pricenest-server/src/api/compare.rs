use axum::{
    extract::{Query, State},
    Extension, Json,
};
use pricenest_core::{format_price_range, StoredOffer};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{
    map_db_error, map_scraper_error, require_query, search_client, ApiError, ApiResponse,
    AppState, ResponseMeta, SearchParams,
};

#[derive(Debug, Serialize)]
pub(super) struct CompareData {
    query: String,
    /// `"₹<lowest> – ₹<highest>"`, absent when nothing was found.
    price_range: Option<String>,
    offers: Vec<StoredOffer>,
}

/// GET /api/v1/compare?q=: live search, persisted, cheapest first.
pub(super) async fn compare(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<CompareData>>, ApiError> {
    let rid = &req_id.0;
    let query = require_query(rid, params.q.as_deref())?;
    let client = search_client(&state, rid)?;

    let comparison = pricenest_scraper::compare_product(client, &state.fetch_pool, &query)
        .await
        .map_err(|e| map_scraper_error(rid.clone(), &e))?;

    let offers = pricenest_db::upsert_offers(&state.pool, &comparison.query, &comparison.offers)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let price_range = match (offers.first(), offers.last()) {
        (Some(lowest), Some(highest)) => Some(format_price_range(
            lowest.offer.price,
            highest.offer.price,
        )),
        _ => None,
    };

    Ok(Json(ApiResponse {
        data: CompareData {
            query: comparison.query,
            price_range,
            offers,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
