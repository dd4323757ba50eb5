use axum::{
    extract::{Query, State},
    Extension, Json,
};
use pricenest_core::{normalize_query, StoredOffer};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{
    map_db_error, require_query, ApiError, ApiResponse, AppState, ResponseMeta, SearchParams,
};

#[derive(Debug, Serialize)]
pub(super) struct OffersData {
    query: String,
    offers: Vec<StoredOffer>,
}

/// GET /api/v1/offers?q=: offers stored by the last capture, cheapest first.
pub(super) async fn list_offers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<OffersData>>, ApiError> {
    let query = require_query(&req_id.0, params.q.as_deref())?;

    let offers = pricenest_db::get_offers(&state.pool, &query)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: OffersData {
            query: normalize_query(&query),
            offers,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
