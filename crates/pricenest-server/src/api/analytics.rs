use axum::{
    extract::{Query, State},
    Extension, Json,
};
use pricenest_analytics::AnalyticsOutcome;

use crate::middleware::RequestId;

use super::{
    map_db_error, require_query, ApiError, ApiResponse, AppState, ResponseMeta, SearchParams,
};

/// GET /api/v1/analytics?q=: report over the query's full price history.
///
/// A query with no history still answers 200; `data` then carries the
/// insufficient-data body instead of a report.
pub(super) async fn get_analytics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<AnalyticsOutcome>>, ApiError> {
    let query = require_query(&req_id.0, params.q.as_deref())?;

    let history = pricenest_db::get_observations(&state.pool, &query)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let outcome = pricenest_analytics::analyze(&history);
    tracing::debug!(
        query = %query,
        observations = history.len(),
        insufficient = outcome.is_insufficient(),
        "analytics computed"
    );

    Ok(Json(ApiResponse {
        data: outcome,
        meta: ResponseMeta::new(req_id.0),
    }))
}
