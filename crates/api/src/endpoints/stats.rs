//! Public statistics endpoint.

use axum::{Router, extract::State, routing::get};
use priority_common::AppResult;
use priority_core::PublicStats;

use crate::{middleware::AppState, response::ApiResponse};

/// Headline numbers for the public page.
async fn show(State(state): State<AppState>) -> AppResult<ApiResponse<PublicStats>> {
    let stats = state.stats_service.public_stats().await?;
    Ok(ApiResponse::ok(stats))
}

/// Create stats router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(show))
}
