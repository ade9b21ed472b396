//! API endpoints.

mod admin;
mod auth;
mod priorities;
mod stats;
mod votes;

use axum::Router;

use crate::middleware::AppState;
use crate::sse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/priorities", priorities::router())
        .nest("/votes", votes::router())
        .nest("/stats", stats::router())
        .nest("/admin", admin::router())
        .nest("/streaming/sse", sse::router())
}
