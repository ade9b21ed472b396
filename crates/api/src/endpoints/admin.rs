//! Moderation console endpoints.
//!
//! Everything except sign-in goes through [`AdminSession`], which re-checks
//! the allow-list on every request.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::IntoResponse,
    routing::{delete, get, post},
};
use priority_common::AppResult;
use priority_core::{AdminStats, SubmissionCard, SubmissionList, view::submission_list};
use priority_db::entities::PriorityStatus;
use serde::Deserialize;
use validator::Validate;

use crate::{
    endpoints::auth::{SigninRequest, SigninResponse},
    extractors::AdminSession,
    middleware::{AppState, bearer_token},
    response::{self, ApiResponse},
};

/// Sign in to the moderation console. Unlisted identities are refused.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SigninResponse>> {
    req.validate()?;

    let (session, _admin) = state.auth_service.admin_sign_in(&req.credential).await?;
    Ok(ApiResponse::ok(
        SigninResponse::from_session(&session, true).await,
    ))
}

/// Sign out of the moderation console.
async fn signout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = bearer_token(headers.get(header::AUTHORIZATION)) {
        state.auth_service.sign_out(token).await;
    }
    response::ok()
}

/// Console summary.
async fn stats(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<AdminStats>> {
    let stats = state.stats_service.admin_stats().await?;
    Ok(ApiResponse::ok(stats))
}

/// Submissions query parameters.
#[derive(Debug, Deserialize)]
pub struct SubmissionsQuery {
    #[serde(default)]
    pub status: PriorityStatus,
}

/// Submissions with one status, newest first.
async fn submissions(
    AdminSession { admin, .. }: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<SubmissionsQuery>,
) -> AppResult<ApiResponse<SubmissionList>> {
    let priorities = state
        .moderation_service
        .list_by_status(&admin, query.status)
        .await?;

    Ok(ApiResponse::ok(submission_list(query.status, &priorities)))
}

/// Approve a priority.
async fn approve(
    AdminSession { admin, .. }: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<SubmissionCard>> {
    let approved = state.moderation_service.approve(&admin, &id).await?;
    Ok(ApiResponse::ok(SubmissionCard::from(&approved)))
}

/// Reject request.
#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

/// Reject a priority.
///
/// The body is optional; without one the default reason is recorded.
async fn reject(
    AdminSession { admin, .. }: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Option<Json<RejectRequest>>,
) -> AppResult<ApiResponse<SubmissionCard>> {
    let req = req.map(|Json(req)| req).unwrap_or_default();
    let rejected = state
        .moderation_service
        .reject(&admin, &id, req.reason.as_deref())
        .await?;
    Ok(ApiResponse::ok(SubmissionCard::from(&rejected)))
}

/// Delete a priority permanently. Its votes are kept.
async fn remove(
    AdminSession { admin, .. }: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.moderation_service.delete(&admin, &id).await?;
    Ok(response::ok())
}

/// Create admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/stats", get(stats))
        .route("/submissions", get(submissions))
        .route("/priorities/{id}", delete(remove))
        .route("/priorities/{id}/approve", post(approve))
        .route("/priorities/{id}/reject", post(reject))
}
