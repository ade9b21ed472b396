//! Vote endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use priority_common::AppResult;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthSession,
    middleware::AppState,
    response::{ApiResponse, Created},
};

/// Vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub priority_id: String,
}

/// Vote response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: String,
    pub priority_id: String,
    pub voted_at: String,
}

/// Cast a vote. Each user gets one vote per priority.
async fn cast(
    AuthSession(session): AuthSession,
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> AppResult<Created<VoteResponse>> {
    let vote = state
        .vote_service
        .cast_vote(&session, &req.priority_id)
        .await?;

    Ok(ApiResponse::created(VoteResponse {
        id: vote.id,
        priority_id: vote.priority_id,
        voted_at: vote.voted_at.to_rfc3339(),
    }))
}

/// Voted priorities response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyVotesResponse {
    pub priority_ids: Vec<String>,
}

/// Priorities the signed-in user has voted for, read from the store.
async fn mine(
    AuthSession(session): AuthSession,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MyVotesResponse>> {
    let voted = state.vote_service.load_user_votes(session.user_id()).await?;
    let mut priority_ids: Vec<String> = voted.into_iter().collect();
    priority_ids.sort();

    Ok(ApiResponse::ok(MyVotesResponse { priority_ids }))
}

/// Create votes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(cast))
        .route("/mine", get(mine))
}
