//! Priority endpoints: the public ranking and submissions.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use priority_common::{AppError, AppResult};
use priority_core::{
    ListFilter, PriorityCard, SubmitPriorityInput,
    view::{excerpt, priority_cards},
};
use priority_db::entities::{PriorityStatus, priority};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthSession, MaybeAuthSession},
    middleware::AppState,
    response::{ApiResponse, Created},
};

/// Ranking query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: ListFilter,
}

/// Ranked list of approved priorities.
async fn list(
    MaybeAuthSession(session): MaybeAuthSession,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<PriorityCard>>> {
    let ranked = state.ranking_service.list_approved().await?;
    let voted = match &session {
        Some(s) => Some(s.voted().await),
        None => None,
    };

    let cards = priority_cards(&ranked, voted.as_ref());
    Ok(ApiResponse::ok(query.filter.apply(cards)))
}

/// Public view of a single approved priority.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub excerpt: Option<String>,
    pub category: String,
    pub votes: i32,
    pub submitted_by_name: String,
    pub created_at: String,
    pub has_voted: bool,
}

/// Get an approved priority.
///
/// Pending and rejected priorities are reported as not found.
async fn show(
    MaybeAuthSession(session): MaybeAuthSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PriorityResponse>> {
    let p = state.priority_service.get(&id).await?;
    if p.status != PriorityStatus::Approved {
        return Err(AppError::PriorityNotFound(id));
    }

    let has_voted = match &session {
        Some(s) => s.has_voted(&p.id).await,
        None => false,
    };

    Ok(ApiResponse::ok(PriorityResponse {
        excerpt: excerpt(&p.description),
        id: p.id,
        title: p.title,
        description: p.description,
        category: p.category,
        votes: p.votes,
        submitted_by_name: p.submitted_by_name,
        created_at: p.created_at.to_rfc3339(),
        has_voted,
    }))
}

/// Submission receipt.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: String,
    pub title: String,
    pub status: PriorityStatus,
    pub created_at: String,
}

impl From<priority::Model> for SubmissionResponse {
    fn from(p: priority::Model) -> Self {
        Self {
            id: p.id,
            title: p.title,
            status: p.status,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Submit a priority for review.
async fn submit(
    AuthSession(session): AuthSession,
    State(state): State<AppState>,
    Json(input): Json<SubmitPriorityInput>,
) -> AppResult<Created<SubmissionResponse>> {
    let created = state
        .priority_service
        .submit(session.identity(), input)
        .await?;

    Ok(ApiResponse::created(created.into()))
}

/// Create priorities router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(submit))
        .route("/{id}", get(show))
}
