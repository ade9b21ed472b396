//! Authentication endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header},
    routing::{get, post},
};
use priority_common::AppResult;
use priority_core::{Identity, Session};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::AuthSession,
    middleware::{AppState, bearer_token},
    response::ApiResponse,
};

/// Signin request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    /// ID token issued by the identity provider.
    #[validate(length(min = 1))]
    pub credential: String,
}

/// Signin response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub token: String,
    pub user: Identity,
    pub voted_priority_ids: Vec<String>,
    pub is_admin: bool,
}

impl SigninResponse {
    pub(crate) async fn from_session(session: &Session, is_admin: bool) -> Self {
        let mut voted: Vec<String> = session.voted().await.into_iter().collect();
        voted.sort();
        Self {
            token: session.token().to_string(),
            user: session.identity().clone(),
            voted_priority_ids: voted,
            is_admin,
        }
    }
}

/// Sign in with a provider credential.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SigninResponse>> {
    req.validate()?;

    let session = state.auth_service.sign_in(&req.credential).await?;
    let is_admin = state.auth_service.is_admin_email(&session.identity().email);

    Ok(ApiResponse::ok(
        SigninResponse::from_session(&session, is_admin).await,
    ))
}

/// Signout response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignoutResponse {
    pub ok: bool,
}

/// Sign out and drop the session.
///
/// Signing out with an unknown token is not an error.
async fn signout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResponse<SignoutResponse> {
    let ok = match bearer_token(headers.get(header::AUTHORIZATION)) {
        Some(token) => state.auth_service.sign_out(token).await,
        None => false,
    };
    ApiResponse::ok(SignoutResponse { ok })
}

/// Current session.
async fn me(
    AuthSession(session): AuthSession,
    State(state): State<AppState>,
) -> ApiResponse<SigninResponse> {
    let is_admin = state.auth_service.is_admin_email(&session.identity().email);
    ApiResponse::ok(SigninResponse::from_session(&session, is_admin).await)
}

/// Create auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/me", get(me))
}
