//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use priority_common::AppError;
use priority_core::{AdminIdentity, Session};

use crate::middleware::AppState;

/// Authenticated session extractor.
#[derive(Debug, Clone)]
pub struct AuthSession(pub Session);

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(AuthSession)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional session extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthSession(pub Option<Session>);

impl<S> FromRequestParts<S> for MaybeAuthSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Session>().cloned()))
    }
}

/// Admin session extractor.
///
/// Re-checks the allow-list on every request; a session that fails the
/// check is revoked.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub session: Session,
    pub admin: AdminIdentity,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthSession(session) = AuthSession::from_request_parts(parts, state).await?;
        let (session, admin) = state.auth_service.restore_admin(session.token()).await?;
        Ok(Self { session, admin })
    }
}
