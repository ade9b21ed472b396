//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use priority_core::{
    AuthService, ModerationService, PriorityService, RankingService, StatsService, VoteService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub priority_service: PriorityService,
    pub vote_service: VoteService,
    pub moderation_service: ModerationService,
    pub ranking_service: RankingService,
    pub stats_service: StatsService,
}

/// Bearer token from an `Authorization` header value.
pub(crate) fn bearer_token(req_header: Option<&header::HeaderValue>) -> Option<&str> {
    req_header?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware.
///
/// Attaches the session for a known bearer token. Unknown tokens pass
/// through as anonymous requests; extractors decide what needs a session.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers().get(header::AUTHORIZATION))
        && let Some(session) = state.auth_service.restore(token).await
    {
        req.extensions_mut().insert(session);
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let value = HeaderValue::from_static("Bearer abc123");
        assert_eq!(bearer_token(Some(&value)), Some("abc123"));

        let value = HeaderValue::from_static("Basic abc123");
        assert_eq!(bearer_token(Some(&value)), None);

        let value = HeaderValue::from_static("Bearer ");
        assert_eq!(bearer_token(Some(&value)), None);

        assert_eq!(bearer_token(None), None);
    }
}
