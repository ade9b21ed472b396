//! API integration tests.
//!
//! These tests drive the router end to end against a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode},
    middleware,
};
use futures::{Stream, StreamExt};
use maplit::btreemap;
use priority_api::{AppState, auth_middleware, router as api_router};
use priority_common::{AppError, AppResult};
use priority_core::{
    AdminAllowList, AuthService, Identity, IdentityProvider, ModerationService, PriorityFeed,
    PriorityService, RankingService, SessionStore, StatsService, VoteService,
};
use priority_db::{
    entities::{PriorityStatus, priority, user},
    repositories::{PriorityRepository, UserRepository, VoteRepository},
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
use serde_json::Value as Json;
use tower::ServiceExt;

/// Treats the credential as the email address.
struct StaticProvider;

#[async_trait]
impl IdentityProvider for StaticProvider {
    async fn verify(&self, credential: &str) -> AppResult<Identity> {
        if !credential.contains('@') {
            return Err(AppError::Unauthorized);
        }
        Ok(Identity {
            uid: format!("uid-{credential}"),
            email: credential.to_string(),
            display_name: None,
            photo_url: None,
        })
    }
}

fn create_test_user(email: &str) -> user::Model {
    user::Model {
        id: format!("uid-{email}"),
        email: email.to_string(),
        display_name: None,
        photo_url: None,
        created_at: chrono::Utc::now().into(),
        last_login: chrono::Utc::now().into(),
    }
}

fn create_test_priority(id: &str, status: PriorityStatus, votes: i32) -> priority::Model {
    priority::Model {
        id: id.to_string(),
        title: "Clean water access".to_string(),
        description: "Everyone should have clean drinking water".to_string(),
        category: "Health".to_string(),
        status,
        votes,
        submitted_by: "uid-ada@example.com".to_string(),
        submitted_by_email: "ada@example.com".to_string(),
        submitted_by_name: "ada".to_string(),
        created_at: chrono::Utc::now().into(),
        last_vote_at: None,
        approved_at: None,
        approved_by: None,
        rejected_at: None,
        rejected_by: None,
        rejection_reason: None,
    }
}

fn exec(rows: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: rows,
    }
}

/// Mock for a sign-in: profile upsert, then the user's votes.
fn with_sign_in(mock: MockDatabase, email: &str) -> MockDatabase {
    mock.append_query_results([[create_test_user(email)]])
        .append_query_results([Vec::<std::collections::BTreeMap<&str, Value>>::new()])
}

/// Create test app state with mock database.
fn create_test_state(db: DatabaseConnection) -> AppState {
    let db = Arc::new(db);
    let feed = PriorityFeed::new();

    let priority_repo = PriorityRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));
    let user_repo = UserRepository::new(Arc::clone(&db));

    let mut vote_service = VoteService::new(vote_repo.clone());
    vote_service.set_event_publisher(Arc::new(feed.clone()));
    let mut moderation_service = ModerationService::new(priority_repo.clone());
    moderation_service.set_event_publisher(Arc::new(feed.clone()));

    let auth_service = AuthService::new(
        Arc::new(StaticProvider),
        user_repo.clone(),
        vote_service.clone(),
        SessionStore::new(),
        AdminAllowList::new(["admin@example.com"]),
    );

    AppState {
        auth_service,
        priority_service: PriorityService::new(priority_repo.clone()),
        vote_service,
        moderation_service,
        ranking_service: RankingService::new(priority_repo.clone(), feed),
        stats_service: StatsService::new(priority_repo, vote_repo, user_repo),
    }
}

/// Create the test router.
fn create_test_app(db: DatabaseConnection) -> Router {
    let state = create_test_state(db);
    api_router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Read the next complete SSE event, or `None` once the stream has ended.
async fn next_event<S>(frames: &mut S) -> Option<String>
where
    S: Stream<Item = Result<Bytes, axum::Error>> + Unpin,
{
    let mut text = String::new();
    while !text.contains("\n\n") {
        let chunk = tokio::time::timeout(Duration::from_secs(2), frames.next())
            .await
            .expect("timed out waiting for an event")?;
        text.push_str(std::str::from_utf8(&chunk.unwrap()).unwrap());
    }
    Some(text)
}

/// The JSON payload of an SSE event.
fn event_data(event: &str) -> Json {
    let data = event
        .lines()
        .find_map(|line| line.strip_prefix("data:"))
        .unwrap();
    serde_json::from_str(data.trim()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Json {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn sign_in(app: &Router, uri: &str, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            uri,
            None,
            &format!(r#"{{"credential":"{email}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_list_priorities_empty() {
    let app = create_test_app(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<priority::Model>::new()])
            .into_connection(),
    );

    let response = app
        .oneshot(json_request("GET", "/priorities", None, ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_list_priorities_ranked_cards() {
    let app = create_test_app(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                create_test_priority("p1", PriorityStatus::Approved, 9),
                create_test_priority("p2", PriorityStatus::Approved, 4),
            ]])
            .into_connection(),
    );

    let response = app
        .oneshot(json_request("GET", "/priorities?filter=trending", None, ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["rank"], 1);
    assert_eq!(body["data"][0]["rankLabel"], "🥇");
    assert_eq!(body["data"][1]["rankLabel"], "🥈");
    assert_eq!(body["data"][0]["canVote"], false);
}

#[tokio::test]
async fn test_submit_requires_session() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(json_request(
            "POST",
            "/priorities",
            None,
            r#"{"title":"Clean water access","description":"For everyone","category":"Health"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_sign_in_and_submit() {
    let mock = with_sign_in(
        MockDatabase::new(DatabaseBackend::Postgres),
        "ada@example.com",
    )
    .append_query_results([[create_test_priority("p1", PriorityStatus::Pending, 0)]]);
    let app = create_test_app(mock.into_connection());

    let token = sign_in(&app, "/auth/signin", "ada@example.com").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/priorities",
            Some(&token),
            r#"{"title":"Clean water access","description":"For everyone","category":"Health"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["status"], "pending");
}

#[tokio::test]
async fn test_vote_then_duplicate_vote() {
    let mock = with_sign_in(
        MockDatabase::new(DatabaseBackend::Postgres),
        "ada@example.com",
    )
    .append_exec_results([exec(1), exec(1)]);
    let app = create_test_app(mock.into_connection());

    let token = sign_in(&app, "/auth/signin", "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/votes",
            Some(&token),
            r#"{"priorityId":"p1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Rejected by the session cache: the mock has no results left
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/votes",
            Some(&token),
            r#"{"priorityId":"p1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "ALREADY_VOTED");

    let response = app
        .oneshot(json_request("GET", "/auth/me", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await["data"]["votedPriorityIds"],
        serde_json::json!(["p1"])
    );
}

#[tokio::test]
async fn test_vote_for_missing_priority() {
    let mock = with_sign_in(
        MockDatabase::new(DatabaseBackend::Postgres),
        "ada@example.com",
    )
    .append_exec_results([exec(0)]);
    let app = create_test_app(mock.into_connection());

    let token = sign_in(&app, "/auth/signin", "ada@example.com").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/votes",
            Some(&token),
            r#"{"priorityId":"gone"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sign_in_with_bad_credential() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/signin",
            None,
            r#"{"credential":"not-a-token"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let mock = with_sign_in(
        MockDatabase::new(DatabaseBackend::Postgres),
        "ada@example.com",
    );
    let app = create_test_app(mock.into_connection());

    let token = sign_in(&app, "/auth/signin", "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/signout", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"]["ok"], true);

    let response = app
        .oneshot(json_request("GET", "/auth/me", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_sign_in_denied_for_unlisted_email() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(json_request(
            "POST",
            "/admin/signin",
            None,
            r#"{"credential":"ada@example.com"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"]["code"], "AUTH_DENIED");
}

#[tokio::test]
async fn test_admin_route_revokes_non_admin_session() {
    let mock = with_sign_in(
        MockDatabase::new(DatabaseBackend::Postgres),
        "ada@example.com",
    );
    let app = create_test_app(mock.into_connection());

    let token = sign_in(&app, "/auth/signin", "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/admin/stats", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(json_request("GET", "/auth/me", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_approve_and_invalid_transition() {
    let mock = with_sign_in(
        MockDatabase::new(DatabaseBackend::Postgres),
        "admin@example.com",
    )
    .append_query_results([[create_test_priority("p1", PriorityStatus::Pending, 0)]])
    .append_exec_results([exec(1)])
    .append_query_results([[create_test_priority("p1", PriorityStatus::Approved, 0)]]);
    let app = create_test_app(mock.into_connection());

    let token = sign_in(&app, "/admin/signin", "admin@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/admin/priorities/p1/approve",
            Some(&token),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["actions"], serde_json::json!(["reject", "delete"]));

    let response = app
        .oneshot(json_request(
            "POST",
            "/admin/priorities/p1/approve",
            Some(&token),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "INVALID_TRANSITION"
    );
}

#[tokio::test]
async fn test_admin_submissions_by_status() {
    let mut rejected = create_test_priority("p2", PriorityStatus::Rejected, 0);
    rejected.rejection_reason = Some("duplicate".to_string());

    let mock = with_sign_in(
        MockDatabase::new(DatabaseBackend::Postgres),
        "admin@example.com",
    )
    .append_query_results([[rejected]]);
    let app = create_test_app(mock.into_connection());

    let token = sign_in(&app, "/admin/signin", "admin@example.com").await;

    let response = app
        .oneshot(json_request(
            "GET",
            "/admin/submissions?status=rejected",
            Some(&token),
            "",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["items"][0]["rejectionReason"], "duplicate");
}

#[tokio::test]
async fn test_public_stats() {
    let count = |n: i64| vec![btreemap! { "num_items" => Value::BigInt(Some(n)) }];
    let app = create_test_app(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count(7), count(2), count(3)])
            .append_query_results([vec![btreemap! { "email" => Value::from("a@example.com") }]])
            .into_connection(),
    );

    let response = app
        .oneshot(json_request("GET", "/stats", None, ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["totalVotes"], 7);
    assert_eq!(body["data"]["countries"], 1);
}

#[tokio::test]
async fn test_sse_priorities_sends_ranking_on_connect() {
    let app = create_test_app(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                create_test_priority("p1", PriorityStatus::Approved, 9),
                create_test_priority("p2", PriorityStatus::Approved, 4),
            ]])
            .into_connection(),
    );

    let response = app
        .oneshot(json_request("GET", "/streaming/sse/priorities", None, ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap_or(""));
    assert!(content_type.unwrap().contains("text/event-stream"));

    let mut frames = std::pin::pin!(response.into_body().into_data_stream());
    let event = next_event(&mut frames).await.unwrap();
    assert!(event.contains("event: ranking"));

    let data = event_data(&event);
    assert_eq!(data["type"], "ranking");
    assert_eq!(data["items"][0]["id"], "p1");
    assert_eq!(data["items"][0]["rank"], 1);
    assert_eq!(data["items"][0]["rankLabel"], "🥇");
    assert_eq!(data["items"][0]["title"], "Clean water access");
    assert_eq!(data["items"][1]["rank"], 2);
    assert_eq!(data["items"][1]["canVote"], false);
}

#[tokio::test]
async fn test_sse_stream_ends_on_sign_out() {
    let app = create_test_app(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("ada@example.com")]])
            .append_query_results([vec![btreemap! { "priority_id" => Value::from("p1") }]])
            .append_query_results([[create_test_priority("p1", PriorityStatus::Approved, 1)]])
            .into_connection(),
    );

    let token = sign_in(&app, "/auth/signin", "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/streaming/sse/priorities",
            Some(&token),
            "",
        ))
        .await
        .unwrap();
    let mut frames = std::pin::pin!(response.into_body().into_data_stream());

    let event = next_event(&mut frames).await.unwrap();
    assert_eq!(event_data(&event)["items"][0]["hasVoted"], true);

    let response = app
        .oneshot(json_request("POST", "/auth/signout", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"]["ok"], true);

    assert!(next_event(&mut frames).await.is_none());
}

#[tokio::test]
async fn test_admin_reject_without_body_uses_default_reason() {
    let mock = with_sign_in(
        MockDatabase::new(DatabaseBackend::Postgres),
        "admin@example.com",
    )
    .append_query_results([[create_test_priority("p1", PriorityStatus::Pending, 0)]])
    .append_exec_results([exec(1)]);
    let app = create_test_app(mock.into_connection());

    let token = sign_in(&app, "/admin/signin", "admin@example.com").await;

    let request = Request::builder()
        .uri("/admin/priorities/p1/reject")
        .method("POST")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "rejected");
    assert_eq!(body["data"]["rejectionReason"], "No reason provided");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(json_request("GET", "/nonexistent", None, ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
