//! Vote service.
//!
//! Casting a vote goes through two guards. The session cache rejects repeat
//! clicks without touching the store. The store rejects anything the cache
//! missed: every vote for a (user, priority) pair gets the same record ID, so
//! a second insert collides and the counter increment in the same transaction
//! is rolled back with it.

use crate::services::event_publisher::{EventPublisherService, PriorityEvent, publish_best_effort};
use crate::services::session::Session;
use priority_common::{AppError, AppResult};
use priority_db::{entities::vote, repositories::VoteRepository};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Length of a vote record ID in hex characters.
const VOTE_ID_LEN: usize = 32;

/// Deterministic vote record ID for a (user, priority) pair.
#[must_use]
pub fn vote_id(user_id: &str, priority_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(b":");
    hasher.update(priority_id.as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(VOTE_ID_LEN);
    id
}

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    vote_repo: VoteRepository,
    event_publisher: Option<EventPublisherService>,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository) -> Self {
        Self {
            vote_repo,
            event_publisher: None,
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Priority IDs the user has voted for.
    pub async fn load_user_votes(&self, user_id: &str) -> AppResult<HashSet<String>> {
        let ids = self.vote_repo.find_priority_ids_by_user(user_id).await?;
        Ok(ids.into_iter().collect())
    }

    /// Cast a vote for a priority on behalf of the session's user.
    ///
    /// The session cache is updated only after the store commits, or when
    /// the store reports the vote already exists.
    pub async fn cast_vote(&self, session: &Session, priority_id: &str) -> AppResult<vote::Model> {
        if session.user_id().is_empty() {
            return Err(AppError::Unauthorized);
        }
        if priority_id.is_empty() {
            return Err(AppError::ValidationFailed("priority id is required".to_string()));
        }

        if session.has_voted(priority_id).await {
            return Err(AppError::AlreadyVoted(priority_id.to_string()));
        }

        let model = vote::Model {
            id: vote_id(session.user_id(), priority_id),
            user_id: session.user_id().to_string(),
            priority_id: priority_id.to_string(),
            voted_at: chrono::Utc::now().into(),
        };

        match self.vote_repo.record(model).await {
            Ok(recorded) => {
                session.remember_vote(priority_id).await;
                tracing::info!(
                    user_id = %recorded.user_id,
                    priority_id = %recorded.priority_id,
                    "Vote recorded"
                );

                publish_best_effort(
                    self.event_publisher.as_ref(),
                    PriorityEvent::Modified {
                        id: priority_id.to_string(),
                    },
                )
                .await;

                Ok(recorded)
            }
            Err(AppError::AlreadyVoted(id)) => {
                // Another session of the same user got there first
                session.remember_vote(&id).await;
                Err(AppError::AlreadyVoted(id))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::event_publisher::{EventPublisher, PriorityFeed};
    use crate::services::identity::Identity;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, RuntimeErr};
    use std::sync::Arc;

    fn session(voted: &[&str]) -> Session {
        Session::new(
            "token".to_string(),
            Identity {
                uid: "user2".to_string(),
                email: "user2@example.com".to_string(),
                display_name: None,
                photo_url: None,
            },
            voted.iter().map(|s| (*s).to_string()).collect(),
        )
    }

    fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    #[test]
    fn test_vote_id_is_deterministic() {
        let a = vote_id("user2", "p1");
        assert_eq!(a, vote_id("user2", "p1"));
        assert_eq!(a.len(), VOTE_ID_LEN);
        assert_ne!(a, vote_id("user2", "p2"));
        assert_ne!(a, vote_id("user3", "p1"));
    }

    #[test]
    fn test_vote_id_separates_fields() {
        assert_ne!(vote_id("ab", "c"), vote_id("a", "bc"));
    }

    #[tokio::test]
    async fn test_cast_vote_records_and_caches() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1), exec(1)])
                .into_connection(),
        );
        let feed = PriorityFeed::new();
        let mut rx = feed.subscribe();

        let mut service = VoteService::new(VoteRepository::new(db));
        service.set_event_publisher(Arc::new(feed));

        let s = session(&[]);
        let recorded = service.cast_vote(&s, "p1").await.unwrap();

        assert_eq!(recorded.id, vote_id("user2", "p1"));
        assert!(s.has_voted("p1").await);
        assert_eq!(
            rx.recv().await.unwrap(),
            PriorityEvent::Modified { id: "p1".to_string() }
        );
    }

    #[tokio::test]
    async fn test_cached_vote_skips_store() {
        // No mock results: any store access would fail the test
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = VoteService::new(VoteRepository::new(db));

        let result = service.cast_vote(&session(&["p1"]), "p1").await;
        assert!(matches!(result, Err(AppError::AlreadyVoted(id)) if id == "p1"));
    }

    #[tokio::test]
    async fn test_missing_priority_leaves_cache_untouched() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(0)])
                .into_connection(),
        );
        let service = VoteService::new(VoteRepository::new(db));
        let s = session(&[]);

        let result = service.cast_vote(&s, "gone").await;
        assert!(matches!(result, Err(AppError::PriorityNotFound(_))));
        assert!(!s.has_voted("gone").await);
    }

    #[tokio::test]
    async fn test_store_failure_leaves_cache_untouched() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .append_exec_errors([DbErr::Exec(RuntimeErr::Internal(
                    "connection reset".to_string(),
                ))])
                .into_connection(),
        );
        let service = VoteService::new(VoteRepository::new(db));
        let s = session(&[]);

        let result = service.cast_vote(&s, "p1").await;
        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
        assert!(!s.has_voted("p1").await);
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_vote() {
        struct FailingPublisher;

        #[async_trait::async_trait]
        impl EventPublisher for FailingPublisher {
            async fn publish(&self, _event: PriorityEvent) -> AppResult<()> {
                Err(AppError::Internal("feed down".to_string()))
            }
        }

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1), exec(1)])
                .into_connection(),
        );
        let mut service = VoteService::new(VoteRepository::new(db));
        service.set_event_publisher(Arc::new(FailingPublisher));

        assert!(service.cast_vote(&session(&[]), "p1").await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_priority_id_is_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = VoteService::new(VoteRepository::new(db));

        assert!(matches!(
            service.cast_vote(&session(&[]), "").await,
            Err(AppError::ValidationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_load_user_votes() {
        use maplit::btreemap;
        use sea_orm::Value;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    btreemap! { "priority_id" => Value::from("p1") },
                    btreemap! { "priority_id" => Value::from("p3") },
                ]])
                .into_connection(),
        );
        let service = VoteService::new(VoteRepository::new(db));
        let voted = service.load_user_votes("user2").await.unwrap();

        assert_eq!(voted.len(), 2);
        assert!(voted.contains("p3"));
    }
}
