//! Sign-in sessions.
//!
//! A session binds an opaque bearer token to a verified identity and carries
//! the session-local vote cache. The cache is an optimization for the UI and
//! a first guard against duplicate votes; the store's unique vote key stays
//! authoritative.

use crate::services::identity::Identity;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{RwLock, watch};

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    identity: Identity,
    votes: Arc<RwLock<HashSet<String>>>,
    closed: Arc<watch::Sender<bool>>,
}

impl Session {
    /// Create a session seeded with the priority IDs the user has voted for.
    #[must_use]
    pub fn new(token: String, identity: Identity, voted: HashSet<String>) -> Self {
        Self {
            token,
            identity,
            votes: Arc::new(RwLock::new(voted)),
            closed: Arc::new(watch::Sender::new(false)),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Provider uid of the signed-in user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.identity.uid
    }

    /// Whether the cache records a vote for the priority.
    pub async fn has_voted(&self, priority_id: &str) -> bool {
        self.votes.read().await.contains(priority_id)
    }

    /// Record a committed vote in the cache.
    pub async fn remember_vote(&self, priority_id: &str) {
        self.votes.write().await.insert(priority_id.to_string());
    }

    /// Snapshot of the cached voted set.
    pub async fn voted(&self) -> HashSet<String> {
        self.votes.read().await.clone()
    }

    /// Mark the session as ended. Every clone observes it.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    /// Resolves once the session has been closed.
    ///
    /// Long-lived consumers such as the live feed stop on this.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives as long as `self`, so this only returns once closed
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

/// In-process session registry keyed by token.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session);
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Remove and close a session. Returns whether it existed.
    pub async fn remove(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token);
        let Some(session) = removed else {
            return false;
        };
        session.close();
        true
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
