//! Ranked read model of approved priorities.
//!
//! Every read is a fresh full query; nothing is cached between calls. A
//! [`RankingWatch`] re-runs the query each time the change feed fires.

use crate::services::event_publisher::{PriorityEvent, PriorityFeed};
use futures::Stream;
use priority_common::AppResult;
use priority_db::{
    entities::{PriorityStatus, priority},
    repositories::PriorityRepository,
};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

/// An approved priority with its position in the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedPriority {
    /// 1-based position.
    pub rank: usize,
    #[serde(flatten)]
    pub priority: priority::Model,
}

/// Assign positional ranks to priorities already ordered by votes.
///
/// Non-approved rows are dropped before ranks are assigned.
#[must_use]
pub fn rank(priorities: Vec<priority::Model>) -> Vec<RankedPriority> {
    priorities
        .into_iter()
        .filter(|p| p.status == PriorityStatus::Approved)
        .enumerate()
        .map(|(i, priority)| RankedPriority {
            rank: i + 1,
            priority,
        })
        .collect()
}

/// Ranking service.
#[derive(Clone)]
pub struct RankingService {
    priority_repo: PriorityRepository,
    feed: PriorityFeed,
}

impl RankingService {
    /// Create a new ranking service reading changes from `feed`.
    #[must_use]
    pub const fn new(priority_repo: PriorityRepository, feed: PriorityFeed) -> Self {
        Self {
            priority_repo,
            feed,
        }
    }

    /// Approved priorities, most votes first, ranked from 1.
    ///
    /// Ties keep the order the store returned them in.
    pub async fn list_approved(&self) -> AppResult<Vec<RankedPriority>> {
        let priorities = self.priority_repo.find_approved_by_votes().await?;
        Ok(rank(priorities))
    }

    /// Subscribe to ranking changes.
    ///
    /// The subscription ends when the watch is dropped.
    #[must_use]
    pub fn watch(&self) -> RankingWatch {
        RankingWatch {
            service: self.clone(),
            events: self.feed.subscribe(),
        }
    }
}

/// A live subscription to the ranked list.
pub struct RankingWatch {
    service: RankingService,
    events: broadcast::Receiver<PriorityEvent>,
}

impl RankingWatch {
    /// Wait for the next change and return the fresh ranking.
    ///
    /// Returns `None` once the feed is closed. A subscriber that fell behind
    /// gets one fresh ranking for all the changes it missed.
    pub async fn next(&mut self) -> Option<AppResult<Vec<RankedPriority>>> {
        match self.events.recv().await {
            Ok(event) => {
                tracing::debug!(priority_id = %event.priority_id(), "Ranking changed");
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Ranking subscriber lagged");
            }
            Err(RecvError::Closed) => return None,
        }
        Some(self.service.list_approved().await)
    }

    /// The current ranking followed by a fresh ranking after every change.
    pub fn into_stream(self) -> impl Stream<Item = AppResult<Vec<RankedPriority>>> + Send {
        futures::stream::unfold((self, true), |(mut watch, first)| async move {
            let item = if first {
                watch.service.list_approved().await
            } else {
                watch.next().await?
            };
            Some((item, (watch, false)))
        })
    }
}
