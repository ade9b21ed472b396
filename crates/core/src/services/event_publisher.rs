//! Event publisher service.
//!
//! Services publish a [`PriorityEvent`] after every committed write that can
//! change the public ranking. Publishing is best-effort: a failed publish is
//! logged and never fails the write that triggered it.

use async_trait::async_trait;
use priority_common::AppResult;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the in-process change feed.
const FEED_CAPACITY: usize = 256;

/// A change to the set of approved priorities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorityEvent {
    /// A priority entered the approved set.
    Added { id: String },
    /// An approved priority changed, e.g. its vote counter moved.
    Modified { id: String },
    /// A priority left the approved set by rejection or deletion.
    Removed { id: String },
}

impl PriorityEvent {
    /// ID of the priority the event is about.
    #[must_use]
    pub fn priority_id(&self) -> &str {
        match self {
            Self::Added { id } | Self::Modified { id } | Self::Removed { id } => id,
        }
    }
}

/// Trait for publishing ranking change events.
///
/// This allows the core services to publish events without depending on
/// how subscribers are reached.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a priority change.
    async fn publish(&self, event: PriorityEvent) -> AppResult<()>;
}

/// In-process change feed backed by a tokio broadcast channel.
#[derive(Clone)]
pub struct PriorityFeed {
    tx: broadcast::Sender<PriorityEvent>,
}

impl PriorityFeed {
    /// Create a new feed.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Subscribe to changes published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PriorityEvent> {
        self.tx.subscribe()
    }
}

impl Default for PriorityFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for PriorityFeed {
    async fn publish(&self, event: PriorityEvent) -> AppResult<()> {
        // No subscribers is not an error
        if self.tx.send(event).is_err() {
            tracing::trace!("No ranking subscribers");
        }
        Ok(())
    }
}

/// Wrapper for boxed EventPublisher trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;

/// Publish through an optional publisher, logging failures.
pub(crate) async fn publish_best_effort(
    publisher: Option<&EventPublisherService>,
    event: PriorityEvent,
) {
    if let Some(publisher) = publisher {
        let id = event.priority_id().to_string();
        if let Err(e) = publisher.publish(event).await {
            tracing::warn!(error = %e, priority_id = %id, "Failed to publish priority event");
        }
    }
}
