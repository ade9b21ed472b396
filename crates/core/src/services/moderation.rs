//! Moderation service.
//!
//! Priorities move through `pending`, `approved` and `rejected`. Deletion
//! removes the row but never its votes. The allowed moves are encoded once in
//! [`transition`]; the service applies them as compare-and-swap updates on the
//! status the decision was made against, so two admins acting on the same row
//! cannot silently overwrite each other.

use crate::services::event_publisher::{EventPublisherService, PriorityEvent, publish_best_effort};
use crate::services::identity::AdminIdentity;
use priority_common::{AppError, AppResult};
use priority_db::{
    entities::{PriorityStatus, priority},
    repositories::PriorityRepository,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// Reason recorded when an admin rejects without giving one.
pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";

/// A moderation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
    Delete,
}

impl ModerationAction {
    pub const ALL: [Self; 3] = [Self::Approve, Self::Reject, Self::Delete];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Delete => "delete",
        }
    }
}

/// Outcome of applying an action to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    MoveTo(PriorityStatus),
    Remove,
}

/// The moderation transition table.
pub fn transition(from: PriorityStatus, action: ModerationAction) -> AppResult<Transition> {
    match (from, action) {
        (PriorityStatus::Pending | PriorityStatus::Rejected, ModerationAction::Approve) => {
            Ok(Transition::MoveTo(PriorityStatus::Approved))
        }
        (PriorityStatus::Pending | PriorityStatus::Approved, ModerationAction::Reject) => {
            Ok(Transition::MoveTo(PriorityStatus::Rejected))
        }
        (_, ModerationAction::Delete) => Ok(Transition::Remove),
        (from, action) => Err(AppError::InvalidTransition {
            from: from.as_str(),
            action: action.as_str(),
        }),
    }
}

/// Actions the table allows from a status.
#[must_use]
pub fn allowed_actions(from: PriorityStatus) -> Vec<ModerationAction> {
    ModerationAction::ALL
        .into_iter()
        .filter(|action| transition(from, *action).is_ok())
        .collect()
}

/// Moderation service for business logic.
#[derive(Clone)]
pub struct ModerationService {
    priority_repo: PriorityRepository,
    event_publisher: Option<EventPublisherService>,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(priority_repo: PriorityRepository) -> Self {
        Self {
            priority_repo,
            event_publisher: None,
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Priorities with the given status, newest first.
    pub async fn list_by_status(
        &self,
        _admin: &AdminIdentity,
        status: PriorityStatus,
    ) -> AppResult<Vec<priority::Model>> {
        self.priority_repo.find_by_status(status).await
    }

    /// Approve a pending or rejected priority.
    ///
    /// Earlier rejection fields are left in place as history.
    pub async fn approve(&self, admin: &AdminIdentity, id: &str) -> AppResult<priority::Model> {
        let current = self.priority_repo.get_by_id(id).await?;
        let Transition::MoveTo(to) = transition(current.status, ModerationAction::Approve)? else {
            return Err(AppError::Internal("approve must move to a status".to_string()));
        };

        let now = chrono::Utc::now();
        let changes = priority::ActiveModel {
            status: Set(to),
            approved_at: Set(Some(now.into())),
            approved_by: Set(Some(admin.email().to_string())),
            ..Default::default()
        };
        self.compare_and_swap(&current, changes).await?;

        tracing::info!(priority_id = %id, admin = %admin.email(), "Priority approved");
        publish_best_effort(
            self.event_publisher.as_ref(),
            PriorityEvent::Added { id: id.to_string() },
        )
        .await;

        Ok(priority::Model {
            status: to,
            approved_at: Some(now.into()),
            approved_by: Some(admin.email().to_string()),
            ..current
        })
    }

    /// Reject a pending or approved priority.
    ///
    /// A blank reason is recorded as [`DEFAULT_REJECTION_REASON`]. Earlier
    /// approval fields are left in place as history.
    pub async fn reject(
        &self,
        admin: &AdminIdentity,
        id: &str,
        reason: Option<&str>,
    ) -> AppResult<priority::Model> {
        let current = self.priority_repo.get_by_id(id).await?;
        let Transition::MoveTo(to) = transition(current.status, ModerationAction::Reject)? else {
            return Err(AppError::Internal("reject must move to a status".to_string()));
        };

        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REJECTION_REASON)
            .to_string();
        let now = chrono::Utc::now();
        let changes = priority::ActiveModel {
            status: Set(to),
            rejected_at: Set(Some(now.into())),
            rejected_by: Set(Some(admin.email().to_string())),
            rejection_reason: Set(Some(reason.clone())),
            ..Default::default()
        };
        self.compare_and_swap(&current, changes).await?;

        tracing::info!(
            priority_id = %id,
            admin = %admin.email(),
            reason = %reason,
            "Priority rejected"
        );
        if current.status == PriorityStatus::Approved {
            publish_best_effort(
                self.event_publisher.as_ref(),
                PriorityEvent::Removed { id: id.to_string() },
            )
            .await;
        }

        Ok(priority::Model {
            status: to,
            rejected_at: Some(now.into()),
            rejected_by: Some(admin.email().to_string()),
            rejection_reason: Some(reason),
            ..current
        })
    }

    /// Delete a priority permanently. Its votes are kept.
    pub async fn delete(&self, admin: &AdminIdentity, id: &str) -> AppResult<()> {
        let current = self.priority_repo.get_by_id(id).await?;
        transition(current.status, ModerationAction::Delete)?;

        if self.priority_repo.delete(id).await? == 0 {
            return Err(AppError::PriorityNotFound(id.to_string()));
        }

        tracing::info!(priority_id = %id, admin = %admin.email(), "Priority deleted");
        if current.status == PriorityStatus::Approved {
            publish_best_effort(
                self.event_publisher.as_ref(),
                PriorityEvent::Removed { id: id.to_string() },
            )
            .await;
        }

        Ok(())
    }

    async fn compare_and_swap(
        &self,
        current: &priority::Model,
        changes: priority::ActiveModel,
    ) -> AppResult<()> {
        let updated = self
            .priority_repo
            .update_if_status(&current.id, current.status, changes)
            .await?;
        if updated > 0 {
            return Ok(());
        }

        match self.priority_repo.find_by_id(&current.id).await? {
            None => Err(AppError::PriorityNotFound(current.id.clone())),
            Some(now) => Err(AppError::Conflict(format!(
                "priority {} changed from {} to {} during moderation",
                current.id, current.status, now.status
            ))),
        }
    }
}
