//! Priority submission service.

use crate::services::identity::Identity;
use priority_common::{AppError, AppResult, IdGenerator};
use priority_db::{
    entities::{PriorityStatus, priority},
    repositories::PriorityRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for submitting a new priority.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPriorityInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 5000))]
    pub description: String,

    #[validate(length(min = 1, max = 64))]
    pub category: String,
}

impl SubmitPriorityInput {
    fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
        }
    }
}

/// Priority service for business logic.
#[derive(Clone)]
pub struct PriorityService {
    priority_repo: PriorityRepository,
    id_gen: IdGenerator,
}

impl PriorityService {
    /// Create a new priority service.
    #[must_use]
    pub const fn new(priority_repo: PriorityRepository) -> Self {
        Self {
            priority_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a priority for moderation.
    ///
    /// New priorities always start pending with zero votes, whatever the
    /// caller sends.
    pub async fn submit(
        &self,
        submitter: &Identity,
        input: SubmitPriorityInput,
    ) -> AppResult<priority::Model> {
        if submitter.uid.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let input = input.trimmed();
        input.validate()?;

        let model = priority::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            status: Set(PriorityStatus::Pending),
            votes: Set(0),
            submitted_by: Set(submitter.uid.clone()),
            submitted_by_email: Set(submitter.email.clone()),
            submitted_by_name: Set(submitter.name_or_email_prefix()),
            created_at: Set(chrono::Utc::now().into()),
            last_vote_at: Set(None),
            approved_at: Set(None),
            approved_by: Set(None),
            rejected_at: Set(None),
            rejected_by: Set(None),
            rejection_reason: Set(None),
        };

        let created = self.priority_repo.create(model).await?;
        tracing::info!(
            priority_id = %created.id,
            submitted_by = %created.submitted_by,
            "Priority submitted"
        );

        Ok(created)
    }

    /// Get a priority by ID.
    pub async fn get(&self, id: &str) -> AppResult<priority::Model> {
        self.priority_repo.get_by_id(id).await
    }
}
