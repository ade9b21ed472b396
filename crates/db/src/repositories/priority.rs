//! Priority repository.

use std::sync::Arc;

use crate::entities::{Priority, PriorityStatus, priority};
use priority_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

/// Priority repository for database operations.
#[derive(Clone)]
pub struct PriorityRepository {
    db: Arc<DatabaseConnection>,
}

impl PriorityRepository {
    /// Create a new priority repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a priority by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<priority::Model>> {
        Priority::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Find a priority by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<priority::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PriorityNotFound(id.to_string()))
    }

    /// Create a new priority.
    pub async fn create(&self, model: priority::ActiveModel) -> AppResult<priority::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// All priorities with the given status, newest first.
    pub async fn find_by_status(&self, status: PriorityStatus) -> AppResult<Vec<priority::Model>> {
        Priority::find()
            .filter(priority::Column::Status.eq(status))
            .order_by_desc(priority::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Approved priorities, most votes first.
    ///
    /// Equal vote counts come back in whatever order the store returns them.
    pub async fn find_approved_by_votes(&self) -> AppResult<Vec<priority::Model>> {
        Priority::find()
            .filter(priority::Column::Status.eq(PriorityStatus::Approved))
            .order_by_desc(priority::Column::Votes)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Apply a moderation update only if the row still has `expected` status.
    ///
    /// Only the fields set on `changes` are written. Returns the number of
    /// rows updated: 0 means the row is gone or its status moved on.
    pub async fn update_if_status(
        &self,
        id: &str,
        expected: PriorityStatus,
        changes: priority::ActiveModel,
    ) -> AppResult<u64> {
        let result = Priority::update_many()
            .set(changes)
            .filter(priority::Column::Id.eq(id))
            .filter(priority::Column::Status.eq(expected))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete a priority permanently. Votes referencing it are kept.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Priority::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count priorities with the given status.
    pub async fn count_by_status(&self, status: PriorityStatus) -> AppResult<u64> {
        Priority::find()
            .filter(priority::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Sum of vote counters over priorities with the given status.
    pub async fn sum_votes_by_status(&self, status: PriorityStatus) -> AppResult<i64> {
        let total: Option<i64> = Priority::find()
            .select_only()
            .column_as(
                Expr::cust("COALESCE(SUM(\"votes\"), 0)::BIGINT"),
                "total",
            )
            .filter(priority::Column::Status.eq(status))
            .into_tuple()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(total.unwrap_or(0))
    }
}
