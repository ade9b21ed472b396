//! Vote repository.
//!
//! Owns the only multi-row write in the system: a vote insert and the
//! matching counter increment commit together or not at all.

use std::sync::Arc;

use crate::entities::{Priority, Vote, priority, vote};
use priority_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    SqlErr, TransactionTrait, sea_query::Expr,
};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Priority IDs the user has voted for.
    pub async fn find_priority_ids_by_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        Vote::find()
            .select_only()
            .column(vote::Column::PriorityId)
            .filter(vote::Column::UserId.eq(user_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Count all vote records.
    pub async fn count_all(&self) -> AppResult<u64> {
        Vote::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Count vote records referencing a priority.
    pub async fn count_by_priority(&self, priority_id: &str) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::PriorityId.eq(priority_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Record a vote and bump the priority's counter in one transaction.
    ///
    /// The counter is incremented in SQL, never read back and rewritten.
    /// A missing priority or an existing vote for the same pair rolls the
    /// whole transaction back.
    pub async fn record(&self, model: vote::Model) -> AppResult<vote::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;

        let updated = Priority::update_many()
            .col_expr(
                priority::Column::Votes,
                Expr::col(priority::Column::Votes).add(1),
            )
            .col_expr(
                priority::Column::LastVoteAt,
                Expr::value(model.voted_at),
            )
            .filter(priority::Column::Id.eq(model.priority_id.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;

        if updated.rows_affected == 0 {
            rollback(txn).await;
            return Err(AppError::PriorityNotFound(model.priority_id));
        }

        let active: vote::ActiveModel = model.clone().into();
        if let Err(e) = Vote::insert(active).exec_without_returning(&txn).await {
            rollback(txn).await;
            return Err(map_insert_error(&e, &model.priority_id));
        }

        txn.commit()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;

        Ok(model)
    }
}

async fn rollback(txn: sea_orm::DatabaseTransaction) {
    if let Err(e) = txn.rollback().await {
        tracing::warn!(error = %e, "Failed to roll back vote transaction");
    }
}

fn map_insert_error(err: &DbErr, priority_id: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::AlreadyVoted(priority_id.to_string())
        }
        _ => AppError::StoreUnavailable(err.to_string()),
    }
}
