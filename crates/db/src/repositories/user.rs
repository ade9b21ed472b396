//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use priority_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    sea_query::OnConflict,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert or merge a profile.
    ///
    /// On conflict the profile fields and `last_login` are overwritten;
    /// `created_at` keeps the value from the first sign-in.
    pub async fn upsert(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        User::insert(model)
            .on_conflict(
                OnConflict::column(user::Column::Id)
                    .update_columns([
                        user::Column::Email,
                        user::Column::DisplayName,
                        user::Column::PhotoUrl,
                        user::Column::LastLogin,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Count all users.
    pub async fn count(&self) -> AppResult<u64> {
        User::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// All stored user emails.
    pub async fn find_all_emails(&self) -> AppResult<Vec<String>> {
        User::find()
            .select_only()
            .column(user::Column::Email)
            .filter(user::Column::Email.ne(""))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }
}
