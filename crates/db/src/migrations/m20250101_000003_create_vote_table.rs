//! Create vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vote::UserId).string_len(128).not_null())
                    .col(ColumnDef::new(Vote::PriorityId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Vote::VotedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // No foreign key to priority: deleting a priority keeps its votes
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_user")
                            .from(Vote::Table, Vote::UserId)
                            .to(User::Table, User::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, priority_id) - one vote per user per priority
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_user_priority")
                    .table(Vote::Table)
                    .col(Vote::UserId)
                    .col(Vote::PriorityId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: priority_id (counting votes per priority)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_priority_id")
                    .table(Vote::Table)
                    .col(Vote::PriorityId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
    UserId,
    PriorityId,
    VotedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
