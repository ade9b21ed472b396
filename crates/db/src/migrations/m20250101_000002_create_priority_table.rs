//! Create priority table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Priority::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Priority::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Priority::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Priority::Description).text().not_null())
                    .col(ColumnDef::new(Priority::Category).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Priority::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Priority::Votes)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Priority::Votes).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Priority::SubmittedBy)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Priority::SubmittedByEmail)
                            .string_len(320)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Priority::SubmittedByName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Priority::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Priority::LastVoteAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Priority::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Priority::ApprovedBy).string_len(320))
                    .col(ColumnDef::new(Priority::RejectedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Priority::RejectedBy).string_len(320))
                    .col(ColumnDef::new(Priority::RejectionReason).text())
                    .to_owned(),
            )
            .await?;

        // Index: (status, votes) - public ranking
        manager
            .create_index(
                Index::create()
                    .name("idx_priority_status_votes")
                    .table(Priority::Table)
                    .col(Priority::Status)
                    .col(Priority::Votes)
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) - moderation lists, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_priority_status_created_at")
                    .table(Priority::Table)
                    .col(Priority::Status)
                    .col(Priority::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Priority::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Priority {
    Table,
    Id,
    Title,
    Description,
    Category,
    Status,
    Votes,
    SubmittedBy,
    SubmittedByEmail,
    SubmittedByName,
    CreatedAt,
    LastVoteAt,
    ApprovedAt,
    ApprovedBy,
    RejectedAt,
    RejectedBy,
    RejectionReason,
}
