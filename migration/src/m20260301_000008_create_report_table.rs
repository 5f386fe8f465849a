use sea_orm_migration::prelude::*;

/// Creates the `report` table for user-submitted moderation reports.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Report {
    Table,
    Id,
    ReporterId,
    TargetType,
    TargetId,
    Reason,
    Status,
    HandledBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Report::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Report::ReporterId).uuid().not_null())
                    .col(ColumnDef::new(Report::TargetType).string_len(20).not_null())
                    .col(ColumnDef::new(Report::TargetId).uuid().not_null())
                    .col(ColumnDef::new(Report::Reason).string_len(1000).not_null())
                    .col(
                        ColumnDef::new(Report::Status)
                            .string_len(20)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Report::HandledBy).uuid().null())
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Report::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_reporter_id")
                            .from(Report::Table, Report::ReporterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_target")
                    .table(Report::Table)
                    .col(Report::TargetType)
                    .col(Report::TargetId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}
