use sea_orm_migration::prelude::*;

/// Creates the `notice` table holding per-user notifications.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Notice {
    Table,
    Id,
    UserId,
    NoticeType,
    Title,
    Content,
    IsRead,
    RelatedId,
    Metadata,
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
                    .table(Notice::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Notice::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Notice::UserId).uuid().not_null())
                    .col(ColumnDef::new(Notice::NoticeType).string_len(30).not_null())
                    .col(ColumnDef::new(Notice::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Notice::Content).string_len(1000).not_null())
                    .col(
                        ColumnDef::new(Notice::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Notice::RelatedId).uuid().null())
                    .col(ColumnDef::new(Notice::Metadata).json().null())
                    .col(
                        ColumnDef::new(Notice::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notice::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notice_user_id")
                            .from(Notice::Table, Notice::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notice_user_read")
                    .table(Notice::Table)
                    .col(Notice::UserId)
                    .col(Notice::IsRead)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notice::Table).to_owned())
            .await
    }
}
