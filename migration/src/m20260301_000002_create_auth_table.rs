use sea_orm_migration::prelude::*;

/// Creates the `auth` table: one login-provider record per user.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Auth {
    Table,
    Id,
    UserId,
    Provider,
    ProviderId,
    CreatedAt,
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
                    .table(Auth::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Auth::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Auth::UserId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Auth::Provider).string_len(20).not_null())
                    .col(ColumnDef::new(Auth::ProviderId).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Auth::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_user_id")
                            .from(Auth::Table, Auth::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_auth_provider_provider_id")
                    .table(Auth::Table)
                    .col(Auth::Provider)
                    .col(Auth::ProviderId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Auth::Table).to_owned())
            .await
    }
}
