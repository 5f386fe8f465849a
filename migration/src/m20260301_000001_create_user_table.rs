use sea_orm_migration::prelude::*;

/// Creates the `user` table.
///
/// Email and nickname are unique among live accounts only, so a deleted account frees both.
/// The service layer checks first; the partial indexes catch racing inserts.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Email,
    Name,
    Nickname,
    PasswordHash,
    Role,
    ProfileImage,
    Bio,
    IsActive,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(User::Email)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(User::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(User::Nickname)
                            .string_len(30)
                            .not_null(),
                    )
                    .col(ColumnDef::new(User::PasswordHash).string_len(255).null())
                    .col(
                        ColumnDef::new(User::Role)
                            .string_len(20)
                            .not_null()
                            .default("user"),
                    )
                    .col(ColumnDef::new(User::ProfileImage).string_len(500).not_null())
                    .col(ColumnDef::new(User::Bio).string_len(500).null())
                    .col(
                        ColumnDef::new(User::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(User::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(User::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_user_email_live", User::Email),
            ("idx_user_nickname_live", User::Nickname),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(User::Table)
                        .col(column)
                        .unique()
                        .and_where(Expr::col(User::DeletedAt).is_null())
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}
