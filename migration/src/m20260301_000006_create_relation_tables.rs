use sea_orm_migration::prelude::*;

/// Creates the user-to-user relationship tables `follow` and `user_block`.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Follow {
    Table,
    Id,
    FollowerId,
    FollowingId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserBlock {
    Table,
    Id,
    BlockerId,
    BlockedId,
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
                    .table(Follow::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Follow::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Follow::FollowerId).uuid().not_null())
                    .col(ColumnDef::new(Follow::FollowingId).uuid().not_null())
                    .col(
                        ColumnDef::new(Follow::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_follower_id")
                            .from(Follow::Table, Follow::FollowerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_following_id")
                            .from(Follow::Table, Follow::FollowingId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_follow_follower_following")
                    .table(Follow::Table)
                    .col(Follow::FollowerId)
                    .col(Follow::FollowingId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserBlock::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserBlock::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserBlock::BlockerId).uuid().not_null())
                    .col(ColumnDef::new(UserBlock::BlockedId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserBlock::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_block_blocker_id")
                            .from(UserBlock::Table, UserBlock::BlockerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_block_blocked_id")
                            .from(UserBlock::Table, UserBlock::BlockedId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_block_blocker_blocked")
                    .table(UserBlock::Table)
                    .col(UserBlock::BlockerId)
                    .col(UserBlock::BlockedId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserBlock::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Follow::Table).to_owned())
            .await
    }
}
