use sea_orm_migration::prelude::*;

/// Creates `post`, `editor`, `tag` and the `post_tag` join table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Post {
    Table,
    Id,
    Title,
    Content,
    Excerpt,
    Thumbnail,
    Status,
    ViewCount,
    LikeCount,
    CommentCount,
    TeamId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Editor {
    Table,
    Id,
    PostId,
    UserId,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tag {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PostTag {
    Table,
    Id,
    PostId,
    TagId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Team {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Post::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Post::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Post::Content).text().not_null())
                    .col(ColumnDef::new(Post::Excerpt).string_len(500).null())
                    .col(ColumnDef::new(Post::Thumbnail).string_len(500).not_null())
                    .col(
                        ColumnDef::new(Post::Status)
                            .string_len(20)
                            .not_null()
                            .default("PRIVATE"),
                    )
                    .col(
                        ColumnDef::new(Post::ViewCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Post::LikeCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Post::CommentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Post::TeamId).uuid().null())
                    .col(
                        ColumnDef::new(Post::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Post::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Post::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_team_id")
                            .from(Post::Table, Post::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_status_created_at")
                    .table(Post::Table)
                    .col(Post::Status)
                    .col(Post::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Editor::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Editor::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Editor::PostId).uuid().not_null())
                    .col(ColumnDef::new(Editor::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Editor::Role)
                            .string_len(20)
                            .not_null()
                            .default("EDITOR"),
                    )
                    .col(
                        ColumnDef::new(Editor::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_editor_post_id")
                            .from(Editor::Table, Editor::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_editor_user_id")
                            .from(Editor::Table, Editor::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_editor_post_user")
                    .table(Editor::Table)
                    .col(Editor::PostId)
                    .col(Editor::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tag::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Tag::Name)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Tag::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostTag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PostTag::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(PostTag::PostId).uuid().not_null())
                    .col(ColumnDef::new(PostTag::TagId).uuid().not_null())
                    .col(
                        ColumnDef::new(PostTag::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_tag_post_id")
                            .from(PostTag::Table, PostTag::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_tag_tag_id")
                            .from(PostTag::Table, PostTag::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_tag_post_tag")
                    .table(PostTag::Table)
                    .col(PostTag::PostId)
                    .col(PostTag::TagId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Reverse lookup for popular-tag aggregation
        manager
            .create_index(
                Index::create()
                    .name("idx_post_tag_tag_id_created_at")
                    .table(PostTag::Table)
                    .col(PostTag::TagId)
                    .col(PostTag::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostTag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Editor::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}
