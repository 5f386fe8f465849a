use sea_orm_migration::prelude::*;

/// Creates `team`, `team_member` and `team_follow`.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Team {
    Table,
    Id,
    Name,
    Description,
    ProfileImage,
    LeaderId,
    IsInviteOnly,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TeamMember {
    Table,
    Id,
    TeamId,
    UserId,
    Status,
    JoinedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TeamFollow {
    Table,
    Id,
    TeamId,
    UserId,
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
                    .table(Team::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Team::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Team::Name)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Team::Description).string_len(500).null())
                    .col(ColumnDef::new(Team::ProfileImage).string_len(500).null())
                    .col(ColumnDef::new(Team::LeaderId).uuid().not_null())
                    .col(
                        ColumnDef::new(Team::IsInviteOnly)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Team::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Team::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_leader_id")
                            .from(Team::Table, Team::LeaderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TeamMember::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeamMember::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TeamMember::TeamId).uuid().not_null())
                    .col(ColumnDef::new(TeamMember::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(TeamMember::Status)
                            .string_len(20)
                            .not_null()
                            .default("INVITED"),
                    )
                    .col(
                        ColumnDef::new(TeamMember::JoinedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TeamMember::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeamMember::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_member_team_id")
                            .from(TeamMember::Table, TeamMember::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_member_user_id")
                            .from(TeamMember::Table, TeamMember::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_team_member_team_user")
                    .table(TeamMember::Table)
                    .col(TeamMember::TeamId)
                    .col(TeamMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TeamFollow::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeamFollow::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TeamFollow::TeamId).uuid().not_null())
                    .col(ColumnDef::new(TeamFollow::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(TeamFollow::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_follow_team_id")
                            .from(TeamFollow::Table, TeamFollow::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_follow_user_id")
                            .from(TeamFollow::Table, TeamFollow::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_team_follow_team_user")
                    .table(TeamFollow::Table)
                    .col(TeamFollow::TeamId)
                    .col(TeamFollow::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TeamFollow::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeamMember::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Team::Table).to_owned())
            .await
    }
}
