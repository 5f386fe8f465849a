use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use super::{finish, notice_service};
use crate::dto::team::{CreateTeamRequest, MemberSummary, TeamDetail, UpdateTeamRequest};
use crate::entities::{NoticeType, TeamMemberStatus, team, team_follow, team_member, user};
use crate::error::AppError;
use crate::repositories::notice_repo::NewNotice;
use crate::repositories::{now, team_repo, user_repo};

async fn find_team(db: &DatabaseConnection, team_id: Uuid) -> Result<team::Model, AppError> {
    team_repo::find_by_id(db, team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found.".to_string()))
}

async fn find_led_team(
    db: &DatabaseConnection,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<team::Model, AppError> {
    let team = find_team(db, team_id).await?;
    if team.leader_id != user_id {
        return Err(AppError::Forbidden(
            "Only the team leader can do this.".to_string(),
        ));
    }
    Ok(team)
}

fn team_notice(
    recipient: Uuid,
    notice_type: NoticeType,
    team: &team::Model,
    content: String,
    actor: &user::Model,
) -> NewNotice {
    NewNotice {
        user_id: recipient,
        notice_type,
        title: team.name.clone(),
        content,
        related_id: Some(team.id),
        metadata: Some(serde_json::json!({
            "teamId": team.id,
            "teamName": team.name,
            "actorId": actor.id,
            "actorNickname": actor.nickname,
        })),
    }
}

/// Create a team; the creator becomes its leader and first JOINED member.
///
/// # Errors
///
/// `Conflict` if the name is taken.
pub async fn create_team(
    db: &DatabaseConnection,
    leader: &user::Model,
    dto: CreateTeamRequest,
) -> Result<TeamDetail, AppError> {
    let name = dto.name.trim().to_string();
    if team_repo::name_taken(db, &name, None).await? {
        return Err(AppError::Conflict("Team name is already taken.".to_string()));
    }

    let txn = db.begin().await?;
    let result = async {
        let team = team_repo::insert(
            &txn,
            name,
            dto.description,
            dto.profile_image,
            leader.id,
            dto.is_invite_only,
        )
        .await?;
        team_repo::insert_member(&txn, team.id, leader.id, TeamMemberStatus::Joined).await?;
        Ok::<_, AppError>(team.id)
    }
    .await;
    let team_id = finish(txn, result, "create team").await?;

    tracing::info!(%team_id, leader_id = %leader.id, "Team created");
    get_team(db, team_id).await
}

/// Team with members and follower count.
///
/// # Errors
///
/// `NotFound` for unknown teams.
pub async fn get_team(db: &DatabaseConnection, team_id: Uuid) -> Result<TeamDetail, AppError> {
    let team = find_team(db, team_id).await?;
    let members = list_members(db, team_id).await?;
    let follower_count = team_repo::count_followers(db, team_id).await?;
    Ok(TeamDetail {
        team,
        members,
        follower_count,
    })
}

/// # Errors
///
/// `NotFound`, `Forbidden` for non-leaders, `Conflict` for a taken name.
pub async fn update_team(
    db: &DatabaseConnection,
    team_id: Uuid,
    user_id: Uuid,
    dto: UpdateTeamRequest,
) -> Result<TeamDetail, AppError> {
    let team = find_led_team(db, team_id, user_id).await?;

    let mut active: team::ActiveModel = team.into();
    if let Some(name) = dto.name.map(|n| n.trim().to_string()) {
        if team_repo::name_taken(db, &name, Some(team_id)).await? {
            return Err(AppError::Conflict("Team name is already taken.".to_string()));
        }
        active.name = Set(name);
    }
    if let Some(description) = dto.description {
        active.description = Set(Some(description));
    }
    if let Some(profile_image) = dto.profile_image {
        active.profile_image = Set(Some(profile_image));
    }
    if let Some(is_invite_only) = dto.is_invite_only {
        active.is_invite_only = Set(is_invite_only);
    }
    active.updated_at = Set(now());
    active.update(db).await?;

    get_team(db, team_id).await
}

/// # Errors
///
/// `NotFound`, `Forbidden` for non-leaders.
pub async fn delete_team(db: &DatabaseConnection, team_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    find_led_team(db, team_id, user_id).await?;
    team_repo::delete(db, team_id).await?;
    tracing::info!(%team_id, "Team deleted");
    Ok(())
}

/// Invite a user. Re-inviting refreshes the pending invitation notice.
///
/// # Errors
///
/// `NotFound`, `Forbidden` for non-leaders, `Conflict` if already a member.
pub async fn invite(
    db: &DatabaseConnection,
    leader: &user::Model,
    team_id: Uuid,
    invitee_id: Uuid,
) -> Result<team_member::Model, AppError> {
    let team = find_led_team(db, team_id, leader.id).await?;
    user_repo::find_live(db, invitee_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let member = match team_repo::find_member(db, team_id, invitee_id).await? {
        Some(m) if m.status == TeamMemberStatus::Joined => {
            return Err(AppError::Conflict(
                "User is already a member of this team.".to_string(),
            ));
        }
        Some(pending) => pending,
        None => team_repo::insert_member(db, team_id, invitee_id, TeamMemberStatus::Invited).await?,
    };

    notice_service::notify_best_effort(
        db,
        team_notice(
            invitee_id,
            NoticeType::TeamInvite,
            &team,
            format!("{} invited you to join {}.", leader.nickname, team.name),
            leader,
        ),
    )
    .await;

    Ok(member)
}

/// Join a team. Invite-only teams require a pending invitation.
///
/// # Errors
///
/// `NotFound`, `Forbidden` without an invitation, `Conflict` if already joined.
pub async fn join(
    db: &DatabaseConnection,
    user: &user::Model,
    team_id: Uuid,
) -> Result<team_member::Model, AppError> {
    let team = find_team(db, team_id).await?;

    let member = match team_repo::find_member(db, team_id, user.id).await? {
        Some(m) if m.status == TeamMemberStatus::Joined => {
            return Err(AppError::Conflict(
                "You are already a member of this team.".to_string(),
            ));
        }
        Some(invited) => team_repo::mark_joined(db, invited).await?,
        None if team.is_invite_only => {
            return Err(AppError::Forbidden(
                "This team is invite-only.".to_string(),
            ));
        }
        None => team_repo::insert_member(db, team_id, user.id, TeamMemberStatus::Joined).await?,
    };

    notice_service::notify_best_effort(
        db,
        team_notice(
            team.leader_id,
            NoticeType::TeamJoin,
            &team,
            format!("{} joined {}.", user.nickname, team.name),
            user,
        ),
    )
    .await;

    Ok(member)
}

/// Leave a team. The leader cannot leave.
///
/// # Errors
///
/// `NotFound`, `BadRequest` for the leader, `Conflict` if not a member.
pub async fn leave(db: &DatabaseConnection, user: &user::Model, team_id: Uuid) -> Result<(), AppError> {
    let team = find_team(db, team_id).await?;
    if team.leader_id == user.id {
        return Err(AppError::BadRequest(
            "The team leader cannot leave the team.".to_string(),
        ));
    }
    let member = team_repo::find_member(db, team_id, user.id)
        .await?
        .ok_or_else(|| AppError::Conflict("You are not a member of this team.".to_string()))?;
    team_repo::delete_member(db, member.id).await?;

    notice_service::notify_best_effort(
        db,
        team_notice(
            team.leader_id,
            NoticeType::TeamLeave,
            &team,
            format!("{} left {}.", user.nickname, team.name),
            user,
        ),
    )
    .await;
    Ok(())
}

/// Remove a member or pending invitation.
///
/// # Errors
///
/// `NotFound`, `Forbidden` for non-leaders, `BadRequest` when kicking the leader.
pub async fn kick(
    db: &DatabaseConnection,
    leader: &user::Model,
    team_id: Uuid,
    member_id: Uuid,
) -> Result<(), AppError> {
    let team = find_led_team(db, team_id, leader.id).await?;
    if member_id == leader.id {
        return Err(AppError::BadRequest(
            "The team leader cannot be removed.".to_string(),
        ));
    }
    let member = team_repo::find_member(db, team_id, member_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found.".to_string()))?;
    team_repo::delete_member(db, member.id).await?;

    notice_service::notify_best_effort(
        db,
        team_notice(
            member_id,
            NoticeType::TeamKick,
            &team,
            format!("You were removed from {}.", team.name),
            leader,
        ),
    )
    .await;
    Ok(())
}

/// # Errors
///
/// Database failures.
pub async fn list_members(db: &DatabaseConnection, team_id: Uuid) -> Result<Vec<MemberSummary>, AppError> {
    Ok(team_repo::members_with_users(db, team_id)
        .await?
        .into_iter()
        .filter_map(|(member, user)| {
            user.map(|u| MemberSummary {
                user_id: u.id,
                name: u.name,
                nickname: u.nickname,
                profile_image: u.profile_image,
                status: member.status,
                joined_at: member.joined_at.map(|t| t.to_rfc3339()),
            })
        })
        .collect())
}

/// # Errors
///
/// Database failures.
pub async fn my_teams(db: &DatabaseConnection, user_id: Uuid) -> Result<Vec<team::Model>, AppError> {
    Ok(team_repo::teams_of(db, user_id).await?)
}

/// Follow a team and tell its leader.
///
/// # Errors
///
/// `NotFound`, `Conflict` if already following.
pub async fn follow_team(
    db: &DatabaseConnection,
    user: &user::Model,
    team_id: Uuid,
) -> Result<team_follow::Model, AppError> {
    let team = find_team(db, team_id).await?;
    if team_repo::find_follow(db, team_id, user.id).await?.is_some() {
        return Err(AppError::Conflict("You already follow this team.".to_string()));
    }
    let follow = team_repo::insert_follow(db, team_id, user.id).await?;

    notice_service::notify_best_effort(
        db,
        team_notice(
            team.leader_id,
            NoticeType::TeamFollow,
            &team,
            format!("{} started following {}.", user.nickname, team.name),
            user,
        ),
    )
    .await;
    Ok(follow)
}

/// # Errors
///
/// `Conflict` if not following.
pub async fn unfollow_team(db: &DatabaseConnection, user_id: Uuid, team_id: Uuid) -> Result<(), AppError> {
    let follow = team_repo::find_follow(db, team_id, user_id)
        .await?
        .ok_or_else(|| AppError::Conflict("You do not follow this team.".to_string()))?;
    team_repo::delete_follow(db, follow.id).await?;
    Ok(())
}

/// # Errors
///
/// Database failures.
pub async fn followed_teams(db: &DatabaseConnection, user_id: Uuid) -> Result<Vec<team::Model>, AppError> {
    Ok(team_repo::followed_by(db, user_id).await?)
}
