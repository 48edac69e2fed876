use chrono::Utc;
use sea_orm::{TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Group, Member, Membership, MembershipRole, MoneyCents, NewMember, ResultEngine,
    groups, memberships, users,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

/// Largest balance, in either direction, a member may leave a group with.
const REMOVAL_TOLERANCE: MoneyCents = MoneyCents::new(1);

impl Engine {
    /// Registers a new user and returns its id.
    pub async fn create_member(&self, new_member: NewMember) -> ResultEngine<Uuid> {
        let member = Member {
            id: Uuid::new_v4(),
            display_name: normalize_required_text(&new_member.display_name, "display name")?,
            contact: normalize_optional_text(new_member.contact.as_deref()),
            payment_identifier: normalize_optional_text(new_member.payment_identifier.as_deref()),
            created_at: Utc::now(),
        };
        with_tx!(self, |db_tx| {
            users::ActiveModel::from(&member).insert(&db_tx).await?;
            Ok(member.id)
        })
    }

    /// Creates a group; the creator joins it as admin.
    pub async fn create_group(
        &self,
        name: &str,
        description: Option<&str>,
        creator_id: Uuid,
    ) -> ResultEngine<Uuid> {
        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4(),
            name: normalize_required_text(name, "group name")?,
            description: normalize_optional_text(description),
            created_at: now,
        };
        let membership = Membership {
            group_id: group.id,
            member_id: creator_id,
            role: MembershipRole::Admin,
            joined_at: now,
        };
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, creator_id).await?;
            groups::ActiveModel::from(&group).insert(&db_tx).await?;
            memberships::ActiveModel::from(&membership)
                .insert(&db_tx)
                .await?;
            tracing::info!(group_id = %group.id, %creator_id, "group created");
            Ok(group.id)
        })
    }

    /// Adds an existing user to a group (admin only).
    pub async fn add_member(
        &self,
        group_id: Uuid,
        member_id: Uuid,
        role: MembershipRole,
        requester_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, group_id, requester_id).await?;
            self.require_group(&db_tx, group_id).await?;
            self.require_user_exists(&db_tx, member_id).await?;
            if self.is_member(&db_tx, group_id, member_id).await? {
                return Err(EngineError::AlreadyMember(member_id.to_string()));
            }
            let membership = Membership {
                group_id,
                member_id,
                role,
                joined_at: Utc::now(),
            };
            memberships::ActiveModel::from(&membership)
                .insert(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Removes a member from a group.
    ///
    /// Allowed to the group's admins and to the member themself, and only
    /// once the member's balance is settled.
    pub async fn remove_member(
        &self,
        group_id: Uuid,
        member_id: Uuid,
        requester_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let requester_role = self.require_member(&db_tx, group_id, requester_id).await?;
            if requester_id != member_id && !requester_role.is_admin() {
                return Err(EngineError::Forbidden(format!(
                    "user {requester_id} cannot remove other members of group {group_id}"
                )));
            }
            self.require_group(&db_tx, group_id).await?;
            if !self.is_member(&db_tx, group_id, member_id).await? {
                return Err(EngineError::UserNotFound(member_id.to_string()));
            }

            let balance = self.balance_of(&db_tx, group_id, member_id).await?;
            if balance.abs() > REMOVAL_TOLERANCE {
                return Err(EngineError::CannotRemoveMemberWithBalance(format!(
                    "member {member_id} has balance {balance}"
                )));
            }

            memberships::Entity::delete_by_id((group_id.to_string(), member_id.to_string()))
                .exec(&db_tx)
                .await?;
            tracing::info!(%group_id, %member_id, "member removed");
            Ok(())
        })
    }

    pub async fn member(&self, member_id: Uuid) -> ResultEngine<Member> {
        with_tx!(self, |db_tx| {
            let model = users::Entity::find_by_id(member_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::UserNotFound(member_id.to_string()))?;
            Member::try_from(model)
        })
    }

    pub async fn group(&self, group_id: Uuid, requester_id: Uuid) -> ResultEngine<Group> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, group_id, requester_id).await?;
            let model = self.require_group(&db_tx, group_id).await?;
            Group::try_from(model)
        })
    }

    /// Lists the current members of a group, ordered by member id.
    pub async fn list_members(
        &self,
        group_id: Uuid,
        requester_id: Uuid,
    ) -> ResultEngine<Vec<Membership>> {
        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;
            self.group_memberships(&db_tx, group_id).await
        })
    }
}
