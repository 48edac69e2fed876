use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Membership, MembershipRole, ResultEngine, groups, memberships, users,
};

use super::Engine;

impl Engine {
    pub(super) async fn membership_role(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<Option<MembershipRole>> {
        let row = memberships::Entity::find_by_id((group_id.to_string(), member_id.to_string()))
            .one(db)
            .await?;
        row.as_ref()
            .map(|m| MembershipRole::try_from(m.role.as_str()))
            .transpose()
    }

    pub(super) async fn is_member(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<bool> {
        Ok(self
            .membership_role(db, group_id, member_id)
            .await?
            .is_some())
    }

    /// Fails with `FORBIDDEN` unless `requester_id` belongs to the group.
    ///
    /// A group that does not exist has no members, so this check also fails
    /// for unknown groups; callers check existence afterwards.
    pub(super) async fn require_member(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        requester_id: Uuid,
    ) -> ResultEngine<MembershipRole> {
        self.membership_role(db, group_id, requester_id)
            .await?
            .ok_or_else(|| {
                EngineError::Forbidden(format!(
                    "user {requester_id} is not a member of group {group_id}"
                ))
            })
    }

    pub(super) async fn require_admin(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        requester_id: Uuid,
    ) -> ResultEngine<()> {
        let role = self.membership_role(db, group_id, requester_id).await?;
        if !role.is_some_and(MembershipRole::is_admin) {
            return Err(EngineError::Forbidden(format!(
                "user {requester_id} is not an admin of group {group_id}"
            )));
        }
        Ok(())
    }

    pub(super) async fn require_group(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<groups::Model> {
        groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::GroupNotFound(group_id.to_string()))
    }

    /// Membership then existence, the order every group-scoped read and
    /// write checks in.
    pub(super) async fn require_member_of_group(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        requester_id: Uuid,
    ) -> ResultEngine<MembershipRole> {
        let role = self.require_member(db, group_id, requester_id).await?;
        self.require_group(db, group_id).await?;
        Ok(role)
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::UserNotFound(user_id.to_string()));
        }
        Ok(())
    }

    pub(super) async fn group_memberships(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Vec<Membership>> {
        memberships::Entity::find()
            .filter(memberships::Column::GroupId.eq(group_id.to_string()))
            .order_by_asc(memberships::Column::MemberId)
            .all(db)
            .await?
            .into_iter()
            .map(Membership::try_from)
            .collect()
    }
}
