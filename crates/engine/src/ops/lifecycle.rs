use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    ResultEngine, expense_splits, expenses, groups, ledger, memberships, receipts, settlements,
};

use super::{Engine, with_tx};

/// Rows removed by a group teardown.
#[derive(Debug, Default)]
struct Purged {
    receipts: u64,
    entries: u64,
    expenses: u64,
    settlements: u64,
}

impl Engine {
    /// Deletes a group and everything recorded in it (admin only).
    ///
    /// This is the only path that removes ledger entries. The guard is
    /// disarmed as the transaction's first write and re-armed before commit,
    /// on the error path too; a rollback restores it as well.
    pub async fn delete_group(&self, group_id: Uuid, requester_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, group_id, requester_id).await?;
            self.require_group(&db_tx, group_id).await?;

            self.set_guard_armed(&db_tx, false).await?;
            let purged = self.purge_group(&db_tx, group_id).await;
            let rearmed = self.set_guard_armed(&db_tx, true).await;
            let purged = purged?;
            rearmed?;

            tracing::info!(
                %group_id,
                %requester_id,
                receipts = purged.receipts,
                entries = purged.entries,
                expenses = purged.expenses,
                settlements = purged.settlements,
                "group deleted"
            );
            Ok(())
        })
    }

    async fn purge_group(
        &self,
        db_tx: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Purged> {
        let group = group_id.to_string();
        let mut purged = Purged::default();

        purged.receipts = receipts::Entity::delete_many()
            .filter(receipts::Column::GroupId.eq(group.clone()))
            .exec(db_tx)
            .await?
            .rows_affected;
        purged.entries = ledger::Entity::delete_many()
            .filter(ledger::Column::GroupId.eq(group.clone()))
            .exec(db_tx)
            .await?
            .rows_affected;
        expense_splits::Entity::delete_many()
            .filter(expense_splits::Column::GroupId.eq(group.clone()))
            .exec(db_tx)
            .await?;
        purged.expenses = expenses::Entity::delete_many()
            .filter(expenses::Column::GroupId.eq(group.clone()))
            .exec(db_tx)
            .await?
            .rows_affected;
        purged.settlements = settlements::Entity::delete_many()
            .filter(settlements::Column::GroupId.eq(group.clone()))
            .exec(db_tx)
            .await?
            .rows_affected;
        memberships::Entity::delete_many()
            .filter(memberships::Column::GroupId.eq(group.clone()))
            .exec(db_tx)
            .await?;
        groups::Entity::delete_by_id(group).exec(db_tx).await?;

        Ok(purged)
    }
}
