use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, Statement,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{EngineError, LedgerEntry, ResultEngine, ledger};

use super::{Engine, with_tx};

impl Engine {
    /// Appends ledger entries inside the caller's transaction.
    ///
    /// Entries are only ever inserted; the storage guard rejects any later
    /// update or delete.
    pub(super) async fn append_entries(
        &self,
        db_tx: &DatabaseTransaction,
        entries: &[LedgerEntry],
    ) -> ResultEngine<()> {
        for entry in entries {
            if !entry.amount.is_positive() {
                return Err(EngineError::InvalidAmount(format!(
                    "ledger entry amount must be > 0, got {}",
                    entry.amount
                )));
            }
            ledger::ActiveModel::from(entry).insert(db_tx).await?;
        }
        Ok(())
    }

    /// Entries of a group, optionally restricted to one member, ordered by
    /// recording time then id.
    pub(super) async fn query_entries(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        member_id: Option<Uuid>,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        let mut query =
            ledger::Entity::find().filter(ledger::Column::GroupId.eq(group_id.to_string()));
        if let Some(member_id) = member_id {
            query = query.filter(ledger::Column::MemberId.eq(member_id.to_string()));
        }
        query
            .order_by_asc(ledger::Column::RecordedAt)
            .order_by_asc(ledger::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect()
    }

    /// Arms or disarms the append-only guard on `ledger_entries`.
    ///
    /// Only group teardown disarms it, and always within its own transaction.
    pub(super) async fn set_guard_armed(
        &self,
        db_tx: &DatabaseTransaction,
        armed: bool,
    ) -> ResultEngine<()> {
        let backend = db_tx.get_database_backend();
        db_tx
            .execute(Statement::from_sql_and_values(
                backend,
                "UPDATE ledger_guard SET armed = ? WHERE id = 1",
                [armed.into()],
            ))
            .await?;
        Ok(())
    }

    /// Returns the ledger entries of a group, optionally for a single member.
    pub async fn query_ledger_entries(
        &self,
        group_id: Uuid,
        member_id: Option<Uuid>,
        requester_id: Uuid,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;
            self.query_entries(&db_tx, group_id, member_id).await
        })
    }
}
