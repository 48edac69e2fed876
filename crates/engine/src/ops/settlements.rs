use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, LedgerEntry, Origin, RecordSettlementCmd, ResultEngine, Settlement, settlements,
};

use super::{Engine, with_tx};

impl Engine {
    /// Records a direct payment from `payer_id` to `receiver_id`.
    ///
    /// Writes the settlement plus a debit for the payer and a credit for the
    /// receiver, both for the full amount, in one transaction.
    pub async fn record_settlement(&self, cmd: RecordSettlementCmd) -> ResultEngine<Uuid> {
        let RecordSettlementCmd {
            group_id,
            payer_id,
            receiver_id,
            amount,
            paid_on,
            requester_id,
        } = cmd;
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "settlement amount must be > 0, got {amount}"
            )));
        }

        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;
            if !self.is_member(&db_tx, group_id, payer_id).await? {
                return Err(EngineError::FromUserNotMember(payer_id.to_string()));
            }
            if !self.is_member(&db_tx, group_id, receiver_id).await? {
                return Err(EngineError::ToUserNotMember(receiver_id.to_string()));
            }
            if payer_id == receiver_id {
                return Err(EngineError::SameUser(payer_id.to_string()));
            }

            let settlement = Settlement {
                id: Uuid::new_v4(),
                group_id,
                payer_id,
                receiver_id,
                amount,
                paid_on,
                created_by: requester_id,
                created_at: Utc::now(),
            };
            let settlement_id = settlement.id;

            if let Err(err) = self.insert_settlement(&db_tx, &settlement).await {
                tracing::error!(
                    %group_id,
                    %settlement_id,
                    error = %err,
                    "failed to write settlement"
                );
                return Err(EngineError::FailedToCreateSettlement(err.to_string()));
            }
            tracing::info!(%group_id, %settlement_id, %amount, "settlement recorded");
            Ok(settlement_id)
        })
    }

    async fn insert_settlement(
        &self,
        db_tx: &DatabaseTransaction,
        settlement: &Settlement,
    ) -> ResultEngine<()> {
        settlements::ActiveModel::from(settlement)
            .insert(db_tx)
            .await?;
        let origin = Origin::Settlement {
            settlement_id: settlement.id,
        };
        let entries = [
            LedgerEntry::debit(
                settlement.group_id,
                settlement.payer_id,
                origin,
                settlement.amount,
                settlement.created_at,
            ),
            LedgerEntry::credit(
                settlement.group_id,
                settlement.receiver_id,
                origin,
                settlement.amount,
                settlement.created_at,
            ),
        ];
        self.append_entries(db_tx, &entries).await
    }

    /// Lists the settlements of a group, most recent payment first.
    pub async fn list_settlements(
        &self,
        group_id: Uuid,
        requester_id: Uuid,
    ) -> ResultEngine<Vec<Settlement>> {
        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;
            settlements::Entity::find()
                .filter(settlements::Column::GroupId.eq(group_id.to_string()))
                .order_by_desc(settlements::Column::PaidOn)
                .order_by_desc(settlements::Column::CreatedAt)
                .order_by_asc(settlements::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Settlement::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
