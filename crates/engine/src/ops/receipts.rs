use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Origin, Receipt, ResultEngine, expenses, receipts, settlements};

use super::{Engine, with_tx};

impl Engine {
    /// Attaches receipt metadata to an expense or settlement of the group.
    ///
    /// `reference` is an opaque pointer to the stored file.
    pub async fn attach_receipt(
        &self,
        group_id: Uuid,
        origin: Origin,
        reference: &str,
        requester_id: Uuid,
    ) -> ResultEngine<Uuid> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(EngineError::InvalidReceipt(
                "receipt reference must not be empty".to_string(),
            ));
        }
        let receipt = Receipt {
            id: Uuid::new_v4(),
            group_id,
            origin,
            reference: reference.to_string(),
            attached_by: requester_id,
            created_at: Utc::now(),
        };

        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;
            let exists = match origin {
                Origin::Expense { expense_id } => {
                    expenses::Entity::find_by_id(expense_id.to_string())
                        .filter(expenses::Column::GroupId.eq(group_id.to_string()))
                        .one(&db_tx)
                        .await?
                        .is_some()
                }
                Origin::Settlement { settlement_id } => {
                    settlements::Entity::find_by_id(settlement_id.to_string())
                        .filter(settlements::Column::GroupId.eq(group_id.to_string()))
                        .one(&db_tx)
                        .await?
                        .is_some()
                }
            };
            if !exists {
                return Err(match origin {
                    Origin::Expense { expense_id } => {
                        EngineError::ExpenseNotFound(expense_id.to_string())
                    }
                    Origin::Settlement { settlement_id } => {
                        EngineError::SettlementNotFound(settlement_id.to_string())
                    }
                });
            }

            receipts::ActiveModel::from(&receipt).insert(&db_tx).await?;
            Ok(receipt.id)
        })
    }

    /// Lists the receipts attached to one expense or settlement.
    pub async fn receipts(
        &self,
        group_id: Uuid,
        origin: Origin,
        requester_id: Uuid,
    ) -> ResultEngine<Vec<Receipt>> {
        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;
            receipts::Entity::find()
                .filter(receipts::Column::GroupId.eq(group_id.to_string()))
                .filter(receipts::Column::OriginKind.eq(origin.kind().as_str()))
                .filter(receipts::Column::OriginId.eq(origin.id().to_string()))
                .order_by_asc(receipts::Column::CreatedAt)
                .order_by_asc(receipts::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Receipt::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
