use rust_decimal::Decimal;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{Allocation, MoneyCents, ResultEngine, allocate_proportionally};

use super::{Engine, with_tx};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    /// Requester owes; fan out over members with a positive balance.
    Debts,
    /// Requester is owed; fan out over members with a negative balance.
    Credits,
}

impl Engine {
    /// Suggested payments for a member who owes money to the group.
    ///
    /// The debt is split across every creditor in proportion to how much the
    /// group owes them. Empty when the member does not owe anything.
    pub async fn my_debts(
        &self,
        group_id: Uuid,
        member_id: Uuid,
        requester_id: Uuid,
    ) -> ResultEngine<Vec<Allocation>> {
        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;
            self.allocate(&db_tx, group_id, member_id, Side::Debts)
                .await
        })
    }

    /// Expected repayments for a member the group owes money to.
    ///
    /// Mirror of [`Engine::my_debts`], weighted by each debtor's share of the
    /// total debt.
    pub async fn my_credits(
        &self,
        group_id: Uuid,
        member_id: Uuid,
        requester_id: Uuid,
    ) -> ResultEngine<Vec<Allocation>> {
        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;
            self.allocate(&db_tx, group_id, member_id, Side::Credits)
                .await
        })
    }

    async fn allocate(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        member_id: Uuid,
        side: Side,
    ) -> ResultEngine<Vec<Allocation>> {
        let balances = self.ledger_balances(db, group_id).await?;
        let own = balances.get(&member_id).copied().unwrap_or(MoneyCents::ZERO);
        let outstanding = match side {
            Side::Debts if own.is_negative() => own.abs(),
            Side::Credits if own.is_positive() => own,
            _ => return Ok(Vec::new()),
        };

        let counterparties: Vec<(Uuid, Decimal)> = balances
            .iter()
            .filter(|(id, _)| **id != member_id)
            .filter_map(|(id, balance)| match side {
                Side::Debts if balance.is_positive() => Some((*id, balance.to_decimal())),
                Side::Credits if balance.is_negative() => Some((*id, balance.abs().to_decimal())),
                _ => None,
            })
            .collect();

        if counterparties.is_empty() {
            // The ledger sums to zero, so an outstanding position always has
            // a counterparty.
            tracing::warn!(
                %group_id,
                %member_id,
                %outstanding,
                ?side,
                "outstanding balance without counterparty"
            );
            return Ok(Vec::new());
        }

        allocate_proportionally(outstanding.to_decimal(), &counterparties)
    }
}
