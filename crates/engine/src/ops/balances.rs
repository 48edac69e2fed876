use std::collections::BTreeMap;

use sea_orm::{DatabaseTransaction, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

use crate::{MoneyCents, ResultEngine};

use super::{Engine, with_tx};

/// Aggregate view of a group's spending and positions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    /// Sum of all expense totals.
    pub total: MoneyCents,
    /// One row per member, ordered by member id.
    pub per_member: Vec<MemberSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    pub member_id: Uuid,
    /// Sum of the totals of the expenses this member paid.
    pub total_paid: MoneyCents,
    /// Sum of this member's split shares.
    pub total_owed: MoneyCents,
    /// Net ledger position: positive means the group owes the member.
    pub balance: MoneyCents,
}

fn summary_row(rows: &mut BTreeMap<Uuid, MemberSummary>, member_id: Uuid) -> &mut MemberSummary {
    rows.entry(member_id).or_insert(MemberSummary {
        member_id,
        total_paid: MoneyCents::ZERO,
        total_owed: MoneyCents::ZERO,
        balance: MoneyCents::ZERO,
    })
}

impl Engine {
    /// Replays the group's ledger into one balance per member.
    ///
    /// Members without entries are absent from the map.
    pub(super) async fn ledger_balances(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<BTreeMap<Uuid, MoneyCents>> {
        let mut balances = BTreeMap::new();
        for entry in self.query_entries(db, group_id, None).await? {
            balances
                .entry(entry.member_id)
                .or_insert(MoneyCents::ZERO)
                .accumulate(entry.signed_amount())?;
        }
        Ok(balances)
    }

    pub(super) async fn balance_of(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<MoneyCents> {
        let mut balance = MoneyCents::ZERO;
        for entry in self.query_entries(db, group_id, Some(member_id)).await? {
            balance.accumulate(entry.signed_amount())?;
        }
        Ok(balance)
    }

    /// Returns `Σ credits − Σ debits` for a member; zero without activity.
    pub async fn member_balance(
        &self,
        group_id: Uuid,
        member_id: Uuid,
        requester_id: Uuid,
    ) -> ResultEngine<MoneyCents> {
        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;
            self.balance_of(&db_tx, group_id, member_id).await
        })
    }

    /// Returns the group total and per-member paid, owed and balance.
    ///
    /// Current members are always listed; former members are listed while
    /// they still have ledger rows, so the balances always add up to zero.
    pub async fn group_summary(
        &self,
        group_id: Uuid,
        requester_id: Uuid,
    ) -> ResultEngine<GroupSummary> {
        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;

            let mut rows: BTreeMap<Uuid, MemberSummary> = BTreeMap::new();
            for membership in self.group_memberships(&db_tx, group_id).await? {
                summary_row(&mut rows, membership.member_id);
            }
            for (member_id, balance) in self.ledger_balances(&db_tx, group_id).await? {
                summary_row(&mut rows, member_id).balance = balance;
            }

            let mut total = MoneyCents::ZERO;
            for expense in self.group_expenses(&db_tx, group_id).await? {
                total.accumulate(expense.total)?;
                summary_row(&mut rows, expense.payer_id)
                    .total_paid
                    .accumulate(expense.total)?;
                for split in &expense.splits {
                    summary_row(&mut rows, split.member_id)
                        .total_owed
                        .accumulate(split.share)?;
                }
            }

            Ok(GroupSummary {
                total,
                per_member: rows.into_values().collect(),
            })
        })
    }
}
