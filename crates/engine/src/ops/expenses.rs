use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Expense, ExpenseSplit, LedgerEntry, Origin, RecordExpenseCmd, ResultEngine,
    expense_splits, expenses,
    expenses::resolve_shares,
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

impl Engine {
    /// Records an expense paid by one member and split among participants.
    ///
    /// Checks, first failure wins: requester membership, group existence,
    /// payer membership, participant membership, share shape, share sum. The
    /// expense, its splits and its ledger entries are written in one
    /// transaction: one credit for the payer and one debit per participant
    /// with a positive share.
    pub async fn record_expense(&self, cmd: RecordExpenseCmd) -> ResultEngine<Uuid> {
        let RecordExpenseCmd {
            group_id,
            payer_id,
            total,
            description,
            location,
            paid_at,
            participants,
            requester_id,
        } = cmd;
        if !total.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "expense total must be > 0, got {total}"
            )));
        }
        let description = normalize_optional_text(description.as_deref());
        let location = normalize_optional_text(location.as_deref());
        let paid_at = paid_at.unwrap_or_else(Utc::now);

        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;
            if !self.is_member(&db_tx, group_id, payer_id).await? {
                return Err(EngineError::PayerNotMember(payer_id.to_string()));
            }
            for participant in &participants {
                if !self.is_member(&db_tx, group_id, participant.member_id).await? {
                    return Err(EngineError::ParticipantNotMember(
                        participant.member_id.to_string(),
                    ));
                }
            }
            let shares = resolve_shares(total, &participants)?;

            let expense_id = Uuid::new_v4();
            let expense = Expense {
                id: expense_id,
                group_id,
                payer_id,
                description,
                total,
                location,
                paid_at,
                created_by: requester_id,
                created_at: Utc::now(),
                splits: shares
                    .into_iter()
                    .map(|share| ExpenseSplit {
                        expense_id,
                        group_id,
                        member_id: share.member_id,
                        share: share.amount,
                        share_percent: share.percent,
                    })
                    .collect(),
            };

            if let Err(err) = self.insert_expense(&db_tx, &expense).await {
                tracing::error!(%group_id, %expense_id, error = %err, "failed to write expense");
                return Err(EngineError::FailedToCreateExpense(err.to_string()));
            }
            tracing::info!(
                %group_id,
                %expense_id,
                total = %expense.total,
                participants = expense.splits.len(),
                "expense recorded"
            );
            Ok(expense_id)
        })
    }

    async fn insert_expense(
        &self,
        db_tx: &DatabaseTransaction,
        expense: &Expense,
    ) -> ResultEngine<()> {
        expenses::ActiveModel::from(expense).insert(db_tx).await?;
        for split in &expense.splits {
            expense_splits::ActiveModel::from(split).insert(db_tx).await?;
        }

        let origin = Origin::Expense {
            expense_id: expense.id,
        };
        let recorded_at = expense.created_at;
        let mut entries = Vec::with_capacity(expense.splits.len() + 1);
        entries.push(LedgerEntry::credit(
            expense.group_id,
            expense.payer_id,
            origin,
            expense.total,
            recorded_at,
        ));
        entries.extend(
            expense
                .splits
                .iter()
                .filter(|split| split.share.is_positive())
                .map(|split| {
                    LedgerEntry::debit(
                        expense.group_id,
                        split.member_id,
                        origin,
                        split.share,
                        recorded_at,
                    )
                }),
        );
        self.append_entries(db_tx, &entries).await
    }

    /// Returns an expense of the group together with its splits.
    pub async fn expense(
        &self,
        group_id: Uuid,
        expense_id: Uuid,
        requester_id: Uuid,
    ) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;
            let model = expenses::Entity::find_by_id(expense_id.to_string())
                .filter(expenses::Column::GroupId.eq(group_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::ExpenseNotFound(expense_id.to_string()))?;
            let mut expense = Expense::try_from(model)?;
            expense.splits = expense_splits::Entity::find()
                .filter(expense_splits::Column::ExpenseId.eq(expense_id.to_string()))
                .order_by_asc(expense_splits::Column::MemberId)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(ExpenseSplit::try_from)
                .collect::<ResultEngine<_>>()?;
            Ok(expense)
        })
    }

    /// Lists the expenses of a group, most recent payment first.
    pub async fn list_expenses(
        &self,
        group_id: Uuid,
        requester_id: Uuid,
    ) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            self.require_member_of_group(&db_tx, group_id, requester_id)
                .await?;
            let expenses = self.group_expenses(&db_tx, group_id).await?;
            Ok(expenses)
        })
    }

    pub(super) async fn group_expenses(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Vec<Expense>> {
        let mut splits_by_expense: HashMap<Uuid, Vec<ExpenseSplit>> = HashMap::new();
        let split_models = expense_splits::Entity::find()
            .filter(expense_splits::Column::GroupId.eq(group_id.to_string()))
            .order_by_asc(expense_splits::Column::MemberId)
            .all(db)
            .await?;
        for model in split_models {
            let split = ExpenseSplit::try_from(model)?;
            splits_by_expense
                .entry(split.expense_id)
                .or_default()
                .push(split);
        }

        expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id.to_string()))
            .order_by_desc(expenses::Column::PaidAt)
            .order_by_asc(expenses::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|model| {
                let mut expense = Expense::try_from(model)?;
                expense.splits = splits_by_expense.remove(&expense.id).unwrap_or_default();
                Ok(expense)
            })
            .collect()
    }
}
