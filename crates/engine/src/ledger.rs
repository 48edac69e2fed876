//! Ledger entries.
//!
//! A [`LedgerEntry`] is one directional money movement for one member of one
//! group, tied to the expense or settlement that caused it. The ledger is the
//! single source of truth: balances are always derived by aggregating entries
//! (`Σ credits − Σ debits`) and never stored.
//!
//! Entries are append-only. The storage layer rejects any `UPDATE`/`DELETE`
//! on `ledger_entries` with `LEDGER_IMMUTABLE` unless the guard is disarmed by
//! group teardown.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

/// Direction of a ledger entry.
///
/// A credit increases the member's net position (the group owes them more), a
/// debit decreases it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl TryFrom<&str> for Direction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(EngineError::InvalidId(format!(
                "invalid ledger direction: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum OriginKind {
    Expense,
    Settlement,
}

impl OriginKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Settlement => "settlement",
        }
    }
}

impl TryFrom<&str> for OriginKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "settlement" => Ok(Self::Settlement),
            other => Err(EngineError::InvalidId(format!(
                "invalid ledger origin kind: {other}"
            ))),
        }
    }
}

/// The fact a ledger entry (or a receipt) refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum Origin {
    Expense { expense_id: Uuid },
    Settlement { settlement_id: Uuid },
}

impl Origin {
    pub(crate) fn kind(self) -> OriginKind {
        match self {
            Self::Expense { .. } => OriginKind::Expense,
            Self::Settlement { .. } => OriginKind::Settlement,
        }
    }

    pub(crate) fn id(self) -> Uuid {
        match self {
            Self::Expense { expense_id } => expense_id,
            Self::Settlement { settlement_id } => settlement_id,
        }
    }

    pub(crate) fn from_parts(kind: &str, id: &str) -> Result<Self, EngineError> {
        let id = parse_uuid(id, "origin")?;
        Ok(match OriginKind::try_from(kind)? {
            OriginKind::Expense => Self::Expense { expense_id: id },
            OriginKind::Settlement => Self::Settlement { settlement_id: id },
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub group_id: Uuid,
    pub member_id: Uuid,
    pub origin: Origin,
    pub direction: Direction,
    /// Always strictly positive; the direction carries the sign.
    pub amount: MoneyCents,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub(crate) fn new(
        group_id: Uuid,
        member_id: Uuid,
        origin: Origin,
        direction: Direction,
        amount: MoneyCents,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            member_id,
            origin,
            direction,
            amount,
            recorded_at,
        }
    }

    pub(crate) fn credit(
        group_id: Uuid,
        member_id: Uuid,
        origin: Origin,
        amount: MoneyCents,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            group_id,
            member_id,
            origin,
            Direction::Credit,
            amount,
            recorded_at,
        )
    }

    pub(crate) fn debit(
        group_id: Uuid,
        member_id: Uuid,
        origin: Origin,
        amount: MoneyCents,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            group_id,
            member_id,
            origin,
            Direction::Debit,
            amount,
            recorded_at,
        )
    }

    /// Contribution of this entry to the member's balance.
    #[must_use]
    pub fn signed_amount(&self) -> MoneyCents {
        match self.direction {
            Direction::Credit => self.amount,
            Direction::Debit => -self.amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub member_id: String,
    pub origin_kind: String,
    pub origin_id: String,
    pub direction: String,
    pub amount_minor: i64,
    pub recorded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Groups,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            group_id: ActiveValue::Set(entry.group_id.to_string()),
            member_id: ActiveValue::Set(entry.member_id.to_string()),
            origin_kind: ActiveValue::Set(entry.origin.kind().as_str().to_string()),
            origin_id: ActiveValue::Set(entry.origin.id().to_string()),
            direction: ActiveValue::Set(entry.direction.as_str().to_string()),
            amount_minor: ActiveValue::Set(entry.amount.cents()),
            recorded_at: ActiveValue::Set(entry.recorded_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "ledger entry")?,
            group_id: parse_uuid(&model.group_id, "group")?,
            member_id: parse_uuid(&model.member_id, "user")?,
            origin: Origin::from_parts(&model.origin_kind, &model.origin_id)?,
            direction: Direction::try_from(model.direction.as_str())?,
            amount: MoneyCents::new(model.amount_minor),
            recorded_at: model.recorded_at,
        })
    }
}
