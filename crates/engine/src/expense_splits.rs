//! Expense splits: one row per participant of an expense.

use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents,
    util::{parse_percent, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExpenseSplit {
    pub expense_id: Uuid,
    pub group_id: Uuid,
    pub member_id: Uuid,
    pub share: MoneyCents,
    /// Set when the share was requested as a percentage of the total.
    pub share_percent: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub expense_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub member_id: String,
    pub group_id: String,
    pub share_minor: i64,
    pub share_percent: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ExpenseSplit> for ActiveModel {
    fn from(split: &ExpenseSplit) -> Self {
        Self {
            expense_id: ActiveValue::Set(split.expense_id.to_string()),
            member_id: ActiveValue::Set(split.member_id.to_string()),
            group_id: ActiveValue::Set(split.group_id.to_string()),
            share_minor: ActiveValue::Set(split.share.cents()),
            share_percent: ActiveValue::Set(split.share_percent.map(|p| p.normalize().to_string())),
        }
    }
}

impl TryFrom<Model> for ExpenseSplit {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            expense_id: parse_uuid(&model.expense_id, "expense")?,
            group_id: parse_uuid(&model.group_id, "group")?,
            member_id: parse_uuid(&model.member_id, "user")?,
            share: MoneyCents::new(model.share_minor),
            share_percent: model.share_percent.as_deref().map(parse_percent).transpose()?,
        })
    }
}
