//! Receipt metadata.
//!
//! The engine stores an opaque reference (e.g. an object-store key) to a
//! receipt image; it never looks at the file itself.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, Origin, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub id: Uuid,
    pub group_id: Uuid,
    pub origin: Origin,
    pub reference: String,
    pub attached_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub origin_kind: String,
    pub origin_id: String,
    pub reference: String,
    pub attached_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Receipt> for ActiveModel {
    fn from(receipt: &Receipt) -> Self {
        Self {
            id: ActiveValue::Set(receipt.id.to_string()),
            group_id: ActiveValue::Set(receipt.group_id.to_string()),
            origin_kind: ActiveValue::Set(receipt.origin.kind().as_str().to_string()),
            origin_id: ActiveValue::Set(receipt.origin.id().to_string()),
            reference: ActiveValue::Set(receipt.reference.clone()),
            attached_by: ActiveValue::Set(receipt.attached_by.to_string()),
            created_at: ActiveValue::Set(receipt.created_at),
        }
    }
}

impl TryFrom<Model> for Receipt {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "receipt")?,
            group_id: parse_uuid(&model.group_id, "group")?,
            origin: Origin::from_parts(&model.origin_kind, &model.origin_id)?,
            reference: model.reference,
            attached_by: parse_uuid(&model.attached_by, "user")?,
            created_at: model.created_at,
        })
    }
}
