//! Payment ledger. One row per cashier transaction.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub billing_id: String,
    /// `None` when recorded by an administrator without a cashier profile.
    pub cashier_id: Option<String>,
    pub amount: i64,
    pub reference: Option<String>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub billing_id: String,
    pub cashier_id: Option<String>,
    pub amount: i64,
    pub reference: Option<String>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::billings::Entity",
        from = "Column::BillingId",
        to = "super::billings::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Billing,
}

impl Related<super::billings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Billing.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Payment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            billing_id: model.billing_id,
            cashier_id: model.cashier_id,
            amount: model.amount,
            reference: model.reference,
            paid_at: model.paid_at,
        }
    }
}
