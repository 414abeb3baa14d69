//! Role-specific account extensions for staff: cashiers and meter readers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EngineError, accounts};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cashier {
    pub id: String,
    pub account_id: String,
    pub full_name: String,
    pub email: String,
    pub employee_no: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterReader {
    pub id: String,
    pub account_id: String,
    pub full_name: String,
    pub email: String,
    pub assigned_area: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub mod cashiers {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "cashiers")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub account_id: String,
        pub employee_no: String,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "crate::accounts::Entity",
            from = "Column::AccountId",
            to = "crate::accounts::Column::Id",
            on_update = "NoAction",
            on_delete = "Cascade"
        )]
        Account,
    }

    impl Related<crate::accounts::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Account.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod meter_readers {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "bawasa_meter_reader")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub account_id: String,
        pub assigned_area: Option<String>,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "crate::accounts::Entity",
            from = "Column::AccountId",
            to = "crate::accounts::Column::Id",
            on_update = "NoAction",
            on_delete = "Cascade"
        )]
        Account,
    }

    impl Related<crate::accounts::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Account.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

fn require_account(account: Option<accounts::Model>, id: &str) -> Result<accounts::Model, EngineError> {
    account.ok_or_else(|| EngineError::KeyNotFound(format!("account of staff member {id}")))
}

impl TryFrom<(cashiers::Model, Option<accounts::Model>)> for Cashier {
    type Error = EngineError;

    fn try_from(
        (model, account): (cashiers::Model, Option<accounts::Model>),
    ) -> Result<Self, Self::Error> {
        let account = require_account(account, &model.id)?;
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            full_name: account.full_name,
            email: account.email,
            employee_no: model.employee_no,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<(meter_readers::Model, Option<accounts::Model>)> for MeterReader {
    type Error = EngineError;

    fn try_from(
        (model, account): (meter_readers::Model, Option<accounts::Model>),
    ) -> Result<Self, Self::Error> {
        let account = require_account(account, &model.id)?;
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            full_name: account.full_name,
            email: account.email,
            assigned_area: model.assigned_area,
            created_at: model.created_at,
        })
    }
}
