//! Consumers: service connections with a water meter.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Eligibility, EngineError, accounts};

/// A consumer joined with the account it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    pub id: String,
    pub account_id: String,
    pub full_name: String,
    pub email: String,
    pub water_meter_no: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub registered_voter: bool,
    pub initial_reading: i64,
    /// Creation time of the linked account.
    pub member_since: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Consumer {
    pub fn eligibility(&self) -> Eligibility {
        Eligibility {
            registered_voter: self.registered_voter,
            member_since: self.member_since_date(),
        }
    }

    pub fn member_since_date(&self) -> NaiveDate {
        self.member_since.date_naive()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "consumers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub water_meter_no: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub registered_voter: bool,
    pub initial_reading: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Account,
    #[sea_orm(has_many = "super::meter_readings::Entity")]
    MeterReadings,
    #[sea_orm(has_many = "super::billings::Entity")]
    Billings,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::meter_readings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeterReadings.def()
    }
}

impl Related<super::billings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Billings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<(Model, Option<accounts::Model>)> for Consumer {
    type Error = EngineError;

    fn try_from((model, account): (Model, Option<accounts::Model>)) -> Result<Self, Self::Error> {
        let account = account.ok_or_else(|| {
            EngineError::KeyNotFound(format!("account of consumer {}", model.id))
        })?;
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            full_name: account.full_name,
            email: account.email,
            water_meter_no: model.water_meter_no,
            address: model.address,
            phone: model.phone,
            registered_voter: model.registered_voter,
            initial_reading: model.initial_reading,
            member_since: account.created_at,
            created_at: model.created_at,
        })
    }
}
