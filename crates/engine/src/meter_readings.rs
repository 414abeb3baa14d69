//! Monthly meter readings.
//!
//! A reading is created empty when a billing cycle opens, carrying the
//! previous reading forward. The present reading is filled in later by a meter
//! reader.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterReading {
    pub id: String,
    pub consumer_id: String,
    /// First day of the cycle month.
    pub cycle_month: NaiveDate,
    pub previous_reading: i64,
    pub present_reading: Option<i64>,
    pub reading_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MeterReading {
    /// Cubic meters used, once the present reading is known.
    pub fn consumption(&self) -> Option<i64> {
        self.present_reading
            .map(|present| present - self.previous_reading)
    }

    pub fn is_read(&self) -> bool {
        self.present_reading.is_some()
    }

    /// Value the next cycle starts from.
    pub fn carried_forward(&self) -> i64 {
        self.present_reading.unwrap_or(self.previous_reading)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bawasa_meter_readings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub consumer_id: String,
    pub cycle_month: NaiveDate,
    pub previous_reading: i64,
    pub present_reading: Option<i64>,
    pub reading_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::consumers::Entity",
        from = "Column::ConsumerId",
        to = "super::consumers::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Consumer,
}

impl Related<super::consumers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consumer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MeterReading {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            consumer_id: model.consumer_id,
            cycle_month: model.cycle_month,
            previous_reading: model.previous_reading,
            present_reading: model.present_reading,
            reading_date: model.reading_date,
            remarks: model.remarks,
            created_at: model.created_at,
        }
    }
}
