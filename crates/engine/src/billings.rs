//! Billings: the computed bill of one meter reading and its payment state.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{BillBreakdown, EngineError, util::db_enum};

db_enum! {
    pub enum PaymentStatus ("payment status") {
        Unpaid => "unpaid",
        Partial => "partial",
        Paid => "paid",
        Overdue => "overdue",
    }
}

impl PaymentStatus {
    /// Status after the running total reaches `amount_paid` of `total`.
    ///
    /// An overdue bill stays overdue until it is fully settled.
    pub fn after_payment(self, amount_paid: i64, total: i64) -> Self {
        if amount_paid >= total {
            Self::Paid
        } else if self == Self::Overdue {
            Self::Overdue
        } else if amount_paid > 0 {
            Self::Partial
        } else {
            Self::Unpaid
        }
    }

    /// Whether the overdue sweep may flip this status.
    pub fn can_become_overdue(self) -> bool {
        matches!(self, Self::Unpaid | Self::Partial)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Billing {
    pub id: String,
    pub consumer_id: String,
    pub meter_reading_id: String,
    pub billing_month: NaiveDate,
    pub breakdown: BillBreakdown,
    pub amount_paid: i64,
    pub due_date: NaiveDate,
    pub payment_status: PaymentStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Billing {
    pub fn total_amount_due(&self) -> i64 {
        self.breakdown.total_amount_due
    }

    pub fn outstanding(&self) -> i64 {
        (self.breakdown.total_amount_due - self.amount_paid).max(0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bawasa_billings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub consumer_id: String,
    pub meter_reading_id: String,
    pub billing_month: NaiveDate,
    #[sea_orm(column_name = "consumption_m3")]
    pub consumption_m3: i64,
    #[sea_orm(column_name = "consumption_10_or_below")]
    pub consumption_10_or_below: i64,
    #[sea_orm(column_name = "consumption_over_10")]
    pub consumption_over_10: i64,
    pub years_of_service: i32,
    pub discount_percent: i32,
    #[sea_orm(column_name = "amount_10_or_below")]
    pub amount_10_or_below: i64,
    #[sea_orm(column_name = "amount_10_or_below_with_discount")]
    pub amount_10_or_below_with_discount: i64,
    #[sea_orm(column_name = "amount_over_10")]
    pub amount_over_10: i64,
    pub total_amount_due: i64,
    pub amount_paid: i64,
    pub due_date: NaiveDate,
    pub payment_status: String,
    pub payment_date: Option<DateTime<Utc>>,
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
    #[sea_orm(
        belongs_to = "super::meter_readings::Entity",
        from = "Column::MeterReadingId",
        to = "super::meter_readings::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    MeterReading,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::consumers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consumer.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Billing {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let years_of_service = u32::try_from(model.years_of_service).map_err(|_| {
            EngineError::InvalidInput(format!("invalid years of service on billing {}", model.id))
        })?;
        let discount_percent = u8::try_from(model.discount_percent).map_err(|_| {
            EngineError::InvalidInput(format!("invalid discount on billing {}", model.id))
        })?;

        Ok(Self {
            payment_status: PaymentStatus::try_from(model.payment_status.as_str())?,
            breakdown: BillBreakdown {
                consumption_m3: model.consumption_m3,
                consumption_10_or_below: model.consumption_10_or_below,
                consumption_over_10: model.consumption_over_10,
                years_of_service,
                discount_percent,
                amount_10_or_below: model.amount_10_or_below,
                amount_10_or_below_with_discount: model.amount_10_or_below_with_discount,
                amount_over_10: model.amount_over_10,
                total_amount_due: model.total_amount_due,
            },
            id: model.id,
            consumer_id: model.consumer_id,
            meter_reading_id: model.meter_reading_id,
            billing_month: model.billing_month,
            amount_paid: model.amount_paid,
            due_date: model.due_date,
            payment_date: model.payment_date,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::PaymentStatus::*;

    #[test]
    fn partial_then_full_payment() {
        assert_eq!(Unpaid.after_payment(100, 500), Partial);
        assert_eq!(Partial.after_payment(500, 500), Paid);
        assert_eq!(Unpaid.after_payment(0, 500), Unpaid);
    }

    #[test]
    fn overdue_stays_overdue_until_settled() {
        assert_eq!(Overdue.after_payment(100, 500), Overdue);
        assert_eq!(Overdue.after_payment(500, 500), Paid);
    }

    #[test]
    fn zero_total_is_paid_immediately() {
        assert_eq!(Unpaid.after_payment(0, 0), Paid);
    }

    #[test]
    fn only_open_bills_can_become_overdue() {
        assert!(Unpaid.can_become_overdue());
        assert!(Partial.can_become_overdue());
        assert!(!Paid.can_become_overdue());
        assert!(!Overdue.can_become_overdue());
    }
}
