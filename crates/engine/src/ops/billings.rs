use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    Account, Billing, EngineError, MeterReading, PaymentStatus, ResultEngine, Role, billings,
    meter_readings,
    util::{first_of_month, new_id},
};

use super::{Engine, with_tx};

/// Filters for [`Engine::list_billings`].
#[derive(Clone, Debug, Default)]
pub struct BillingFilter {
    pub consumer_id: Option<String>,
    /// Any day of the billing month.
    pub month: Option<NaiveDate>,
    pub status: Option<PaymentStatus>,
}

impl Engine {
    pub(super) async fn require_billing_model<C: ConnectionTrait>(
        &self,
        db: &C,
        billing_id: &str,
    ) -> ResultEngine<billings::Model> {
        billings::Entity::find_by_id(billing_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("billing not exists".to_string()))
    }

    /// Computes and stores the billing of one read meter reading.
    async fn insert_billing(
        &self,
        db: &DatabaseTransaction,
        reading: meter_readings::Model,
    ) -> ResultEngine<Billing> {
        let already = billings::Entity::find()
            .filter(billings::Column::MeterReadingId.eq(reading.id.clone()))
            .one(db)
            .await?
            .is_some();
        if already {
            return Err(EngineError::ExistingKey(format!(
                "billing for reading {}",
                reading.id
            )));
        }

        let reading = MeterReading::from(reading);
        let (Some(consumption), Some(reading_date)) = (reading.consumption(), reading.reading_date)
        else {
            return Err(EngineError::InvalidReading(
                "reading has no present value yet".to_string(),
            ));
        };

        let consumer = self.load_consumer(db, &reading.consumer_id).await?;
        let bill = self
            .policy
            .compute(consumption, consumer.eligibility(), reading_date)?;
        let status = PaymentStatus::Unpaid.after_payment(0, bill.total_amount_due);
        let now = Utc::now();

        let model = billings::ActiveModel {
            id: ActiveValue::Set(new_id()),
            consumer_id: ActiveValue::Set(consumer.id),
            meter_reading_id: ActiveValue::Set(reading.id),
            billing_month: ActiveValue::Set(reading.cycle_month),
            consumption_m3: ActiveValue::Set(bill.consumption_m3),
            consumption_10_or_below: ActiveValue::Set(bill.consumption_10_or_below),
            consumption_over_10: ActiveValue::Set(bill.consumption_over_10),
            years_of_service: ActiveValue::Set(
                i32::try_from(bill.years_of_service).unwrap_or(i32::MAX),
            ),
            discount_percent: ActiveValue::Set(i32::from(bill.discount_percent)),
            amount_10_or_below: ActiveValue::Set(bill.amount_10_or_below),
            amount_10_or_below_with_discount: ActiveValue::Set(
                bill.amount_10_or_below_with_discount,
            ),
            amount_over_10: ActiveValue::Set(bill.amount_over_10),
            total_amount_due: ActiveValue::Set(bill.total_amount_due),
            amount_paid: ActiveValue::Set(0),
            due_date: ActiveValue::Set(self.policy.due_date(reading_date)),
            payment_status: ActiveValue::Set(status.as_str().to_string()),
            payment_date: ActiveValue::Set((status == PaymentStatus::Paid).then_some(now)),
            created_at: ActiveValue::Set(now),
        }
        .insert(db)
        .await?;

        Billing::try_from(model)
    }

    /// Bills a single read meter reading.
    pub async fn generate_billing(&self, actor: &Account, reading_id: &str) -> ResultEngine<Billing> {
        actor.require_role(&[Role::Admin])?;

        let billing = with_tx!(self, |db_tx| {
            let reading = self.require_reading_model(&db_tx, reading_id).await?;
            self.insert_billing(&db_tx, reading).await
        })?;

        tracing::info!(
            billing_id = %billing.id,
            total = billing.total_amount_due(),
            "billing generated"
        );
        Ok(billing)
    }

    /// Bills every read and not yet billed reading of the month. Returns the
    /// number of billings created.
    pub async fn generate_cycle_billings(
        &self,
        actor: &Account,
        month: NaiveDate,
    ) -> ResultEngine<u64> {
        actor.require_role(&[Role::Admin])?;
        let cycle_month = first_of_month(month);

        let created = with_tx!(self, |db_tx| {
            let readings = meter_readings::Entity::find()
                .filter(meter_readings::Column::CycleMonth.eq(cycle_month))
                .filter(meter_readings::Column::PresentReading.is_not_null())
                .order_by_asc(meter_readings::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let mut created = 0u64;
            for reading in readings {
                let billed = billings::Entity::find()
                    .filter(billings::Column::MeterReadingId.eq(reading.id.clone()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if billed {
                    continue;
                }
                self.insert_billing(&db_tx, reading).await?;
                created += 1;
            }
            Ok::<_, EngineError>(created)
        })?;

        tracing::info!(%cycle_month, created, "cycle billings generated");
        Ok(created)
    }

    /// Returns a billing. Consumers may only read their own.
    pub async fn billing(&self, actor: &Account, billing_id: &str) -> ResultEngine<Billing> {
        let model = self.require_billing_model(&self.database, billing_id).await?;
        match actor.role {
            Role::Admin | Role::Cashier => {}
            Role::Consumer => {
                let own = self.require_own_consumer(&self.database, actor).await?;
                if own.id != model.consumer_id {
                    return Err(EngineError::Forbidden(
                        "cannot read another consumer's billing".to_string(),
                    ));
                }
            }
            Role::MeterReader => {
                return Err(EngineError::Forbidden(
                    "meter readers cannot read billings".to_string(),
                ));
            }
        }
        Billing::try_from(model)
    }

    /// Lists billings, newest month first.
    pub async fn list_billings(
        &self,
        actor: &Account,
        filter: BillingFilter,
    ) -> ResultEngine<Vec<Billing>> {
        actor.require_role(&[Role::Admin, Role::Cashier])?;
        self.query_billings(filter).await
    }

    /// Billings of the acting consumer account, newest month first.
    pub async fn my_billings(&self, actor: &Account) -> ResultEngine<Vec<Billing>> {
        actor.require_role(&[Role::Consumer])?;
        let consumer = self.require_own_consumer(&self.database, actor).await?;
        self.query_billings(BillingFilter {
            consumer_id: Some(consumer.id),
            ..BillingFilter::default()
        })
        .await
    }

    async fn query_billings(&self, filter: BillingFilter) -> ResultEngine<Vec<Billing>> {
        let mut query = billings::Entity::find()
            .order_by_desc(billings::Column::BillingMonth)
            .order_by_asc(billings::Column::ConsumerId);
        if let Some(consumer_id) = filter.consumer_id {
            query = query.filter(billings::Column::ConsumerId.eq(consumer_id));
        }
        if let Some(month) = filter.month {
            query = query.filter(billings::Column::BillingMonth.eq(first_of_month(month)));
        }
        if let Some(status) = filter.status {
            query = query.filter(billings::Column::PaymentStatus.eq(status.as_str()));
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Billing::try_from)
            .collect()
    }

    /// Flags unpaid and partially paid billings due before `today` as overdue.
    pub async fn mark_overdue_billings(&self, actor: &Account, today: NaiveDate) -> ResultEngine<u64> {
        actor.require_role(&[Role::Admin])?;

        let open: Vec<&str> = PaymentStatus::ALL
            .iter()
            .copied()
            .filter(|status| status.can_become_overdue())
            .map(PaymentStatus::as_str)
            .collect();

        let result = billings::Entity::update_many()
            .col_expr(
                billings::Column::PaymentStatus,
                Expr::value(PaymentStatus::Overdue.as_str()),
            )
            .filter(billings::Column::PaymentStatus.is_in(open))
            .filter(billings::Column::DueDate.lt(today))
            .exec(&self.database)
            .await?;

        tracing::info!(%today, flagged = result.rows_affected, "overdue billings flagged");
        Ok(result.rows_affected)
    }

    /// Overrides the payment status of a billing.
    pub async fn set_payment_status(
        &self,
        actor: &Account,
        billing_id: &str,
        status: PaymentStatus,
    ) -> ResultEngine<Billing> {
        actor.require_role(&[Role::Admin])?;

        with_tx!(self, |db_tx| {
            let model = self.require_billing_model(&db_tx, billing_id).await?;
            let payment_date = match status {
                PaymentStatus::Paid => model.payment_date.or(Some(Utc::now())),
                _ => None,
            };

            let mut active: billings::ActiveModel = model.into();
            active.payment_status = ActiveValue::Set(status.as_str().to_string());
            active.payment_date = ActiveValue::Set(payment_date);
            let model = active.update(&db_tx).await?;
            tracing::warn!(billing_id, %status, "payment status overridden");
            Billing::try_from(model)
        })
    }
}
