use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Account, AssignmentStatus, EngineError, MeterReading, ResultEngine, Role, assignments,
    billings, consumers, meter_readings,
    util::{first_of_month, new_id, normalize_optional_text},
};

use super::{Engine, with_tx};

/// Filters for [`Engine::list_readings`].
#[derive(Clone, Debug, Default)]
pub struct ReadingFilter {
    /// Any day of the cycle month.
    pub month: Option<NaiveDate>,
    pub consumer_id: Option<String>,
}

impl Engine {
    pub(super) async fn require_reading_model<C: ConnectionTrait>(
        &self,
        db: &C,
        reading_id: &str,
    ) -> ResultEngine<meter_readings::Model> {
        meter_readings::Entity::find_by_id(reading_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("meter reading not exists".to_string()))
    }

    /// Value the next cycle of `consumer` starts from.
    async fn seed_reading<C: ConnectionTrait>(
        &self,
        db: &C,
        consumer: &consumers::Model,
        cycle_month: NaiveDate,
    ) -> ResultEngine<i64> {
        let latest = meter_readings::Entity::find()
            .filter(meter_readings::Column::ConsumerId.eq(consumer.id.clone()))
            .filter(meter_readings::Column::CycleMonth.lt(cycle_month))
            .order_by_desc(meter_readings::Column::CycleMonth)
            .one(db)
            .await?;

        Ok(latest
            .map(MeterReading::from)
            .map_or(consumer.initial_reading, |r| r.carried_forward()))
    }

    /// Carries `carried` into the later cycles of a consumer that were opened
    /// before this reading was taken.
    ///
    /// Unread cycles take the new value as their previous reading. The walk
    /// stops at the first read cycle, whose present value must not be below
    /// `carried`. A billed cycle can no longer move.
    async fn reseed_later_cycles<C: ConnectionTrait>(
        &self,
        db: &C,
        consumer_id: &str,
        cycle_month: NaiveDate,
        carried: i64,
    ) -> ResultEngine<()> {
        let later = meter_readings::Entity::find()
            .filter(meter_readings::Column::ConsumerId.eq(consumer_id.to_string()))
            .filter(meter_readings::Column::CycleMonth.gt(cycle_month))
            .order_by_asc(meter_readings::Column::CycleMonth)
            .all(db)
            .await?;

        for model in later {
            if model.previous_reading == carried {
                break;
            }
            let billed = billings::Entity::find()
                .filter(billings::Column::MeterReadingId.eq(model.id.clone()))
                .one(db)
                .await?
                .is_some();
            if billed {
                return Err(EngineError::InvalidReading(format!(
                    "cycle {} is already billed from previous reading {}",
                    model.cycle_month, model.previous_reading
                )));
            }

            let reading = MeterReading::from(model.clone());
            if let Some(present) = reading.present_reading.filter(|p| *p < carried) {
                return Err(EngineError::InvalidReading(format!(
                    "cycle {} was read at {present}, below {carried}",
                    reading.cycle_month
                )));
            }

            let mut active: meter_readings::ActiveModel = model.into();
            active.previous_reading = ActiveValue::Set(carried);
            active.update(db).await?;
            if reading.is_read() {
                break;
            }
        }
        Ok(())
    }

    /// Creates an empty reading for every consumer that has none for the
    /// month of `month`. Returns how many were created.
    pub async fn open_billing_cycle(&self, actor: &Account, month: NaiveDate) -> ResultEngine<u64> {
        actor.require_role(&[Role::Admin])?;
        let cycle_month = first_of_month(month);

        let created = with_tx!(self, |db_tx| {
            let consumers = consumers::Entity::find()
                .order_by_asc(consumers::Column::WaterMeterNo)
                .all(&db_tx)
                .await?;

            let mut created = 0u64;
            for consumer in consumers {
                let exists = meter_readings::Entity::find()
                    .filter(meter_readings::Column::ConsumerId.eq(consumer.id.clone()))
                    .filter(meter_readings::Column::CycleMonth.eq(cycle_month))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if exists {
                    continue;
                }

                let previous_reading = self.seed_reading(&db_tx, &consumer, cycle_month).await?;
                meter_readings::ActiveModel {
                    id: ActiveValue::Set(new_id()),
                    consumer_id: ActiveValue::Set(consumer.id),
                    cycle_month: ActiveValue::Set(cycle_month),
                    previous_reading: ActiveValue::Set(previous_reading),
                    present_reading: ActiveValue::Set(None),
                    reading_date: ActiveValue::Set(None),
                    remarks: ActiveValue::Set(None),
                    created_at: ActiveValue::Set(Utc::now()),
                }
                .insert(&db_tx)
                .await?;
                created += 1;
            }
            Ok::<_, EngineError>(created)
        })?;

        tracing::info!(%cycle_month, created, "billing cycle opened");
        Ok(created)
    }

    /// Stores the present meter value of a reading.
    ///
    /// Meter readers need an active assignment for the consumer, and that
    /// assignment is completed by the call. Cycles of the consumer opened
    /// before this reading are re-seeded from it.
    pub async fn record_present_reading(
        &self,
        actor: &Account,
        reading_id: &str,
        present_reading: i64,
        reading_date: NaiveDate,
        remarks: Option<&str>,
    ) -> ResultEngine<MeterReading> {
        actor.require_role(&[Role::Admin, Role::MeterReader])?;

        with_tx!(self, |db_tx| {
            let model = self.require_reading_model(&db_tx, reading_id).await?;

            let billed = billings::Entity::find()
                .filter(billings::Column::MeterReadingId.eq(model.id.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if billed {
                return Err(EngineError::InvalidReading(
                    "reading already billed".to_string(),
                ));
            }
            if present_reading < model.previous_reading {
                return Err(EngineError::InvalidReading(format!(
                    "present reading {present_reading} is below previous reading {}",
                    model.previous_reading
                )));
            }

            let mut active_assignments = assignments::Entity::find()
                .filter(assignments::Column::ConsumerId.eq(model.consumer_id.clone()))
                .filter(assignments::Column::Status.is_in(AssignmentStatus::active_values()));
            if actor.role == Role::MeterReader {
                let reader = self
                    .meter_reader_of_account(&db_tx, &actor.id)
                    .await?
                    .ok_or_else(|| {
                        EngineError::Forbidden("meter reader profile not exists".to_string())
                    })?;
                active_assignments =
                    active_assignments.filter(assignments::Column::ReaderId.eq(reader.id));
            }
            let active_assignments = active_assignments.all(&db_tx).await?;
            if actor.role == Role::MeterReader && active_assignments.is_empty() {
                return Err(EngineError::Forbidden(
                    "consumer is not assigned to this meter reader".to_string(),
                ));
            }

            let now = Utc::now();
            for assignment in active_assignments {
                let mut assignment: assignments::ActiveModel = assignment.into();
                assignment.status = ActiveValue::Set(AssignmentStatus::Completed.as_str().to_string());
                assignment.completed_at = ActiveValue::Set(Some(now));
                assignment.update(&db_tx).await?;
            }

            self.reseed_later_cycles(
                &db_tx,
                &model.consumer_id,
                model.cycle_month,
                present_reading,
            )
            .await?;

            let mut active: meter_readings::ActiveModel = model.into();
            active.present_reading = ActiveValue::Set(Some(present_reading));
            active.reading_date = ActiveValue::Set(Some(reading_date));
            active.remarks = ActiveValue::Set(normalize_optional_text(remarks));
            let model = active.update(&db_tx).await?;
            Ok(MeterReading::from(model))
        })
    }

    pub async fn reading(&self, actor: &Account, reading_id: &str) -> ResultEngine<MeterReading> {
        actor.require_role(&[Role::Admin, Role::MeterReader])?;
        let model = self.require_reading_model(&self.database, reading_id).await?;
        Ok(MeterReading::from(model))
    }

    pub async fn list_readings(
        &self,
        actor: &Account,
        filter: ReadingFilter,
    ) -> ResultEngine<Vec<MeterReading>> {
        actor.require_role(&[Role::Admin, Role::MeterReader])?;

        let mut query = meter_readings::Entity::find()
            .order_by_desc(meter_readings::Column::CycleMonth)
            .order_by_asc(meter_readings::Column::ConsumerId);
        if let Some(month) = filter.month {
            query = query.filter(meter_readings::Column::CycleMonth.eq(first_of_month(month)));
        }
        if let Some(consumer_id) = filter.consumer_id {
            query = query.filter(meter_readings::Column::ConsumerId.eq(consumer_id));
        }

        Ok(query
            .all(&self.database)
            .await?
            .into_iter()
            .map(MeterReading::from)
            .collect())
    }
}
