use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::LikeExpr,
};

use crate::{
    Account, Consumer, EngineError, ResultEngine, Role, accounts, consumers,
    util::{contains_pattern, new_id, normalize_optional_text, normalize_required},
};

use super::{Engine, NewAccount, with_tx};

/// Input for registering a consumer together with their account.
#[derive(Clone, Debug)]
pub struct NewConsumer {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub water_meter_no: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub registered_voter: bool,
    /// Meter value at connection time; seeds the first billing cycle.
    pub initial_reading: i64,
}

/// Partial update of a consumer. `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct ConsumerUpdate {
    pub full_name: Option<String>,
    pub water_meter_no: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub registered_voter: Option<bool>,
}

impl Engine {
    pub(super) async fn load_consumer<C: ConnectionTrait>(
        &self,
        db: &C,
        consumer_id: &str,
    ) -> ResultEngine<Consumer> {
        let row = consumers::Entity::find_by_id(consumer_id.to_string())
            .find_also_related(accounts::Entity)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("consumer not exists".to_string()))?;
        Consumer::try_from(row)
    }

    pub(super) async fn consumer_of_account<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: &str,
    ) -> ResultEngine<Option<Consumer>> {
        consumers::Entity::find()
            .filter(consumers::Column::AccountId.eq(account_id.to_string()))
            .find_also_related(accounts::Entity)
            .one(db)
            .await?
            .map(Consumer::try_from)
            .transpose()
    }

    /// The consumer profile of a consumer-role actor.
    pub(super) async fn require_own_consumer<C: ConnectionTrait>(
        &self,
        db: &C,
        actor: &Account,
    ) -> ResultEngine<Consumer> {
        self.consumer_of_account(db, &actor.id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("consumer profile not exists".to_string()))
    }

    async fn ensure_meter_no_free<C: ConnectionTrait>(
        &self,
        db: &C,
        water_meter_no: &str,
        except_consumer_id: Option<&str>,
    ) -> ResultEngine<()> {
        let mut query = consumers::Entity::find()
            .filter(consumers::Column::WaterMeterNo.eq(water_meter_no.to_string()));
        if let Some(id) = except_consumer_id {
            query = query.filter(consumers::Column::Id.ne(id.to_string()));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(water_meter_no.to_string()));
        }
        Ok(())
    }

    /// Creates a consumer account and its consumer profile.
    pub async fn register_consumer(
        &self,
        actor: &Account,
        new: NewConsumer,
    ) -> ResultEngine<Consumer> {
        actor.require_role(&[Role::Admin])?;
        let water_meter_no = normalize_required(&new.water_meter_no, "water meter number")?;
        if new.initial_reading < 0 {
            return Err(EngineError::InvalidReading(
                "initial reading must be >= 0".to_string(),
            ));
        }

        let consumer = with_tx!(self, |db_tx| {
            self.ensure_meter_no_free(&db_tx, &water_meter_no, None)
                .await?;
            let account = self
                .insert_account(
                    &db_tx,
                    &NewAccount {
                        email: new.email.clone(),
                        password: new.password.clone(),
                        full_name: new.full_name.clone(),
                        role: Role::Consumer,
                    },
                )
                .await?;

            let model = consumers::ActiveModel {
                id: ActiveValue::Set(new_id()),
                account_id: ActiveValue::Set(account.id.clone()),
                water_meter_no: ActiveValue::Set(water_meter_no),
                address: ActiveValue::Set(normalize_optional_text(new.address.as_deref())),
                phone: ActiveValue::Set(normalize_optional_text(new.phone.as_deref())),
                registered_voter: ActiveValue::Set(new.registered_voter),
                initial_reading: ActiveValue::Set(new.initial_reading),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            Consumer::try_from((model, Some(account)))
        })?;

        tracing::info!(
            consumer_id = %consumer.id,
            meter = %consumer.water_meter_no,
            "consumer registered"
        );
        Ok(consumer)
    }

    pub async fn update_consumer(
        &self,
        actor: &Account,
        consumer_id: &str,
        update: ConsumerUpdate,
    ) -> ResultEngine<Consumer> {
        actor.require_role(&[Role::Admin])?;

        with_tx!(self, |db_tx| {
            let model = consumers::Entity::find_by_id(consumer_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("consumer not exists".to_string()))?;
            let account_id = model.account_id.clone();
            let mut active: consumers::ActiveModel = model.into();

            if let Some(meter) = update.water_meter_no.as_deref() {
                let meter = normalize_required(meter, "water meter number")?;
                self.ensure_meter_no_free(&db_tx, &meter, Some(consumer_id))
                    .await?;
                active.water_meter_no = ActiveValue::Set(meter);
            }
            if let Some(address) = update.address.as_deref() {
                active.address = ActiveValue::Set(normalize_optional_text(Some(address)));
            }
            if let Some(phone) = update.phone.as_deref() {
                active.phone = ActiveValue::Set(normalize_optional_text(Some(phone)));
            }
            if let Some(registered_voter) = update.registered_voter {
                active.registered_voter = ActiveValue::Set(registered_voter);
            }
            active.update(&db_tx).await?;

            if let Some(full_name) = update.full_name.as_deref() {
                let full_name = normalize_required(full_name, "full name")?;
                let account = self.require_account_model(&db_tx, &account_id).await?;
                let mut account: accounts::ActiveModel = account.into();
                account.full_name = ActiveValue::Set(full_name);
                account.update(&db_tx).await?;
            }

            self.load_consumer(&db_tx, consumer_id).await
        })
    }

    /// Returns a consumer. Consumers read their own profile through
    /// [`Engine::my_consumer`].
    pub async fn consumer(&self, actor: &Account, consumer_id: &str) -> ResultEngine<Consumer> {
        actor.require_role(&[Role::Admin])?;
        self.load_consumer(&self.database, consumer_id).await
    }

    /// The consumer profile of the acting consumer account.
    pub async fn my_consumer(&self, actor: &Account) -> ResultEngine<Consumer> {
        actor.require_role(&[Role::Consumer])?;
        self.require_own_consumer(&self.database, actor).await
    }

    /// Lists consumers, optionally filtered by a case-insensitive match on
    /// name, email or meter number. The search term is matched literally.
    pub async fn list_consumers(
        &self,
        actor: &Account,
        search: Option<&str>,
    ) -> ResultEngine<Vec<Consumer>> {
        actor.require_role(&[Role::Admin])?;

        let mut query = consumers::Entity::find()
            .find_also_related(accounts::Entity)
            .order_by_asc(consumers::Column::WaterMeterNo);
        if let Some(term) = normalize_optional_text(search) {
            let pattern = contains_pattern(&term);
            let like = || LikeExpr::new(pattern.clone()).escape('\\');
            query = query.filter(
                Condition::any()
                    .add(accounts::Column::FullName.like(like()))
                    .add(accounts::Column::Email.like(like()))
                    .add(consumers::Column::WaterMeterNo.like(like())),
            );
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Consumer::try_from)
            .collect()
    }
}
