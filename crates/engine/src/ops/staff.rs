use chrono::Utc;
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Account, Cashier, EngineError, MeterReader, ResultEngine, Role, accounts,
    staff::{cashiers, meter_readers},
    util::{new_id, normalize_optional_text, normalize_required},
};

use super::{Engine, NewAccount, with_tx};

impl Engine {
    pub(super) async fn cashier_of_account<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: &str,
    ) -> ResultEngine<Option<cashiers::Model>> {
        cashiers::Entity::find()
            .filter(cashiers::Column::AccountId.eq(account_id.to_string()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn meter_reader_of_account<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: &str,
    ) -> ResultEngine<Option<meter_readers::Model>> {
        meter_readers::Entity::find()
            .filter(meter_readers::Column::AccountId.eq(account_id.to_string()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn require_meter_reader<C: ConnectionTrait>(
        &self,
        db: &C,
        reader_id: &str,
    ) -> ResultEngine<meter_readers::Model> {
        meter_readers::Entity::find_by_id(reader_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("meter reader not exists".to_string()))
    }

    /// Creates a cashier account and its cashier profile.
    pub async fn register_cashier(
        &self,
        actor: &Account,
        email: &str,
        password: &str,
        full_name: &str,
        employee_no: &str,
    ) -> ResultEngine<Cashier> {
        actor.require_role(&[Role::Admin])?;
        let employee_no = normalize_required(employee_no, "employee number")?;

        with_tx!(self, |db_tx| {
            let taken = cashiers::Entity::find()
                .filter(cashiers::Column::EmployeeNo.eq(employee_no.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(employee_no));
            }

            let account = self
                .insert_account(
                    &db_tx,
                    &NewAccount {
                        email: email.to_string(),
                        password: password.to_string(),
                        full_name: full_name.to_string(),
                        role: Role::Cashier,
                    },
                )
                .await?;

            let model = cashiers::ActiveModel {
                id: ActiveValue::Set(new_id()),
                account_id: ActiveValue::Set(account.id.clone()),
                employee_no: ActiveValue::Set(employee_no),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            Cashier::try_from((model, Some(account)))
        })
    }

    /// Creates a meter reader account and its reader profile.
    pub async fn register_meter_reader(
        &self,
        actor: &Account,
        email: &str,
        password: &str,
        full_name: &str,
        assigned_area: Option<&str>,
    ) -> ResultEngine<MeterReader> {
        actor.require_role(&[Role::Admin])?;

        with_tx!(self, |db_tx| {
            let account = self
                .insert_account(
                    &db_tx,
                    &NewAccount {
                        email: email.to_string(),
                        password: password.to_string(),
                        full_name: full_name.to_string(),
                        role: Role::MeterReader,
                    },
                )
                .await?;

            let model = meter_readers::ActiveModel {
                id: ActiveValue::Set(new_id()),
                account_id: ActiveValue::Set(account.id.clone()),
                assigned_area: ActiveValue::Set(normalize_optional_text(assigned_area)),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            MeterReader::try_from((model, Some(account)))
        })
    }

    pub async fn list_cashiers(&self, actor: &Account) -> ResultEngine<Vec<Cashier>> {
        actor.require_role(&[Role::Admin])?;
        cashiers::Entity::find()
            .find_also_related(accounts::Entity)
            .order_by_asc(cashiers::Column::EmployeeNo)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Cashier::try_from)
            .collect()
    }

    pub async fn list_meter_readers(&self, actor: &Account) -> ResultEngine<Vec<MeterReader>> {
        actor.require_role(&[Role::Admin])?;
        meter_readers::Entity::find()
            .find_also_related(accounts::Entity)
            .order_by_asc(meter_readers::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(MeterReader::try_from)
            .collect()
    }

    /// The meter reader profile of the acting account.
    pub async fn my_meter_reader(&self, actor: &Account) -> ResultEngine<MeterReader> {
        actor.require_role(&[Role::MeterReader])?;
        let model = self
            .meter_reader_of_account(&self.database, &actor.id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("meter reader profile not exists".to_string()))?;
        let account = self.account(actor, &actor.id).await?;
        Ok(MeterReader {
            id: model.id,
            account_id: model.account_id,
            full_name: account.full_name,
            email: account.email,
            assigned_area: model.assigned_area,
            created_at: model.created_at,
        })
    }
}
