use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Account, EngineError, ResultEngine, Role, accounts,
    password::{hash_password, reject_unknown_account, validate_password, verify_password},
    util::{new_id, normalize_email, normalize_required},
};

use super::{Engine, with_tx};

/// Shared by every credential failure so callers cannot tell an unknown email
/// from a wrong password.
const INVALID_CREDENTIALS: &str = "invalid email or password";
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Input for a new account.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

impl Engine {
    /// Validates and inserts an account row. Used by every registration path.
    pub(super) async fn insert_account(
        &self,
        db: &DatabaseTransaction,
        new: &NewAccount,
    ) -> ResultEngine<accounts::Model> {
        let email = normalize_email(&new.email)?;
        let full_name = normalize_required(&new.full_name, "full name")?;
        validate_password(&new.password)?;

        let exists = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.clone()))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(EngineError::ExistingKey(email));
        }

        let model = accounts::ActiveModel {
            id: ActiveValue::Set(new_id()),
            email: ActiveValue::Set(email),
            password_hash: ActiveValue::Set(hash_password(&new.password)?),
            full_name: ActiveValue::Set(full_name),
            role: ActiveValue::Set(new.role.as_str().to_string()),
            created_at: ActiveValue::Set(Utc::now()),
            reset_token: ActiveValue::Set(None),
            reset_expires_at: ActiveValue::Set(None),
        };
        Ok(model.insert(db).await?)
    }

    pub(super) async fn require_account_model(
        &self,
        db: &DatabaseTransaction,
        account_id: &str,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    /// Creates an administrator account.
    ///
    /// Consumers, cashiers and meter readers carry extra profile data and go
    /// through their own registration operations instead.
    pub async fn create_account(&self, actor: &Account, new: NewAccount) -> ResultEngine<Account> {
        actor.require_role(&[Role::Admin])?;
        if new.role != Role::Admin {
            return Err(EngineError::InvalidInput(format!(
                "{} accounts must be registered with their profile",
                new.role
            )));
        }

        let account = with_tx!(self, |db_tx| {
            let model = self.insert_account(&db_tx, &new).await?;
            Account::try_from(model)
        })?;
        tracing::info!(account_id = %account.id, "administrator account created");
        Ok(account)
    }

    /// Checks credentials and returns the matching account.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<Account> {
        let email = email.trim().to_lowercase();
        let model = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.database)
            .await?;

        match model {
            Some(model) if verify_password(password, &model.password_hash) => {
                Account::try_from(model)
            }
            Some(_) => Err(EngineError::Unauthorized(INVALID_CREDENTIALS.to_string())),
            None => {
                reject_unknown_account(password);
                Err(EngineError::Unauthorized(INVALID_CREDENTIALS.to_string()))
            }
        }
    }

    /// Returns an account. Admins may read any account, others only their own.
    pub async fn account(&self, actor: &Account, account_id: &str) -> ResultEngine<Account> {
        if !actor.is_admin() && actor.id != account_id {
            return Err(EngineError::Forbidden(
                "cannot read another account".to_string(),
            ));
        }
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        Account::try_from(model)
    }

    pub async fn list_accounts(
        &self,
        actor: &Account,
        role: Option<Role>,
    ) -> ResultEngine<Vec<Account>> {
        actor.require_role(&[Role::Admin])?;

        let mut query = accounts::Entity::find().order_by_asc(accounts::Column::CreatedAt);
        if let Some(role) = role {
            query = query.filter(accounts::Column::Role.eq(role.as_str()));
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    pub async fn change_password(
        &self,
        actor: &Account,
        current_password: &str,
        new_password: &str,
    ) -> ResultEngine<()> {
        validate_password(new_password)?;
        with_tx!(self, |db_tx| {
            let model = self.require_account_model(&db_tx, &actor.id).await?;
            if !verify_password(current_password, &model.password_hash) {
                return Err(EngineError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }

            let mut active: accounts::ActiveModel = model.into();
            active.password_hash = ActiveValue::Set(hash_password(new_password)?);
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Issues a password-reset token valid for one hour.
    ///
    /// Returns `None` for unknown (or malformed) emails instead of an error, so
    /// the caller can answer both cases identically.
    pub async fn request_password_reset(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Option<String>> {
        let Ok(email) = normalize_email(email) else {
            return Ok(None);
        };

        with_tx!(self, |db_tx| {
            let Some(model) = accounts::Entity::find()
                .filter(accounts::Column::Email.eq(email))
                .one(&db_tx)
                .await?
            else {
                return Ok(None);
            };

            let token = new_id();
            let mut active: accounts::ActiveModel = model.into();
            active.reset_token = ActiveValue::Set(Some(token.clone()));
            active.reset_expires_at = ActiveValue::Set(Some(
                now + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
            ));
            active.update(&db_tx).await?;
            Ok(Some(token))
        })
    }

    /// Replaces the password of the account holding `token`.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        validate_password(new_password)?;
        let invalid = || EngineError::Unauthorized("invalid or expired reset token".to_string());
        if token.trim().is_empty() {
            return Err(invalid());
        }

        with_tx!(self, |db_tx| {
            let model = accounts::Entity::find()
                .filter(accounts::Column::ResetToken.eq(token.trim()))
                .one(&db_tx)
                .await?
                .ok_or_else(invalid)?;

            match model.reset_expires_at {
                Some(expires_at) if expires_at > now => {}
                _ => return Err(invalid()),
            }

            let mut active: accounts::ActiveModel = model.into();
            active.password_hash = ActiveValue::Set(hash_password(new_password)?);
            active.reset_token = ActiveValue::Set(None);
            active.reset_expires_at = ActiveValue::Set(None);
            active.update(&db_tx).await?;
            Ok(())
        })
    }
}
