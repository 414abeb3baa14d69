//! Accounts: identity, credentials and role.
//!
//! Every person using the back office has an account. Role-specific data lives
//! in extension tables (`consumers`, `cashiers`, `bawasa_meter_reader`) keyed
//! by `account_id`.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, util::db_enum};

db_enum! {
    /// Role of an account. Decides which operations it may run.
    pub enum Role ("role") {
        Admin => "admin",
        Cashier => "cashier",
        MeterReader => "meter_reader",
        Consumer => "consumer",
    }
}

/// An authenticated identity, without credentials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Built-in administrator used by operator tooling.
    ///
    /// It has no row in `accounts`, so anything keyed by the actor's id (e.g.
    /// the cashier of a payment) is left empty.
    pub fn system() -> Self {
        Self {
            id: "system".to_string(),
            email: "system@localhost".to_string(),
            full_name: "System".to_string(),
            role: Role::Admin,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with `Forbidden` unless the account has one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> ResultEngine<()> {
        if roles.contains(&self.role) {
            return Ok(());
        }
        Err(EngineError::Forbidden(format!(
            "{} accounts cannot perform this operation",
            self.role
        )))
    }

    /// Date the account was created. Years of service count from here.
    pub fn member_since(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub reset_token: Option<String>,
    pub reset_expires_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::consumers::Entity")]
    Consumer,
}

impl Related<super::consumers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consumer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            role: Role::try_from(model.role.as_str())?,
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_their_column_value() {
        for role in Role::ALL {
            assert_eq!(Role::try_from(role.as_str()).unwrap(), *role);
        }
        assert!(Role::try_from("superuser").is_err());
    }

    #[test]
    fn require_role_rejects_other_roles() {
        let mut account = Account::system();
        assert!(account.require_role(&[Role::Admin]).is_ok());

        account.role = Role::Consumer;
        let err = account
            .require_role(&[Role::Admin, Role::Cashier])
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
    }
}
