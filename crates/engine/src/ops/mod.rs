use sea_orm::DatabaseConnection;

use crate::{BillingPolicy, ResultEngine};

mod accounts;
mod assignments;
mod billings;
mod consumers;
mod issues;
mod payments;
mod readings;
mod reports;
mod staff;

pub use accounts::NewAccount;
pub use assignments::AssignmentFilter;
pub use billings::BillingFilter;
pub use consumers::{ConsumerUpdate, NewConsumer};
pub use issues::NewIssue;
pub use readings::ReadingFilter;
pub use reports::{DashboardSummary, MonthlyRevenue, RevenueReport};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    policy: BillingPolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Rates and due-date offset applied to new billings.
    pub fn policy(&self) -> BillingPolicy {
        self.policy
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    policy: Option<BillingPolicy>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default billing policy.
    pub fn billing_policy(mut self, policy: BillingPolicy) -> EngineBuilder {
        self.policy = Some(policy);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let policy = self.policy.unwrap_or_default();
        policy.validate()?;
        Ok(Engine {
            database: self.database,
            policy,
        })
    }
}
