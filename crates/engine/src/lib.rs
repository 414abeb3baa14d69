//! Domain engine of the BAWASA back office.
//!
//! [`Engine`] owns every business rule: accounts and authentication, consumer
//! registration, the monthly reading cycle, reader assignments, billing
//! generation and payment tracking. Callers hand it an acting [`Account`] and
//! it enforces what that role may do.

pub use accounts::{Account, Role};
pub use assignments::{Assignment, AssignmentStatus};
pub use billing::{
    BillBreakdown, BillingPolicy, Eligibility, voter_discount_percent, years_of_service,
};
pub use billings::{Billing, PaymentStatus};
pub use consumers::Consumer;
pub use error::EngineError;
pub use issue_reports::{IssuePriority, IssueReport, IssueStatus};
pub use meter_readings::MeterReading;
pub use ops::{
    AssignmentFilter, BillingFilter, ConsumerUpdate, DashboardSummary, Engine, EngineBuilder,
    MonthlyRevenue, NewAccount, NewConsumer, NewIssue, ReadingFilter, RevenueReport,
};
pub use payments::Payment;
pub use staff::{Cashier, MeterReader};

mod accounts;
mod assignments;
mod billing;
mod billings;
mod consumers;
mod error;
mod issue_reports;
mod meter_readings;
mod ops;
mod password;
mod payments;
mod staff;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
