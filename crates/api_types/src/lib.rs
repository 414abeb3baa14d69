//! Request and query bodies of the BAWASA HTTP API.
//!
//! Amounts are integer minor units (centavos) and carry a `_minor` suffix.
//! Months are plain dates; any day of the month selects that month.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordResetRequest {
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordResetConfirm {
        pub token: String,
        pub new_password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordChange {
        pub current_password: String,
        pub new_password: String,
    }

    /// Body of every password-reset request response.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Accepted {
        pub message: String,
    }
}

pub mod account {
    use super::*;

    /// Role of an account.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        Admin,
        Cashier,
        MeterReader,
        Consumer,
    }

    impl Role {
        /// Returns the canonical role string used by the engine/database.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Admin => "admin",
                Self::Cashier => "cashier",
                Self::MeterReader => "meter_reader",
                Self::Consumer => "consumer",
            }
        }
    }

    /// New administrator account.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub email: String,
        pub password: String,
        pub full_name: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountQuery {
        pub role: Option<Role>,
    }
}

pub mod consumer {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ConsumerNew {
        pub email: String,
        pub password: String,
        pub full_name: String,
        pub water_meter_no: String,
        pub address: Option<String>,
        pub phone: Option<String>,
        #[serde(default)]
        pub registered_voter: bool,
        /// Meter value at connection time. Defaults to 0.
        pub initial_reading: Option<i64>,
    }

    /// Omitted fields are left unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ConsumerUpdate {
        pub full_name: Option<String>,
        pub water_meter_no: Option<String>,
        pub address: Option<String>,
        pub phone: Option<String>,
        pub registered_voter: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ConsumerQuery {
        /// Case-insensitive match on name, email or meter number.
        pub search: Option<String>,
    }
}

pub mod staff {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CashierNew {
        pub email: String,
        pub password: String,
        pub full_name: String,
        pub employee_no: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MeterReaderNew {
        pub email: String,
        pub password: String,
        pub full_name: String,
        pub assigned_area: Option<String>,
    }
}

pub mod cycle {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Cycle {
        pub month: NaiveDate,
    }

    /// Outcome of opening or billing a cycle.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CycleResult {
        pub month: NaiveDate,
        pub created: u64,
    }
}

pub mod reading {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReadingQuery {
        pub month: Option<NaiveDate>,
        pub consumer_id: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PresentReading {
        pub present_reading: i64,
        /// Defaults to today.
        pub reading_date: Option<NaiveDate>,
        pub remarks: Option<String>,
    }
}

pub mod assignment {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AssignmentStatus {
        Assigned,
        Ongoing,
        Completed,
    }

    impl AssignmentStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Assigned => "assigned",
                Self::Ongoing => "ongoing",
                Self::Completed => "completed",
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssignmentNew {
        pub reader_id: String,
        pub consumer_ids: Vec<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AssignmentQuery {
        pub reader_id: Option<String>,
        pub status: Option<AssignmentStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssignmentStatusUpdate {
        pub status: AssignmentStatus,
    }
}

pub mod billing {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentStatus {
        Unpaid,
        Partial,
        Paid,
        Overdue,
    }

    impl PaymentStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Unpaid => "unpaid",
                Self::Partial => "partial",
                Self::Paid => "paid",
                Self::Overdue => "overdue",
            }
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BillingQuery {
        pub consumer_id: Option<String>,
        pub month: Option<NaiveDate>,
        pub status: Option<PaymentStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentStatusUpdate {
        pub status: PaymentStatus,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct OverdueSweep {
        /// Defaults to today.
        pub today: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OverdueResult {
        pub flagged: u64,
    }
}

pub mod payment {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentNew {
        pub amount_minor: i64,
        /// Official receipt number or similar.
        pub reference: Option<String>,
    }
}

pub mod issue {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum IssueStatus {
        Open,
        InProgress,
        Resolved,
    }

    impl IssueStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Open => "open",
                Self::InProgress => "in_progress",
                Self::Resolved => "resolved",
            }
        }
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum IssuePriority {
        Low,
        #[default]
        Medium,
        High,
    }

    impl IssuePriority {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Low => "low",
                Self::Medium => "medium",
                Self::High => "high",
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IssueNew {
        pub issue_type: String,
        pub description: String,
        #[serde(default)]
        pub priority: IssuePriority,
        /// Only honoured for staff; consumers always report for themselves.
        pub consumer_id: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct IssueQuery {
        pub status: Option<IssueStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IssueStatusUpdate {
        pub status: IssueStatus,
    }
}

pub mod report {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RevenueQuery {
        pub year: i32,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DashboardQuery {
        /// Defaults to today.
        pub today: Option<NaiveDate>,
    }
}
