//! Conversions from wire enums to engine enums.
//!
//! Both sides share the same canonical strings, so conversion goes through
//! `as_str` and the engine's `TryFrom<&str>`.

use api_types::{account, assignment, billing, issue};

use crate::ServerError;

pub(crate) fn role(value: account::Role) -> Result<engine::Role, ServerError> {
    Ok(engine::Role::try_from(value.as_str())?)
}

pub(crate) fn assignment_status(
    value: assignment::AssignmentStatus,
) -> Result<engine::AssignmentStatus, ServerError> {
    Ok(engine::AssignmentStatus::try_from(value.as_str())?)
}

pub(crate) fn payment_status(
    value: billing::PaymentStatus,
) -> Result<engine::PaymentStatus, ServerError> {
    Ok(engine::PaymentStatus::try_from(value.as_str())?)
}

pub(crate) fn issue_status(value: issue::IssueStatus) -> Result<engine::IssueStatus, ServerError> {
    Ok(engine::IssueStatus::try_from(value.as_str())?)
}

pub(crate) fn issue_priority(
    value: issue::IssuePriority,
) -> Result<engine::IssuePriority, ServerError> {
    Ok(engine::IssuePriority::try_from(value.as_str())?)
}
