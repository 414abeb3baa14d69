use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use sea_orm::{PaginatorTrait, QueryFilter, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    Account, Billing, EngineError, IssueStatus, PaymentStatus, ResultEngine, Role, billings,
    consumers, issue_reports, payments,
};

use super::Engine;

/// Collected payments of one calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    /// 1 to 12.
    pub month: u32,
    pub collected: i64,
    pub payments: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueReport {
    pub year: i32,
    /// Always twelve entries, January first.
    pub months: Vec<MonthlyRevenue>,
    pub total: i64,
}

/// Figures shown on the admin dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub consumers: u64,
    pub unpaid: u64,
    pub partial: u64,
    pub paid: u64,
    pub overdue: u64,
    /// Unpaid or partial billings already past their due date that the
    /// overdue sweep has not flagged yet.
    pub past_due: u64,
    pub collected: i64,
    pub outstanding: i64,
    pub open_issues: u64,
}

impl Engine {
    pub async fn revenue_for_year(&self, actor: &Account, year: i32) -> ResultEngine<RevenueReport> {
        actor.require_role(&[Role::Admin])?;

        let bounds = |y: i32| {
            NaiveDate::from_ymd_opt(y, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| Utc.from_utc_datetime(&d))
        };
        let (Some(start), Some(end)) = (bounds(year), year.checked_add(1).and_then(bounds)) else {
            return Err(EngineError::InvalidInput(format!("invalid year {year}")));
        };

        let rows = payments::Entity::find()
            .filter(payments::Column::PaidAt.gte(start))
            .filter(payments::Column::PaidAt.lt(end))
            .all(&self.database)
            .await?;

        let mut months: Vec<MonthlyRevenue> = (1..=12)
            .map(|month| MonthlyRevenue {
                month,
                collected: 0,
                payments: 0,
            })
            .collect();
        for payment in rows {
            let slot = &mut months[payment.paid_at.month0() as usize];
            slot.collected += payment.amount;
            slot.payments += 1;
        }
        let total = months.iter().map(|m| m.collected).sum();

        Ok(RevenueReport {
            year,
            months,
            total,
        })
    }

    pub async fn dashboard_summary(
        &self,
        actor: &Account,
        today: NaiveDate,
    ) -> ResultEngine<DashboardSummary> {
        actor.require_role(&[Role::Admin])?;

        let mut summary = DashboardSummary {
            consumers: consumers::Entity::find().count(&self.database).await?,
            open_issues: issue_reports::Entity::find()
                .filter(issue_reports::Column::Status.ne(IssueStatus::Resolved.as_str()))
                .count(&self.database)
                .await?,
            ..DashboardSummary::default()
        };

        let billings = billings::Entity::find().all(&self.database).await?;
        for model in billings {
            let billing = Billing::try_from(model)?;
            summary.collected += billing.amount_paid;
            summary.outstanding += billing.outstanding();
            match billing.payment_status {
                PaymentStatus::Unpaid => summary.unpaid += 1,
                PaymentStatus::Partial => summary.partial += 1,
                PaymentStatus::Paid => summary.paid += 1,
                PaymentStatus::Overdue => summary.overdue += 1,
            }
            if billing.payment_status.can_become_overdue() && billing.due_date < today {
                summary.past_due += 1;
            }
        }

        Ok(summary)
    }
}
