//! Tiered water billing calculator.
//!
//! Consumption is split at the tier threshold (10 m³ by default). The first
//! tier is billed at the flat rate minus the registered-voter discount, the
//! rest is always billed at the full rate. All amounts are **minor units**
//! (centavos), so the default rate of 30.00 per m³ is `3000`.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use engine::{BillingPolicy, Eligibility};
//!
//! let policy = BillingPolicy::default();
//! let eligibility = Eligibility {
//!     registered_voter: true,
//!     member_since: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
//! };
//! let bill = policy
//!     .compute(15, eligibility, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap())
//!     .unwrap();
//!
//! assert_eq!(bill.discount_percent, 25);
//! assert_eq!(bill.amount_10_or_below_with_discount, 22_500);
//! assert_eq!(bill.amount_over_10, 15_000);
//! assert_eq!(bill.total_amount_due, 37_500);
//! ```

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

pub const DEFAULT_RATE_MINOR_PER_M3: i64 = 3_000;
pub const DEFAULT_TIER_THRESHOLD_M3: i64 = 10;
pub const DEFAULT_DUE_DAYS: u32 = 15;

/// Rates and offsets used to turn a reading into a billing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPolicy {
    /// Price of one cubic meter, in minor units.
    pub rate_minor_per_m3: i64,
    /// Cubic meters covered by the discountable first tier.
    pub tier_threshold_m3: i64,
    /// Days between the reading date and the due date.
    pub due_days: u32,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            rate_minor_per_m3: DEFAULT_RATE_MINOR_PER_M3,
            tier_threshold_m3: DEFAULT_TIER_THRESHOLD_M3,
            due_days: DEFAULT_DUE_DAYS,
        }
    }
}

/// Discount eligibility of a consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Eligibility {
    pub registered_voter: bool,
    /// Creation date of the consumer's account.
    pub member_since: NaiveDate,
}

/// Result of [`BillingPolicy::compute`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillBreakdown {
    pub consumption_m3: i64,
    pub consumption_10_or_below: i64,
    pub consumption_over_10: i64,
    pub years_of_service: u32,
    pub discount_percent: u8,
    pub amount_10_or_below: i64,
    pub amount_10_or_below_with_discount: i64,
    pub amount_over_10: i64,
    pub total_amount_due: i64,
}

impl BillingPolicy {
    pub fn validate(&self) -> ResultEngine<()> {
        if self.rate_minor_per_m3 < 0 {
            return Err(EngineError::InvalidInput(
                "billing rate must be >= 0".to_string(),
            ));
        }
        if self.tier_threshold_m3 < 0 {
            return Err(EngineError::InvalidInput(
                "tier threshold must be >= 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Computes the bill for `consumption_m3` measured on `billed_on`.
    pub fn compute(
        &self,
        consumption_m3: i64,
        eligibility: Eligibility,
        billed_on: NaiveDate,
    ) -> ResultEngine<BillBreakdown> {
        if consumption_m3 < 0 {
            return Err(EngineError::InvalidReading(format!(
                "consumption must be >= 0, got {consumption_m3}"
            )));
        }

        let consumption_10_or_below = consumption_m3.min(self.tier_threshold_m3);
        let consumption_over_10 = (consumption_m3 - self.tier_threshold_m3).max(0);

        let years_of_service = years_of_service(eligibility.member_since, billed_on);
        let discount_percent = voter_discount_percent(eligibility.registered_voter, years_of_service);

        let amount_10_or_below = self.amount_for(consumption_10_or_below)?;
        let amount_over_10 = self.amount_for(consumption_over_10)?;
        let amount_10_or_below_with_discount = amount_10_or_below
            .checked_mul(i64::from(100 - discount_percent))
            .map(|amount| amount / 100)
            .ok_or_else(|| EngineError::InvalidReading("first tier amount overflow".to_string()))?;

        Ok(BillBreakdown {
            consumption_m3,
            consumption_10_or_below,
            consumption_over_10,
            years_of_service,
            discount_percent,
            amount_10_or_below,
            amount_10_or_below_with_discount,
            amount_over_10,
            total_amount_due: amount_10_or_below_with_discount + amount_over_10,
        })
    }

    /// Due date for a bill read on `billed_on`.
    pub fn due_date(&self, billed_on: NaiveDate) -> NaiveDate {
        billed_on
            .checked_add_days(Days::new(u64::from(self.due_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    fn amount_for(&self, cubic_meters: i64) -> ResultEngine<i64> {
        cubic_meters
            .checked_mul(self.rate_minor_per_m3)
            .ok_or_else(|| {
                EngineError::InvalidReading(format!("consumption too large: {cubic_meters}"))
            })
    }
}

/// Whole years between `member_since` and `on`, counting an anniversary only
/// once it has been reached. Never less than 1.
pub fn years_of_service(member_since: NaiveDate, on: NaiveDate) -> u32 {
    let mut years = on.year() - member_since.year();
    if (on.month(), on.day()) < (member_since.month(), member_since.day()) {
        years -= 1;
    }
    u32::try_from(years.max(1)).unwrap_or(1)
}

/// Discount on the first tier for a consumer in their `years`-th year.
pub fn voter_discount_percent(registered_voter: bool, years: u32) -> u8 {
    if !registered_voter {
        return 0;
    }
    match years {
        0 | 1 => 0,
        2 => 25,
        3 => 50,
        4 => 75,
        _ => 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn voter(since: NaiveDate) -> Eligibility {
        Eligibility {
            registered_voter: true,
            member_since: since,
        }
    }

    #[test]
    fn fifteen_cubic_meters_in_second_year() {
        let bill = BillingPolicy::default()
            .compute(15, voter(date(2024, 3, 1)), date(2026, 3, 1))
            .unwrap();

        assert_eq!(bill.years_of_service, 2);
        assert_eq!(bill.discount_percent, 25);
        assert_eq!(bill.consumption_10_or_below, 10);
        assert_eq!(bill.consumption_over_10, 5);
        assert_eq!(bill.amount_10_or_below, 30_000);
        assert_eq!(bill.amount_10_or_below_with_discount, 22_500);
        assert_eq!(bill.amount_over_10, 15_000);
        assert_eq!(bill.total_amount_due, 37_500);
    }

    #[test]
    fn anniversary_not_reached_counts_previous_year() {
        assert_eq!(years_of_service(date(2024, 3, 1), date(2026, 2, 28)), 1);
        assert_eq!(years_of_service(date(2024, 3, 1), date(2026, 3, 1)), 2);
        assert_eq!(years_of_service(date(2024, 3, 1), date(2024, 12, 31)), 1);
    }

    #[test]
    fn years_of_service_floors_at_one() {
        assert_eq!(years_of_service(date(2026, 5, 1), date(2026, 5, 1)), 1);
        assert_eq!(years_of_service(date(2026, 5, 1), date(2025, 1, 1)), 1);
    }

    #[test]
    fn leap_day_anniversary_waits_for_march() {
        assert_eq!(years_of_service(date(2024, 2, 29), date(2027, 2, 28)), 2);
        assert_eq!(years_of_service(date(2024, 2, 29), date(2027, 3, 1)), 3);
    }

    #[test]
    fn discount_schedule_saturates_at_year_five() {
        let schedule: Vec<u8> = (1..=8).map(|y| voter_discount_percent(true, y)).collect();
        assert_eq!(schedule, vec![0, 25, 50, 75, 100, 100, 100, 100]);
    }

    #[test]
    fn non_voters_never_get_a_discount() {
        for years in 0..20 {
            assert_eq!(voter_discount_percent(false, years), 0);
        }

        let bill = BillingPolicy::default()
            .compute(
                8,
                Eligibility {
                    registered_voter: false,
                    member_since: date(2000, 1, 1),
                },
                date(2026, 1, 1),
            )
            .unwrap();
        assert_eq!(bill.discount_percent, 0);
        assert_eq!(bill.total_amount_due, 24_000);
    }

    #[test]
    fn first_tier_matches_discount_formula_for_all_tenures() {
        let policy = BillingPolicy::default();
        for consumption in [0, 1, 7, 10, 11, 25, 120] {
            for years in 1..=7 {
                let since = date(2026 - years, 6, 1);
                let bill = policy
                    .compute(consumption, voter(since), date(2026, 6, 1))
                    .unwrap();
                let discount = i64::from(voter_discount_percent(true, years as u32));
                let first_tier = consumption.min(10);

                assert_eq!(
                    bill.amount_10_or_below_with_discount,
                    first_tier * 3_000 * (100 - discount) / 100
                );
                assert_eq!(bill.amount_over_10, (consumption - 10).max(0) * 3_000);
                assert_eq!(
                    bill.total_amount_due,
                    bill.amount_10_or_below_with_discount + bill.amount_over_10
                );
            }
        }
    }

    #[test]
    fn full_discount_only_bills_the_excess() {
        let bill = BillingPolicy::default()
            .compute(12, voter(date(2015, 1, 1)), date(2026, 1, 1))
            .unwrap();
        assert_eq!(bill.discount_percent, 100);
        assert_eq!(bill.amount_10_or_below_with_discount, 0);
        assert_eq!(bill.total_amount_due, 6_000);
    }

    #[test]
    fn negative_consumption_is_rejected() {
        let err = BillingPolicy::default()
            .compute(-1, voter(date(2020, 1, 1)), date(2026, 1, 1))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidReading(_)));
    }

    #[test]
    fn custom_policy_moves_threshold_and_due_date() {
        let policy = BillingPolicy {
            rate_minor_per_m3: 2_000,
            tier_threshold_m3: 5,
            due_days: 10,
        };
        let bill = policy
            .compute(
                7,
                Eligibility {
                    registered_voter: false,
                    member_since: date(2020, 1, 1),
                },
                date(2026, 1, 1),
            )
            .unwrap();
        assert_eq!(bill.consumption_10_or_below, 5);
        assert_eq!(bill.consumption_over_10, 2);
        assert_eq!(bill.total_amount_due, 14_000);
        assert_eq!(policy.due_date(date(2026, 1, 25)), date(2026, 2, 4));
    }

    #[test]
    fn negative_rate_fails_validation() {
        let policy = BillingPolicy {
            rate_minor_per_m3: -1,
            ..BillingPolicy::default()
        };
        assert!(policy.validate().is_err());
        assert!(BillingPolicy::default().validate().is_ok());
    }
}
