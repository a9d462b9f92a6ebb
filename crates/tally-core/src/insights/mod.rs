//! Insights - trends, category comparisons and spending heuristics
//!
//! Everything here is a pure function of record slices and a reference
//! "now". Nothing is persisted; callers re-run the computation whenever the
//! underlying data changes (see `Database::subscribe`).
//!
//! ## Contents
//!
//! - **Trends** - six calendar months of expenses, income and savings
//! - **Categories** - this month vs last month per expense category
//! - **Metrics** - daily average, growth rates, most expensive day
//! - **Tracking** - one month or week: totals, category breakdown, per-day
//!   or per-week chart, plus pending and returned loan totals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_core::db::Database;
//!
//! let report = db.get_insights()?;
//! for advisory in &report.advisories {
//!     println!("{}: {}", advisory.title(), advisory.message());
//! }
//! ```

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::models::{Expense, Income, Investment};

pub mod categories;
pub mod metrics;
pub mod tracking;
pub mod trends;
pub mod types;

pub use categories::{category_spending, top_categories};
pub use metrics::{advisories, insight_metrics};
pub use tracking::{
    build_tracking, category_breakdown, daily_trend, lent_totals, tracking_window, weekly_buckets,
};
pub use trends::{monthly_trends, savings_rate};
pub use types::{
    Advisory, CategoryShare, CategorySpending, CategoryTotal, DaySpending, InsightMetrics,
    InsightsReport, LentTotals, MonthlyTrend, Severity, TrackingPoint, TrackingReport,
    TrackingView,
};

/// Months covered by the insights window, current month included
pub const TREND_MONTHS: u32 = 6;

/// Number of categories listed in `top_categories`
pub const TOP_CATEGORY_COUNT: usize = 5;

/// Savings rate (percent) below which a warning is raised
pub const LOW_SAVINGS_THRESHOLD: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Month-over-month expense growth (percent) above which a warning is raised
pub const RISING_EXPENSE_THRESHOLD: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Percentages and averages are reported to two decimal places
pub(crate) fn round2(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// `(current - previous) / previous * 100`, or 0 when there is no baseline
pub(crate) fn growth(current: Decimal, previous: Decimal) -> Decimal {
    if previous > Decimal::ZERO {
        round2((current - previous) / previous * Decimal::ONE_HUNDRED)
    } else {
        Decimal::ZERO
    }
}

/// Assemble the full report from records covering the insights window
pub fn build_report(
    expenses: &[Expense],
    incomes: &[Income],
    investments: &[Investment],
    now: NaiveDateTime,
) -> InsightsReport {
    let trends = monthly_trends(expenses, incomes, now);
    let rate = savings_rate(&trends);
    let spending = category_spending(expenses, now);
    let top = top_categories(&spending);
    let metrics = insight_metrics(expenses, incomes, investments, now);
    let advisories = advisories(rate, &metrics);

    InsightsReport {
        generated_at: now,
        trends,
        savings_rate: rate,
        category_spending: spending,
        top_categories: top,
        metrics,
        advisories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_growth_guards_zero_baseline() {
        assert_eq!(growth(dec!(100), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(growth(dec!(150), dec!(100)), dec!(50));
        assert_eq!(growth(dec!(50), dec!(100)), dec!(-50));
        assert_eq!(growth(dec!(1), dec!(3)), dec!(-66.67));
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(LOW_SAVINGS_THRESHOLD, dec!(20));
        assert_eq!(RISING_EXPENSE_THRESHOLD, dec!(10));
    }
}
