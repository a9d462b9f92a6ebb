//! Core types for insights

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::ExpenseCategory;

/// Expenses, income and savings for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    /// Label such as "Mar 2024"
    pub month: String,
    /// First day of the month
    pub start: NaiveDate,
    pub expenses: Decimal,
    pub income: Decimal,
    /// Income minus expenses; may be negative
    pub savings: Decimal,
}

impl MonthlyTrend {
    /// Savings as a percentage of income, 0 when there was no income
    pub fn savings_rate(&self) -> Decimal {
        if self.income > Decimal::ZERO {
            super::round2(self.savings / self.income * Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        }
    }
}

/// Spending in one category across the insights window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub category: ExpenseCategory,
    pub label: String,
    pub this_month: Decimal,
    pub last_month: Decimal,
    /// Sum over the whole window
    pub total: Decimal,
    pub count: usize,
    /// `total` divided by the number of months in the window
    pub average: Decimal,
}

/// Share of this month's spending taken by one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: ExpenseCategory,
    pub label: String,
    pub amount: Decimal,
    pub percentage: Decimal,
}

/// The calendar day with the highest total spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySpending {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Headline numbers for the insights page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightMetrics {
    pub avg_daily_expense: Decimal,
    /// Income recorded in the current month
    pub avg_monthly_income: Decimal,
    /// Investments recorded in the window
    pub total_investments: Decimal,
    /// Percent change vs last month, 0 when last month was empty
    pub expense_growth: Decimal,
    pub income_growth: Decimal,
    pub most_expensive_day: Option<DaySpending>,
}

/// Severity level of an advisory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational - no action needed
    Info,
    /// Should be addressed soon
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A heuristic observation about the user's finances (never stored)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// Savings rate below the healthy threshold
    LowSavings { savings_rate: Decimal },
    /// Spending grew noticeably compared with last month
    RisingExpenses { growth: Decimal },
    /// Day with the highest spending in the window
    MostExpensiveDay { date: NaiveDate, amount: Decimal },
}

impl Advisory {
    pub fn severity(&self) -> Severity {
        match self {
            Advisory::LowSavings { .. } | Advisory::RisingExpenses { .. } => Severity::Warning,
            Advisory::MostExpensiveDay { .. } => Severity::Info,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Advisory::LowSavings { .. } => "Low savings rate",
            Advisory::RisingExpenses { .. } => "Expenses are rising",
            Advisory::MostExpensiveDay { .. } => "Most expensive day",
        }
    }

    /// One-line explanation for display
    pub fn message(&self) -> String {
        match self {
            Advisory::LowSavings { savings_rate } => format!(
                "You are saving {}% of your income this month. Aim for at least {}%.",
                savings_rate,
                super::LOW_SAVINGS_THRESHOLD
            ),
            Advisory::RisingExpenses { growth } => {
                format!("Spending is up {}% compared with last month.", growth)
            }
            Advisory::MostExpensiveDay { date, amount } => {
                format!("You spent {} on {}.", amount, date.format("%b %-d, %Y"))
            }
        }
    }
}

/// Everything the insights view shows, computed in one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsReport {
    pub generated_at: NaiveDateTime,
    /// Oldest month first, current month last
    pub trends: Vec<MonthlyTrend>,
    pub savings_rate: Decimal,
    pub category_spending: Vec<CategorySpending>,
    pub top_categories: Vec<CategoryShare>,
    pub metrics: InsightMetrics,
    pub advisories: Vec<Advisory>,
}

/// Period shown by the tracking view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingView {
    /// Calendar month, bucketed into "Week N"
    #[default]
    Monthly,
    /// Sunday-to-Saturday week, bucketed per day
    Weekly,
}

impl TrackingView {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingView::Monthly => "monthly",
            TrackingView::Weekly => "weekly",
        }
    }
}

impl fmt::Display for TrackingView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TrackingView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" => Ok(TrackingView::Monthly),
            "weekly" | "week" => Ok(TrackingView::Weekly),
            other => Err(format!(
                "Unknown tracking view '{}' (expected monthly or weekly)",
                other
            )),
        }
    }
}

/// Total spent in one expense category within a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub label: String,
    pub amount: Decimal,
}

/// Expenses and income for one bucket of the tracking chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingPoint {
    /// "Sun".."Sat" for weekly views, "Week 1".."Week 5" for monthly views
    pub label: String,
    /// First day covered by the bucket
    pub start: NaiveDate,
    pub expenses: Decimal,
    pub income: Decimal,
}

/// Totals, category breakdown and trend for one tracking period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingReport {
    pub view: TrackingView,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub total_expenses: Decimal,
    pub total_income: Decimal,
    /// Income minus expenses; may be negative
    pub net: Decimal,
    /// Highest amount first; categories with no spending are left out
    pub categories: Vec<CategoryTotal>,
    pub trend: Vec<TrackingPoint>,
}

/// Money still owed vs money paid back
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LentTotals {
    pub pending: Decimal,
    pub returned: Decimal,
    pub pending_count: usize,
    pub returned_count: usize,
}
