//! Headline metrics and advisory heuristics

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use super::types::{Advisory, DaySpending, InsightMetrics};
use super::{growth, round2, LOW_SAVINGS_THRESHOLD, RISING_EXPENSE_THRESHOLD};
use crate::models::{Expense, Income, Investment};
use crate::period::{days_elapsed_in_month, month_window};

fn sum_in<I>(records: I, start: NaiveDateTime, end: NaiveDateTime) -> Decimal
where
    I: IntoIterator<Item = (NaiveDateTime, Decimal)>,
{
    records
        .into_iter()
        .filter(|(date, _)| *date >= start && *date <= end)
        .map(|(_, amount)| amount)
        .sum()
}

/// Day with the highest total spending. Ties go to the earliest day.
fn most_expensive_day(expenses: &[Expense]) -> Option<DaySpending> {
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for expense in expenses {
        *by_day.entry(expense.date.date()).or_default() += expense.amount;
    }

    let mut best: Option<DaySpending> = None;
    for (date, amount) in by_day {
        if best.as_ref().map_or(true, |b| amount > b.amount) {
            best = Some(DaySpending { date, amount });
        }
    }
    best
}

pub fn insight_metrics(
    expenses: &[Expense],
    incomes: &[Income],
    investments: &[Investment],
    now: NaiveDateTime,
) -> InsightMetrics {
    let (this_start, this_end) = month_window(now);
    let (last_start, last_end) = month_window(now - Months::new(1));

    let expense_points = || expenses.iter().map(|e| (e.date, e.amount));
    let income_points = || incomes.iter().map(|i| (i.date, i.amount));

    let current_expenses = sum_in(expense_points(), this_start, this_end);
    let last_expenses = sum_in(expense_points(), last_start, last_end);
    let current_income = sum_in(income_points(), this_start, this_end);
    let last_income = sum_in(income_points(), last_start, last_end);

    let days = Decimal::from(days_elapsed_in_month(now));

    InsightMetrics {
        avg_daily_expense: round2(current_expenses / days),
        avg_monthly_income: current_income,
        total_investments: investments.iter().map(|i| i.amount).sum(),
        expense_growth: growth(current_expenses, last_expenses),
        income_growth: growth(current_income, last_income),
        most_expensive_day: most_expensive_day(expenses),
    }
}

/// Heuristic observations derived from the metrics
pub fn advisories(savings_rate: Decimal, metrics: &InsightMetrics) -> Vec<Advisory> {
    let mut advisories = Vec::new();

    if savings_rate < LOW_SAVINGS_THRESHOLD {
        advisories.push(Advisory::LowSavings { savings_rate });
    }
    if metrics.expense_growth > RISING_EXPENSE_THRESHOLD {
        advisories.push(Advisory::RisingExpenses {
            growth: metrics.expense_growth,
        });
    }
    if let Some(ref day) = metrics.most_expensive_day {
        advisories.push(Advisory::MostExpensiveDay {
            date: day.date,
            amount: day.amount,
        });
    }

    advisories
}
