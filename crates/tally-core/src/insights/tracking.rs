//! Period tracking: monthly or weekly totals and breakdowns

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use super::types::{CategoryTotal, LentTotals, TrackingPoint, TrackingReport, TrackingView};
use crate::models::{Expense, ExpenseCategory, Income, LentMoney, LentStatus};
use crate::period::{first_of_month, last_of_month, month_window, start_of_week, week_window};

/// Days per "Week N" bucket in the monthly view
const DAYS_PER_BUCKET: u32 = 7;

/// Inclusive window for the view: the calendar month or the Sunday-start
/// week containing `now`
pub fn tracking_window(
    now: NaiveDateTime,
    view: TrackingView,
) -> (NaiveDateTime, NaiveDateTime) {
    match view {
        TrackingView::Monthly => month_window(now),
        TrackingView::Weekly => week_window(now),
    }
}

/// Spending per category, highest first. Categories with nothing spent are
/// omitted.
pub fn category_breakdown(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = ExpenseCategory::ALL
        .iter()
        .map(|category| CategoryTotal {
            category: *category,
            label: category.label().to_string(),
            amount: expenses
                .iter()
                .filter(|e| e.category == *category)
                .map(|e| e.amount)
                .sum(),
        })
        .filter(|t| t.amount > Decimal::ZERO)
        .collect();

    totals.sort_by(|a, b| b.amount.cmp(&a.amount));
    totals
}

/// Seven buckets, Sunday through Saturday, for the week starting on
/// `week_start`
pub fn daily_trend(
    expenses: &[Expense],
    incomes: &[Income],
    week_start: NaiveDate,
) -> Vec<TrackingPoint> {
    let mut points: Vec<TrackingPoint> = (0..7)
        .map(|offset| {
            let day = week_start + Duration::days(offset);
            TrackingPoint {
                label: day.format("%a").to_string(),
                start: day,
                expenses: Decimal::ZERO,
                income: Decimal::ZERO,
            }
        })
        .collect();

    for expense in expenses {
        if let Some(point) = points.iter_mut().find(|p| p.start == expense.date.date()) {
            point.expenses += expense.amount;
        }
    }
    for income in incomes {
        if let Some(point) = points.iter_mut().find(|p| p.start == income.date.date()) {
            point.income += income.amount;
        }
    }

    points
}

/// "Week N" buckets for the month containing `month`. A day of month `d`
/// falls in week `d / 7 + 1`, so days 1-6 form Week 1 and the last bucket
/// may hold a single day. Every bucket is present, empty ones with zeros.
pub fn weekly_buckets(
    expenses: &[Expense],
    incomes: &[Income],
    month: NaiveDate,
) -> Vec<TrackingPoint> {
    let first = first_of_month(month);
    let last = last_of_month(month);

    let mut points: Vec<TrackingPoint> = (0..=last.day() / DAYS_PER_BUCKET)
        .map(|week| TrackingPoint {
            label: format!("Week {}", week + 1),
            start: first + Duration::days(i64::from((week * DAYS_PER_BUCKET).max(1) - 1)),
            expenses: Decimal::ZERO,
            income: Decimal::ZERO,
        })
        .collect();

    let in_month = |date: NaiveDateTime| date.date() >= first && date.date() <= last;
    let bucket = |date: NaiveDateTime| (date.day() / DAYS_PER_BUCKET) as usize;

    for expense in expenses.iter().filter(|e| in_month(e.date)) {
        points[bucket(expense.date)].expenses += expense.amount;
    }
    for income in incomes.iter().filter(|i| in_month(i.date)) {
        points[bucket(income.date)].income += income.amount;
    }

    points
}

/// Tracking report for the period of `view` containing `now`. Records
/// outside the period are ignored.
pub fn build_tracking(
    expenses: &[Expense],
    incomes: &[Income],
    now: NaiveDateTime,
    view: TrackingView,
) -> TrackingReport {
    let (start, end) = tracking_window(now, view);

    let expenses: Vec<Expense> = expenses
        .iter()
        .filter(|e| e.date >= start && e.date <= end)
        .cloned()
        .collect();
    let incomes: Vec<Income> = incomes
        .iter()
        .filter(|i| i.date >= start && i.date <= end)
        .cloned()
        .collect();

    let total_expenses: Decimal = expenses.iter().map(|e| e.amount).sum();
    let total_income: Decimal = incomes.iter().map(|i| i.amount).sum();

    let trend = match view {
        TrackingView::Monthly => weekly_buckets(&expenses, &incomes, now.date()),
        TrackingView::Weekly => daily_trend(&expenses, &incomes, start_of_week(now.date())),
    };

    TrackingReport {
        view,
        start,
        end,
        total_expenses,
        total_income,
        net: total_income - total_expenses,
        categories: category_breakdown(&expenses),
        trend,
    }
}

/// Outstanding and repaid amounts across all loans
pub fn lent_totals(records: &[LentMoney]) -> LentTotals {
    records
        .iter()
        .fold(LentTotals::default(), |mut totals, lent| {
            match lent.status {
                LentStatus::Pending => {
                    totals.pending += lent.amount;
                    totals.pending_count += 1;
                }
                LentStatus::Returned => {
                    totals.returned += lent.amount;
                    totals.returned_count += 1;
                }
            }
            totals
        })
}
