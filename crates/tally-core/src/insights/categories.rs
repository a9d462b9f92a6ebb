//! Per-category spending comparison

use chrono::{Months, NaiveDateTime};
use rust_decimal::Decimal;

use super::types::{CategoryShare, CategorySpending};
use super::{round2, TOP_CATEGORY_COUNT, TREND_MONTHS};
use crate::models::{Expense, ExpenseCategory};
use crate::period::month_window;

/// This month, last month and window totals for every expense category
/// with spending. Sorted by this month's amount, highest first.
///
/// `average` always divides by the window length, not by the number of
/// months that actually had spending.
pub fn category_spending(expenses: &[Expense], now: NaiveDateTime) -> Vec<CategorySpending> {
    let (this_start, this_end) = month_window(now);
    let (last_start, last_end) = month_window(now - Months::new(1));
    let divisor = Decimal::from(TREND_MONTHS);

    let mut rows: Vec<CategorySpending> = ExpenseCategory::ALL
        .iter()
        .map(|category| CategorySpending {
            category: *category,
            label: category.label().to_string(),
            this_month: Decimal::ZERO,
            last_month: Decimal::ZERO,
            total: Decimal::ZERO,
            count: 0,
            average: Decimal::ZERO,
        })
        .collect();

    for expense in expenses {
        let Some(row) = rows.iter_mut().find(|r| r.category == expense.category) else {
            continue;
        };
        row.total += expense.amount;
        row.count += 1;

        if expense.date >= this_start && expense.date <= this_end {
            row.this_month += expense.amount;
        } else if expense.date >= last_start && expense.date <= last_end {
            row.last_month += expense.amount;
        }
    }

    let mut rows: Vec<CategorySpending> = rows
        .into_iter()
        .filter(|r| r.total > Decimal::ZERO)
        .map(|mut r| {
            r.average = round2(r.total / divisor);
            r
        })
        .collect();

    // Stable sort keeps declaration order among equal amounts
    rows.sort_by(|a, b| b.this_month.cmp(&a.this_month));
    rows
}

/// The biggest categories this month with their share of this month's total
pub fn top_categories(spending: &[CategorySpending]) -> Vec<CategoryShare> {
    let total: Decimal = spending.iter().map(|c| c.this_month).sum();

    spending
        .iter()
        .take(TOP_CATEGORY_COUNT)
        .map(|c| CategoryShare {
            category: c.category,
            label: c.label.clone(),
            amount: c.this_month,
            percentage: if total > Decimal::ZERO {
                round2(c.this_month / total * Decimal::ONE_HUNDRED)
            } else {
                Decimal::ZERO
            },
        })
        .collect()
}
