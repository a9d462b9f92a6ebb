//! Monthly expense/income/savings trend

use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;

use super::types::MonthlyTrend;
use super::TREND_MONTHS;
use crate::models::{Expense, Income};
use crate::period::{month_label, months_back};

/// One bucket per month for the trailing window, oldest first, current
/// month last. Months with no records are present with zero totals.
pub fn monthly_trends(
    expenses: &[Expense],
    incomes: &[Income],
    now: NaiveDateTime,
) -> Vec<MonthlyTrend> {
    let today = now.date();
    let mut trends: Vec<MonthlyTrend> = (0..TREND_MONTHS)
        .rev()
        .map(|back| {
            let start = months_back(today, back);
            MonthlyTrend {
                month: month_label(start),
                start,
                expenses: Decimal::ZERO,
                income: Decimal::ZERO,
                savings: Decimal::ZERO,
            }
        })
        .collect();

    for expense in expenses {
        if let Some(i) = bucket(&trends, expense.date) {
            trends[i].expenses += expense.amount;
        }
    }
    for income in incomes {
        if let Some(i) = bucket(&trends, income.date) {
            trends[i].income += income.amount;
        }
    }

    for trend in &mut trends {
        trend.savings = trend.income - trend.expenses;
    }

    trends
}

fn bucket(trends: &[MonthlyTrend], date: NaiveDateTime) -> Option<usize> {
    trends
        .iter()
        .position(|t| t.start.year() == date.year() && t.start.month() == date.month())
}

/// Savings rate of the current (last) month
pub fn savings_rate(trends: &[MonthlyTrend]) -> Decimal {
    trends
        .last()
        .map(MonthlyTrend::savings_rate)
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseCategory, IncomeCategory, PaymentMethod};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn expense(date: NaiveDateTime, amount: Decimal) -> Expense {
        Expense {
            id: 0,
            date,
            payment_method: PaymentMethod::Cash,
            title: "x".to_string(),
            description: None,
            amount,
            category: ExpenseCategory::Shopping,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn income(date: NaiveDateTime, amount: Decimal) -> Income {
        Income {
            id: 0,
            date,
            source: "Employer".to_string(),
            description: None,
            amount,
            category: IncomeCategory::Salary,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_six_zero_buckets_current_last() {
        let trends = monthly_trends(&[], &[], at(2024, 3, 15));
        let labels: Vec<&str> = trends.iter().map(|t| t.month.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Oct 2023", "Nov 2023", "Dec 2023", "Jan 2024", "Feb 2024", "Mar 2024"]
        );
        assert!(trends.iter().all(|t| t.expenses.is_zero() && t.income.is_zero()));
        assert_eq!(savings_rate(&trends), Decimal::ZERO);
    }

    #[test]
    fn test_records_land_in_their_month() {
        let expenses = vec![
            expense(at(2024, 3, 2), dec!(300)),
            expense(at(2024, 2, 20), dec!(100)),
            // Outside the window
            expense(at(2023, 9, 30), dec!(999)),
        ];
        let incomes = vec![income(at(2024, 3, 1), dec!(1000))];

        let trends = monthly_trends(&expenses, &incomes, at(2024, 3, 15));
        let march = trends.last().unwrap();
        assert_eq!(march.expenses, dec!(300));
        assert_eq!(march.income, dec!(1000));
        assert_eq!(march.savings, dec!(700));
        assert_eq!(trends[4].expenses, dec!(100));
        assert_eq!(trends[4].savings, dec!(-100));

        let total: Decimal = trends.iter().map(|t| t.expenses).sum();
        assert_eq!(total, dec!(400));

        assert_eq!(savings_rate(&trends), dec!(70));
    }
}
