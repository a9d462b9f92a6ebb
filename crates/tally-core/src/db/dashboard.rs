//! Dashboard statistics, tracking and the insights query

use chrono::{Months, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::debug;

use super::Database;
use crate::error::Result;
use crate::insights::{self, InsightsReport, TrackingReport, TrackingView, TREND_MONTHS};
use crate::models::{DashboardStats, PaymentMethod};
use crate::period::{day_window, local_now, month_window};

impl Database {
    /// Dashboard numbers for the month and day containing `now`
    pub fn get_dashboard_stats_at(&self, now: NaiveDateTime) -> Result<DashboardStats> {
        let (month_start, month_end) = month_window(now);
        let (day_start, day_end) = day_window(now);

        let month_expenses = self.get_expenses_by_date_range(month_start, month_end)?;
        let month_incomes = self.get_incomes_by_date_range(month_start, month_end)?;

        let monthly_expenses: Decimal = month_expenses.iter().map(|e| e.amount).sum();
        let daily_expenses: Decimal = month_expenses
            .iter()
            .filter(|e| e.date >= day_start && e.date <= day_end)
            .map(|e| e.amount)
            .sum();
        let credit_card_spending: Decimal = month_expenses
            .iter()
            .filter(|e| e.payment_method == PaymentMethod::CreditCard)
            .map(|e| e.amount)
            .sum();
        let monthly_income: Decimal = month_incomes.iter().map(|i| i.amount).sum();

        let stats = DashboardStats {
            monthly_expenses,
            daily_expenses,
            monthly_income,
            current_balance: monthly_income - monthly_expenses,
            total_investments: self.total_investments()?,
            credit_card_spending,
        };

        debug!(
            "Dashboard for {}: {} expenses, {} income",
            now.date(),
            month_expenses.len(),
            month_incomes.len()
        );
        Ok(stats)
    }

    pub fn get_dashboard_stats(&self) -> Result<DashboardStats> {
        self.get_dashboard_stats_at(local_now())
    }

    /// Totals, category breakdown and chart buckets for the month or the
    /// Sunday-start week containing `now`
    pub fn get_tracking_at(
        &self,
        now: NaiveDateTime,
        view: TrackingView,
    ) -> Result<TrackingReport> {
        let (start, end) = insights::tracking_window(now, view);

        let expenses = self.get_expenses_by_date_range(start, end)?;
        let incomes = self.get_incomes_by_date_range(start, end)?;

        debug!(
            "Tracking {} from {}: {} expenses, {} income",
            view,
            start.date(),
            expenses.len(),
            incomes.len()
        );
        Ok(insights::build_tracking(&expenses, &incomes, now, view))
    }

    pub fn get_tracking(&self, view: TrackingView) -> Result<TrackingReport> {
        self.get_tracking_at(local_now(), view)
    }

    /// Insights over the trailing months ending with the month of `now`
    pub fn get_insights_at(&self, now: NaiveDateTime) -> Result<InsightsReport> {
        let (_, window_end) = month_window(now);
        let (window_start, _) = month_window(now - Months::new(TREND_MONTHS - 1));

        let expenses = self.get_expenses_by_date_range(window_start, window_end)?;
        let incomes = self.get_incomes_by_date_range(window_start, window_end)?;
        let investments = self.get_investments_by_date_range(window_start, window_end)?;

        Ok(insights::build_report(
            &expenses,
            &incomes,
            &investments,
            now,
        ))
    }

    pub fn get_insights(&self) -> Result<InsightsReport> {
        self.get_insights_at(local_now())
    }
}
