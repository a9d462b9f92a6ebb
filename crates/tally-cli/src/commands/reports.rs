//! Dashboard, tracking and insights commands

use anyhow::{Context, Result};
use tally_core::db::Database;
use tally_core::insights::{InsightsReport, Severity, TrackingReport, TrackingView};

use super::date_or_now;

pub fn cmd_dashboard(db: &Database) -> Result<()> {
    let stats = db
        .get_dashboard_stats()
        .context("Failed to compute dashboard")?;

    println!();
    println!("📊 This Month");
    println!("   ─────────────────────────────");
    println!("   Expenses:            {:>14}", stats.monthly_expenses);
    println!("   Today:               {:>14}", stats.daily_expenses);
    println!("   Income:              {:>14}", stats.monthly_income);
    println!("   Balance:             {:>14}", stats.current_balance);
    println!("   Credit card:         {:>14}", stats.credit_card_spending);
    println!();
    println!("   Total investments:   {:>14}", stats.total_investments);

    if stats.current_balance.is_sign_negative() {
        println!();
        println!("⚠️  Spending exceeds income this month");
    }

    Ok(())
}

pub fn cmd_tracking(db: &Database, weekly: bool, date: Option<&str>, json: bool) -> Result<()> {
    let view = if weekly {
        TrackingView::Weekly
    } else {
        TrackingView::Monthly
    };
    let now = date_or_now(date)?;

    let report = db
        .get_tracking_at(now, view)
        .context("Failed to compute tracking")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_tracking(&report);
    Ok(())
}

fn print_tracking(report: &TrackingReport) {
    let title = match report.view {
        TrackingView::Monthly => report.start.format("%B %Y").to_string(),
        TrackingView::Weekly => format!(
            "Week of {} - {}",
            report.start.format("%b %-d"),
            report.end.format("%b %-d, %Y")
        ),
    };

    println!();
    println!("🗓️  {}", title);
    println!("   ─────────────────────────────");
    println!("   Income:              {:>14}", report.total_income);
    println!("   Expenses:            {:>14}", report.total_expenses);
    println!("   Net:                 {:>14}", report.net);

    println!();
    println!("   {:<10} {:>12} {:>12}", "PERIOD", "INCOME", "EXPENSES");
    for point in &report.trend {
        println!(
            "   {:<10} {:>12} {:>12}",
            point.label, point.income, point.expenses
        );
    }

    if !report.categories.is_empty() {
        println!();
        println!("🏷️  By Category");
        for category in &report.categories {
            println!("   {:<20} {:>12}", category.label, category.amount);
        }
    }
}

pub fn cmd_insights(db: &Database, json: bool) -> Result<()> {
    let report = db.get_insights().context("Failed to compute insights")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &InsightsReport) {
    println!();
    println!("📈 Monthly Trend");
    println!(
        "   {:<10} {:>12} {:>12} {:>12}",
        "MONTH", "INCOME", "EXPENSES", "SAVINGS"
    );
    for trend in &report.trends {
        println!(
            "   {:<10} {:>12} {:>12} {:>12}",
            trend.month, trend.income, trend.expenses, trend.savings
        );
    }
    println!("   Savings rate this month: {}%", report.savings_rate);

    let metrics = &report.metrics;
    println!();
    println!("🔢 Metrics");
    println!("   Avg daily expense:   {}", metrics.avg_daily_expense);
    println!("   Income this month:   {}", metrics.avg_monthly_income);
    println!("   Invested (6 months): {}", metrics.total_investments);
    println!("   Expense growth:      {}%", metrics.expense_growth);
    println!("   Income growth:       {}%", metrics.income_growth);

    if !report.top_categories.is_empty() {
        println!();
        println!("🏷️  Top Categories");
        for share in &report.top_categories {
            println!(
                "   {:<20} {:>12} {:>7}%",
                share.label, share.amount, share.percentage
            );
        }
    }

    if !report.category_spending.is_empty() {
        println!();
        println!("📅 This Month vs Last Month");
        for c in &report.category_spending {
            println!(
                "   {:<20} {:>12} {:>12}",
                c.label, c.this_month, c.last_month
            );
        }
    }

    if !report.advisories.is_empty() {
        println!();
        println!("💡 Advisories");
        for advisory in &report.advisories {
            let icon = match advisory.severity() {
                Severity::Warning => "⚠️ ",
                Severity::Info => "ℹ️ ",
            };
            println!("   {} {}: {}", icon, advisory.title(), advisory.message());
        }
    }
}
