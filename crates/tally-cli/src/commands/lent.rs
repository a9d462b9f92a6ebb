//! Money lent commands

use anyhow::{Context, Result};
use tally_core::db::Database;
use tally_core::models::{LentMoney, LentStatus, NewLentMoney};

use super::{date_or_now, parse_amount, parse_choice, parse_date, truncate};

fn print_lent(records: &[LentMoney]) {
    println!(
        "{:>5}  {:<20}  {:<10}  {:<10}  {:<9}  {:<24}  {:>12}",
        "ID", "BORROWER", "GIVEN", "RETURNED", "STATUS", "REASON", "AMOUNT"
    );
    println!("{}", "-".repeat(102));
    for l in records {
        println!(
            "{:>5}  {:<20}  {:<10}  {:<10}  {:<9}  {:<24}  {:>12}",
            l.id,
            truncate(&l.name, 20),
            l.given_date.format("%Y-%m-%d"),
            l.return_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
            l.status.label(),
            truncate(l.reason.as_deref().unwrap_or(""), 24),
            l.amount
        );
    }
}

pub fn cmd_lent_add(
    db: &Database,
    name: &str,
    amount: &str,
    reason: Option<String>,
    date: Option<&str>,
    comment: Option<String>,
) -> Result<()> {
    let lent = NewLentMoney {
        name: name.to_string(),
        amount: parse_amount(amount)?,
        reason,
        given_date: date_or_now(date)?,
        return_date: None,
        comment,
        status: LentStatus::Pending,
    };

    let id = db.add_lent_money(&lent).context("Failed to record loan")?;
    println!("✅ Loan {} recorded: {} to {}", id, lent.amount, lent.name.trim());
    Ok(())
}

pub fn cmd_lent_list(db: &Database, status: Option<&str>) -> Result<()> {
    let records = match status {
        Some(status) => db.get_lent_money_by_status(parse_choice(status)?)?,
        None => db.list_lent_money()?,
    };

    if records.is_empty() {
        println!("No loans found");
        return Ok(());
    }

    print_lent(&records);

    let totals = db
        .get_lent_money_totals()
        .context("Failed to total loans")?;
    println!("{}", "-".repeat(102));
    println!(
        "{} loans shown. Pending {} ({}), returned {} ({})",
        records.len(),
        totals.pending,
        totals.pending_count,
        totals.returned,
        totals.returned_count
    );
    Ok(())
}

pub fn cmd_lent_return(db: &Database, id: i64, date: Option<&str>) -> Result<()> {
    let at = date.map(parse_date).transpose()?;
    let lent = db
        .mark_lent_money_returned(id, at)
        .with_context(|| format!("Failed to mark loan {} as returned", id))?;

    println!(
        "✅ Loan {} to {} marked returned",
        lent.id, lent.name
    );
    Ok(())
}

pub fn cmd_lent_pending(db: &Database, id: i64) -> Result<()> {
    let lent = db
        .mark_lent_money_pending(id)
        .with_context(|| format!("Failed to reopen loan {}", id))?;

    println!("✅ Loan {} to {} is pending again", lent.id, lent.name);
    Ok(())
}

pub fn cmd_lent_delete(db: &Database, id: i64) -> Result<()> {
    if db.delete_lent_money(id)? {
        println!("✅ Loan {} deleted", id);
    } else {
        println!("Loan {} not found (nothing deleted)", id);
    }
    Ok(())
}
