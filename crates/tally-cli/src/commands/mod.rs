//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `backup` - JSON export and import
//! - `core` - Init and shared utilities (open_db, open_sync)
//! - `entries` - Expense, income and investment commands
//! - `lent` - Money lent commands
//! - `reports` - Dashboard and insights
//! - `sync` - Cloud sync (up, down, status)
//! - `users` - Registration, login, password, settings, account deletion

pub mod backup;
pub mod core;
pub mod entries;
pub mod lent;
pub mod reports;
pub mod sync;
pub mod users;

// Re-export command functions for main.rs
pub use backup::*;
pub use core::*;
pub use entries::*;
pub use lent::*;
pub use reports::*;
pub use sync::*;
pub use users::*;

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tally_core::period::{end_of_day, local_now, start_of_day};

/// Bound for an open `--from`/`--to`. Stays within four-digit years so it
/// compares correctly against stored date text.
fn open_bound(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse a positive money amount such as "250" or "1850.50"
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(input.trim().trim_start_matches(['₹', '$']))
        .with_context(|| format!("Invalid amount: {}", input))?;
    if amount <= Decimal::ZERO {
        bail!("Amount must be greater than zero: {}", input);
    }
    Ok(amount)
}

/// Parse `YYYY-MM-DD` (midnight) or `YYYY-MM-DD HH:MM[:SS]`
pub fn parse_date(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(start_of_day)
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {}", input))
}

/// Entry date from an optional argument, defaulting to now
pub fn date_or_now(input: Option<&str>) -> Result<NaiveDateTime> {
    input.map(parse_date).transpose().map(|d| d.unwrap_or_else(local_now))
}

/// Inclusive range from optional `--from`/`--to` dates (whole days)
pub fn parse_range(from: Option<&str>, to: Option<&str>) -> Result<Option<(NaiveDateTime, NaiveDateTime)>> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }

    let start = match from {
        Some(s) => parse_date(s)?,
        None => start_of_day(open_bound(1, 1, 1)),
    };
    let end = match to {
        Some(s) => end_of_day(parse_date(s)?.date()),
        None => end_of_day(open_bound(9999, 12, 31)),
    };
    if start > end {
        bail!("--from must not be after --to");
    }
    Ok(Some((start, end)))
}

/// Parse one of the core enums by its stored name or label
pub fn parse_choice<T: FromStr<Err = String>>(input: &str) -> Result<T> {
    input.parse::<T>().map_err(|e| anyhow!(e))
}

/// Optional text argument where an empty string means "clear"
pub fn clearable(input: Option<String>) -> Option<Option<String>> {
    input.map(|s| if s.trim().is_empty() { None } else { Some(s) })
}
