//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Track expenses, income, investments and money lent
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Local-first personal finance tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (overrides TALLY_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed the demo account
    Init,

    /// Create a user account
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        password: String,
    },

    /// Check credentials and show the profile
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Change a user's password
    Passwd {
        #[arg(short, long)]
        email: String,

        /// Current password
        #[arg(long)]
        current: String,

        /// New password (at least 6 characters)
        #[arg(long)]
        new: String,
    },

    /// Show or change user settings
    ///
    /// With no change flags, prints the current settings.
    Settings {
        #[arg(short, long)]
        email: String,

        /// Currency code, e.g. INR or USD
        #[arg(long)]
        currency: Option<String>,

        /// Theme: light, dark
        #[arg(long)]
        theme: Option<String>,

        #[arg(long)]
        notifications: Option<bool>,

        #[arg(long)]
        budget_alerts: Option<bool>,

        /// Monthly budget amount, or "none" to clear
        #[arg(long)]
        budget: Option<String>,
    },

    /// Manage expenses
    Expense {
        #[command(subcommand)]
        action: ExpenseAction,
    },

    /// Manage incomes
    Income {
        #[command(subcommand)]
        action: IncomeAction,
    },

    /// Manage investments
    Investment {
        #[command(subcommand)]
        action: InvestmentAction,
    },

    /// Track money lent to others
    Lent {
        #[command(subcommand)]
        action: Option<LentAction>,
    },

    /// Show this month's dashboard
    Dashboard,

    /// Show income and expenses for a month or a week
    Track {
        /// Track the Sunday-to-Saturday week instead of the month
        #[arg(short, long)]
        weekly: bool,

        /// Any day inside the period (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show trends, category comparisons and advisories
    Insights {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export all records to a JSON backup
    Export {
        /// Output file (defaults to tally-backup-YYYY-MM-DD.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Name recorded in the backup
        #[arg(short, long, default_value = "Tally User")]
        user: String,
    },

    /// Import records from a JSON backup
    Import {
        /// Backup file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Delete existing records first
        #[arg(long)]
        replace: bool,
    },

    /// Cloud sync (requires TALLY_CLOUD_SYNC=true and TALLY_SYNC_URL)
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },

    /// Delete a user and all records
    DeleteAccount {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ExpenseAction {
    /// Record an expense
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        amount: String,

        /// Category (e.g. food_dining, groceries, travel)
        #[arg(short, long, default_value = "others")]
        category: String,

        /// Payment method (e.g. cash, upi, credit_card)
        #[arg(short = 'm', long, default_value = "cash")]
        method: String,

        /// Date (YYYY-MM-DD or "YYYY-MM-DD HH:MM", defaults to now)
        #[arg(short, long)]
        date: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// List expenses
    List {
        /// Start date (inclusive)
        #[arg(long)]
        from: Option<String>,

        /// End date (inclusive)
        #[arg(long)]
        to: Option<String>,

        #[arg(short, long)]
        category: Option<String>,
    },

    /// Change an expense
    Update {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        amount: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short = 'm', long)]
        method: Option<String>,

        #[arg(short, long)]
        date: Option<String>,

        /// New description ("" clears it)
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete an expense
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum IncomeAction {
    /// Record an income
    Add {
        #[arg(short, long)]
        source: String,

        #[arg(short, long)]
        amount: String,

        /// Category (e.g. salary, freelance, rental)
        #[arg(short, long, default_value = "salary")]
        category: String,

        #[arg(short, long)]
        date: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// List incomes
    List {
        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,
    },

    /// Change an income
    Update {
        id: i64,

        #[arg(short, long)]
        source: Option<String>,

        #[arg(short, long)]
        amount: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        date: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete an income
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum InvestmentAction {
    /// Record an investment
    Add {
        #[arg(short, long)]
        amount: String,

        /// Type (e.g. stocks, mutual_funds, fixed_deposit, gold)
        #[arg(short = 't', long = "type", default_value = "others")]
        kind: String,

        /// Defaults to "Investment"
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        date: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Expected return, in percent
        #[arg(long)]
        returns: Option<String>,

        /// Risk level: low, medium, high
        #[arg(long)]
        risk: Option<String>,
    },

    /// List investments
    List {
        /// Only this type
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },

    /// Change an investment
    Update {
        id: i64,

        #[arg(short, long)]
        amount: Option<String>,

        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        date: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete an investment
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum LentAction {
    /// Record money lent
    Add {
        /// Borrower
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        amount: String,

        #[arg(short, long)]
        reason: Option<String>,

        /// Date given (defaults to now)
        #[arg(short, long)]
        date: Option<String>,

        #[arg(long)]
        comment: Option<String>,
    },

    /// List loans
    List {
        /// Only this status: pending, returned
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Mark a loan as paid back
    Return {
        id: i64,

        /// Return date (defaults to now)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Reopen a loan
    Pending { id: i64 },

    /// Delete a loan
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum SyncAction {
    /// Upload local records, replacing the remote copy
    Up {
        #[arg(short, long)]
        email: String,
    },

    /// Download remote records, replacing local ones
    Down {
        #[arg(short, long)]
        email: String,
    },

    /// Show remote record count
    Status {
        #[arg(short, long)]
        email: String,
    },
}
