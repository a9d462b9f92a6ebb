//! Tally CLI - Personal finance tracker
//!
//! Usage:
//!   tally init                                   Initialize database
//!   tally expense add -t Lunch -a 250 -c food_dining
//!   tally dashboard                              This month at a glance
//!   tally sync up -e you@example.com             Upload to the cloud gateway

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tally_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = Config::from_env();
    let db_path = cli.db.clone().unwrap_or(config.db_path);

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path),
        Commands::Register {
            email,
            name,
            password,
        } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_register(&db, &email, &name, &password)
        }
        Commands::Login { email, password } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_login(&db, &email, &password)
        }
        Commands::Passwd {
            email,
            current,
            new,
        } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_passwd(&db, &email, &current, &new)
        }
        Commands::Settings {
            email,
            currency,
            theme,
            notifications,
            budget_alerts,
            budget,
        } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_settings(
                &db,
                &email,
                commands::SettingsArgs {
                    currency,
                    theme,
                    notifications,
                    budget_alerts,
                    budget,
                },
            )
        }
        Commands::Expense { action } => {
            let db = commands::open_db(&db_path)?;
            match action {
                ExpenseAction::Add {
                    title,
                    amount,
                    category,
                    method,
                    date,
                    description,
                } => commands::cmd_expense_add(
                    &db,
                    &title,
                    &amount,
                    &category,
                    &method,
                    date.as_deref(),
                    description,
                ),
                ExpenseAction::List { from, to, category } => commands::cmd_expense_list(
                    &db,
                    from.as_deref(),
                    to.as_deref(),
                    category.as_deref(),
                ),
                ExpenseAction::Update {
                    id,
                    title,
                    amount,
                    category,
                    method,
                    date,
                    description,
                } => commands::cmd_expense_update(
                    &db,
                    id,
                    commands::ExpenseChanges {
                        title,
                        amount,
                        category,
                        method,
                        date,
                        description,
                    },
                ),
                ExpenseAction::Delete { id } => commands::cmd_expense_delete(&db, id),
            }
        }
        Commands::Income { action } => {
            let db = commands::open_db(&db_path)?;
            match action {
                IncomeAction::Add {
                    source,
                    amount,
                    category,
                    date,
                    description,
                } => commands::cmd_income_add(
                    &db,
                    &source,
                    &amount,
                    &category,
                    date.as_deref(),
                    description,
                ),
                IncomeAction::List { from, to } => {
                    commands::cmd_income_list(&db, from.as_deref(), to.as_deref())
                }
                IncomeAction::Update {
                    id,
                    source,
                    amount,
                    category,
                    date,
                    description,
                } => commands::cmd_income_update(
                    &db,
                    id,
                    commands::IncomeChanges {
                        source,
                        amount,
                        category,
                        date,
                        description,
                    },
                ),
                IncomeAction::Delete { id } => commands::cmd_income_delete(&db, id),
            }
        }
        Commands::Investment { action } => {
            let db = commands::open_db(&db_path)?;
            match action {
                InvestmentAction::Add {
                    amount,
                    kind,
                    name,
                    date,
                    description,
                    returns,
                    risk,
                } => commands::cmd_investment_add(
                    &db,
                    commands::InvestmentArgs {
                        amount,
                        kind,
                        name,
                        date,
                        description,
                        returns,
                        risk,
                    },
                ),
                InvestmentAction::List { kind } => {
                    commands::cmd_investment_list(&db, kind.as_deref())
                }
                InvestmentAction::Update {
                    id,
                    amount,
                    kind,
                    name,
                    date,
                    description,
                } => commands::cmd_investment_update(
                    &db,
                    id,
                    commands::InvestmentChanges {
                        amount,
                        kind,
                        name,
                        date,
                        description,
                    },
                ),
                InvestmentAction::Delete { id } => commands::cmd_investment_delete(&db, id),
            }
        }
        Commands::Lent { action } => {
            let db = commands::open_db(&db_path)?;
            match action {
                None => commands::cmd_lent_list(&db, None),
                Some(LentAction::List { status }) => {
                    commands::cmd_lent_list(&db, status.as_deref())
                }
                Some(LentAction::Add {
                    name,
                    amount,
                    reason,
                    date,
                    comment,
                }) => commands::cmd_lent_add(&db, &name, &amount, reason, date.as_deref(), comment),
                Some(LentAction::Return { id, date }) => {
                    commands::cmd_lent_return(&db, id, date.as_deref())
                }
                Some(LentAction::Pending { id }) => commands::cmd_lent_pending(&db, id),
                Some(LentAction::Delete { id }) => commands::cmd_lent_delete(&db, id),
            }
        }
        Commands::Dashboard => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_dashboard(&db)
        }
        Commands::Track { weekly, date, json } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_tracking(&db, weekly, date.as_deref(), json)
        }
        Commands::Insights { json } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_insights(&db, json)
        }
        Commands::Export { output, user } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_export(&db, output, &user)?;
            Ok(())
        }
        Commands::Import { file, replace } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_import(&db, &file, replace)
        }
        Commands::Sync { action } => {
            let db = commands::open_db(&db_path)?;
            let sync = commands::open_sync(&db, config.sync)?;
            match action {
                SyncAction::Up { email } => commands::cmd_sync_up(&sync, &email).await,
                SyncAction::Down { email } => commands::cmd_sync_down(&sync, &email).await,
                SyncAction::Status { email } => commands::cmd_sync_status(&sync, &email).await,
            }
        }
        Commands::DeleteAccount {
            email,
            password,
            yes,
        } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_delete_account(&db, &email, &password, yes)
        }
    }
}
