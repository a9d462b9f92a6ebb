//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use chrono::{Datelike, NaiveDate};
use rust_decimal_macros::dec;
use tally_core::db::Database;
use tally_core::models::{ExpenseCategory, InvestmentType, LentStatus, PaymentMethod, RiskLevel, Theme};
use tally_core::SyncConfig;

use crate::commands::{self, truncate};

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

fn setup_user(db: &Database) {
    commands::cmd_register(db, "ana@example.com", "Ana", "hunter22").unwrap();
}

// ========== Parsing Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a long expense title", 10), "a long ...");
    assert_eq!(truncate("₹₹₹₹₹₹", 5), "₹₹...");
}

#[test]
fn test_parse_amount() {
    assert_eq!(commands::parse_amount("250").unwrap(), dec!(250));
    assert_eq!(commands::parse_amount(" 1850.50 ").unwrap(), dec!(1850.50));
    assert_eq!(commands::parse_amount("₹99").unwrap(), dec!(99));
    assert!(commands::parse_amount("0").is_err());
    assert!(commands::parse_amount("-5").is_err());
    assert!(commands::parse_amount("lots").is_err());
}

#[test]
fn test_parse_date() {
    let day = commands::parse_date("2024-03-05").unwrap();
    assert_eq!(day.date(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    assert_eq!(day.time(), chrono::NaiveTime::MIN);

    let with_time = commands::parse_date("2024-03-05 14:30").unwrap();
    assert_eq!(with_time.format("%H:%M").to_string(), "14:30");

    assert!(commands::parse_date("05/03/2024").is_err());
}

#[test]
fn test_parse_range() {
    assert!(commands::parse_range(None, None).unwrap().is_none());

    let (start, end) = commands::parse_range(Some("2024-03-01"), Some("2024-03-31"))
        .unwrap()
        .unwrap();
    assert_eq!(start.day(), 1);
    assert_eq!(end.date(), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    assert!(end > commands::parse_date("2024-03-31 23:59").unwrap());

    let (start, _) = commands::parse_range(None, Some("2024-03-31")).unwrap().unwrap();
    assert_eq!(start.year(), 1);

    assert!(commands::parse_range(Some("2024-04-01"), Some("2024-03-01")).is_err());
}

#[test]
fn test_parse_choice() {
    let method: PaymentMethod = commands::parse_choice("credit_card").unwrap();
    assert_eq!(method, PaymentMethod::CreditCard);
    let kind: InvestmentType = commands::parse_choice("crypto").unwrap();
    assert_eq!(kind, InvestmentType::Cryptocurrency);

    let err = commands::parse_choice::<ExpenseCategory>("snacks").unwrap_err();
    assert!(err.to_string().contains("snacks"));
}

#[test]
fn test_clearable() {
    assert_eq!(commands::clearable(None), None);
    assert_eq!(commands::clearable(Some(" ".to_string())), Some(None));
    assert_eq!(
        commands::clearable(Some("note".to_string())),
        Some(Some("note".to_string()))
    );
}

// ========== Init Command Tests ==========

#[test]
fn test_cmd_init_seeds_demo_user() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("tally.db");

    commands::cmd_init(&path).unwrap();
    assert!(path.exists());

    let db = commands::open_db(&path).unwrap();
    assert_eq!(db.list_users().unwrap().len(), 1);

    // Second init leaves users alone
    commands::cmd_init(&path).unwrap();
    assert_eq!(db.list_users().unwrap().len(), 1);
}

// ========== User Command Tests ==========

#[test]
fn test_cmd_register_and_login() {
    let db = setup_test_db();
    setup_user(&db);

    assert!(commands::cmd_login(&db, "ana@example.com", "hunter22").is_ok());
    assert!(commands::cmd_login(&db, "ana@example.com", "nope").is_err());
}

#[test]
fn test_cmd_register_short_password() {
    let db = setup_test_db();
    let result = commands::cmd_register(&db, "ana@example.com", "Ana", "abc");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("at least 6"));
    assert!(db.list_users().unwrap().is_empty());
}

#[test]
fn test_cmd_register_duplicate() {
    let db = setup_test_db();
    setup_user(&db);
    assert!(commands::cmd_register(&db, "ana@example.com", "Other", "secret99").is_err());
}

#[test]
fn test_cmd_passwd() {
    let db = setup_test_db();
    setup_user(&db);

    assert!(commands::cmd_passwd(&db, "ana@example.com", "wrong", "brand-new").is_err());
    commands::cmd_passwd(&db, "ana@example.com", "hunter22", "brand-new").unwrap();
    assert!(db.login_user("ana@example.com", "brand-new").is_ok());
}

#[test]
fn test_cmd_settings() {
    let db = setup_test_db();
    setup_user(&db);

    let args = commands::SettingsArgs {
        currency: Some("usd".to_string()),
        theme: Some("dark".to_string()),
        budget: Some("30000".to_string()),
        ..Default::default()
    };
    commands::cmd_settings(&db, "ana@example.com", args).unwrap();

    let settings = db
        .find_user_by_email("ana@example.com")
        .unwrap()
        .unwrap()
        .settings;
    assert_eq!(settings.currency, "USD");
    assert_eq!(settings.theme, Theme::Dark);
    assert_eq!(settings.monthly_budget, Some(dec!(30000)));

    let clear = commands::SettingsArgs {
        budget: Some("none".to_string()),
        ..Default::default()
    };
    commands::cmd_settings(&db, "ana@example.com", clear).unwrap();
    let settings = db
        .find_user_by_email("ana@example.com")
        .unwrap()
        .unwrap()
        .settings;
    assert!(settings.monthly_budget.is_none());
    assert_eq!(settings.theme, Theme::Dark);

    // Showing only
    assert!(commands::cmd_settings(&db, "ana@example.com", Default::default()).is_ok());
    assert!(commands::cmd_settings(&db, "nobody@example.com", Default::default()).is_err());
}

#[test]
fn test_cmd_delete_account() {
    let db = setup_test_db();
    setup_user(&db);
    commands::cmd_expense_add(&db, "Lunch", "250", "food_dining", "upi", None, None).unwrap();

    assert!(commands::cmd_delete_account(&db, "ana@example.com", "wrong", true).is_err());
    commands::cmd_delete_account(&db, "ana@example.com", "hunter22", true).unwrap();

    assert!(db.list_users().unwrap().is_empty());
    assert!(db.list_expenses().unwrap().is_empty());
}

// ========== Entry Command Tests ==========

#[test]
fn test_cmd_expense_add_and_list() {
    let db = setup_test_db();
    commands::cmd_expense_add(
        &db,
        "Team lunch",
        "1850.50",
        "food_dining",
        "credit_card",
        Some("2024-03-04 13:00"),
        Some("Offsite".to_string()),
    )
    .unwrap();

    let expenses = db.list_expenses().unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].amount, dec!(1850.50));
    assert_eq!(expenses[0].category, ExpenseCategory::FoodDining);
    assert_eq!(expenses[0].payment_method, PaymentMethod::CreditCard);

    assert!(commands::cmd_expense_list(&db, None, None, None).is_ok());
    assert!(commands::cmd_expense_list(&db, Some("2024-03-01"), Some("2024-03-31"), Some("food_dining")).is_ok());
}

#[test]
fn test_cmd_expense_add_rejects_bad_input() {
    let db = setup_test_db();
    assert!(commands::cmd_expense_add(&db, "Lunch", "abc", "others", "cash", None, None).is_err());
    assert!(commands::cmd_expense_add(&db, "Lunch", "10", "snacks", "cash", None, None).is_err());
    assert!(commands::cmd_expense_add(&db, "Lunch", "10", "others", "cheque", None, None).is_err());
    assert!(commands::cmd_expense_add(&db, "  ", "10", "others", "cash", None, None).is_err());
    assert!(db.list_expenses().unwrap().is_empty());
}

#[test]
fn test_cmd_expense_update_and_delete() {
    let db = setup_test_db();
    commands::cmd_expense_add(&db, "Taxi", "300", "transportation", "cash", Some("2024-03-02"), Some("airport".to_string())).unwrap();
    let id = db.list_expenses().unwrap()[0].id;

    let changes = commands::ExpenseChanges {
        amount: Some("320".to_string()),
        description: Some(String::new()),
        ..Default::default()
    };
    commands::cmd_expense_update(&db, id, changes).unwrap();

    let expense = db.get_expense(id).unwrap().unwrap();
    assert_eq!(expense.amount, dec!(320));
    assert!(expense.description.is_none());
    assert_eq!(expense.title, "Taxi");

    assert!(commands::cmd_expense_update(&db, 999, Default::default()).is_err());

    commands::cmd_expense_delete(&db, id).unwrap();
    // Deleting again is not an error
    commands::cmd_expense_delete(&db, id).unwrap();
    assert!(db.list_expenses().unwrap().is_empty());
}

#[test]
fn test_cmd_income_commands() {
    let db = setup_test_db();
    commands::cmd_income_add(&db, "Acme Corp", "60000", "salary", Some("2024-03-01"), None).unwrap();
    let id = db.list_incomes().unwrap()[0].id;

    let changes = commands::IncomeChanges {
        category: Some("business".to_string()),
        ..Default::default()
    };
    commands::cmd_income_update(&db, id, changes).unwrap();
    assert_eq!(
        db.get_income(id).unwrap().unwrap().category.as_str(),
        "business"
    );

    assert!(commands::cmd_income_list(&db, Some("2024-03-01"), None).is_ok());
    commands::cmd_income_delete(&db, id).unwrap();
    assert!(db.list_incomes().unwrap().is_empty());
}

#[test]
fn test_cmd_investment_commands() {
    let db = setup_test_db();
    commands::cmd_investment_add(
        &db,
        commands::InvestmentArgs {
            amount: "25000".to_string(),
            kind: "fixed_deposit".to_string(),
            returns: Some("7.1%".to_string()),
            risk: Some("low".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    let investment = &db.list_investments().unwrap()[0];
    assert_eq!(investment.name, "Investment");
    assert_eq!(investment.investment_type, InvestmentType::FixedDeposit);
    assert_eq!(investment.return_percentage, Some(dec!(7.1)));
    assert_eq!(investment.risk_level, Some(RiskLevel::Low));

    let changes = commands::InvestmentChanges {
        name: Some("Bank FD".to_string()),
        ..Default::default()
    };
    commands::cmd_investment_update(&db, investment.id, changes).unwrap();
    assert_eq!(
        db.get_investment(investment.id).unwrap().unwrap().name,
        "Bank FD"
    );

    assert!(commands::cmd_investment_list(&db, Some("fixed_deposit")).is_ok());
    assert!(commands::cmd_investment_list(&db, Some("tulips")).is_err());
}

// ========== Lent Command Tests ==========

#[test]
fn test_cmd_lent_flow() {
    let db = setup_test_db();
    commands::cmd_lent_add(&db, "Alice", "1200", Some("Concert".to_string()), Some("2024-03-02"), None).unwrap();
    let id = db.list_lent_money().unwrap()[0].id;

    commands::cmd_lent_return(&db, id, Some("2024-03-20")).unwrap();
    let lent = db.get_lent_money(id).unwrap().unwrap();
    assert_eq!(lent.status, LentStatus::Returned);
    assert_eq!(
        lent.return_date.unwrap().date(),
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
    );

    commands::cmd_lent_pending(&db, id).unwrap();
    let lent = db.get_lent_money(id).unwrap().unwrap();
    assert_eq!(lent.status, LentStatus::Pending);
    assert!(lent.return_date.is_some());

    assert!(commands::cmd_lent_list(&db, Some("pending")).is_ok());
    assert!(commands::cmd_lent_list(&db, Some("lost")).is_err());
    assert!(commands::cmd_lent_return(&db, 999, None).is_err());

    commands::cmd_lent_delete(&db, id).unwrap();
    assert!(db.list_lent_money().unwrap().is_empty());
}

// ========== Report Command Tests ==========

#[test]
fn test_cmd_reports_on_empty_db() {
    let db = setup_test_db();
    assert!(commands::cmd_dashboard(&db).is_ok());
    assert!(commands::cmd_insights(&db, false).is_ok());
    assert!(commands::cmd_insights(&db, true).is_ok());
    assert!(commands::cmd_tracking(&db, false, None, false).is_ok());
    assert!(commands::cmd_tracking(&db, true, None, true).is_ok());
}

#[test]
fn test_cmd_tracking_for_given_day() {
    let db = setup_test_db();
    commands::cmd_expense_add(&db, "Taxi", "18.40", "travel", "cash", Some("2024-03-13"), None).unwrap();
    assert!(commands::cmd_tracking(&db, true, Some("2024-03-15"), false).is_ok());
    assert!(commands::cmd_tracking(&db, false, Some("2024-03-15"), true).is_ok());
    assert!(commands::cmd_tracking(&db, false, Some("15/03/2024"), false).is_err());
}

#[test]
fn test_cmd_reports_with_data() {
    let db = setup_test_db();
    commands::cmd_expense_add(&db, "Groceries", "2000", "groceries", "upi", None, None).unwrap();
    commands::cmd_income_add(&db, "Acme Corp", "1000", "salary", None, None).unwrap();
    assert!(commands::cmd_dashboard(&db).is_ok());
    assert!(commands::cmd_insights(&db, false).is_ok());
}

// ========== Backup Command Tests ==========

#[test]
fn test_cmd_export_import() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("backup.json");

    let source = setup_test_db();
    commands::cmd_expense_add(&source, "Lunch", "250", "food_dining", "upi", Some("2024-03-04"), None).unwrap();
    commands::cmd_lent_add(&source, "Alice", "100", None, Some("2024-03-02"), None).unwrap();

    let written = commands::cmd_export(&source, Some(file.clone()), "Ana").unwrap();
    assert_eq!(written, file);
    assert!(file.exists());

    let target = setup_test_db();
    commands::cmd_expense_add(&target, "Old", "1", "others", "cash", None, None).unwrap();

    commands::cmd_import(&target, &file, false).unwrap();
    assert_eq!(target.list_expenses().unwrap().len(), 2);

    commands::cmd_import(&target, &file, true).unwrap();
    let expenses = target.list_expenses().unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].title, "Lunch");
    assert_eq!(target.list_lent_money().unwrap().len(), 1);
}

#[test]
fn test_cmd_import_missing_file() {
    let db = setup_test_db();
    let result = commands::cmd_import(&db, std::path::Path::new("/nonexistent/backup.json"), false);
    assert!(result.is_err());
}

// ========== Sync Command Tests ==========

#[tokio::test]
async fn test_cmd_sync_disabled() {
    let db = setup_test_db();
    let sync = commands::open_sync(&db, SyncConfig::default()).unwrap();

    let result = commands::cmd_sync_up(&sync, "ana@example.com").await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("disabled"));

    assert!(commands::cmd_sync_status(&sync, "ana@example.com").await.is_ok());
}

#[test]
fn test_open_sync_requires_gateway_when_enabled() {
    let db = setup_test_db();
    assert!(commands::open_sync(&db, SyncConfig::enabled()).is_err());

    let config = SyncConfig {
        url: Some("http://localhost:8787".to_string()),
        ..SyncConfig::enabled()
    };
    let sync = commands::open_sync(&db, config).unwrap();
    assert_eq!(sync.remote_name(), "http");
}
