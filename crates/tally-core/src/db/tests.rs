//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::export::ImportMode;
    use crate::insights::{LentTotals, TrackingView};
    use chrono::{NaiveDate, NaiveDateTime, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn new_expense(date: NaiveDateTime, amount: Decimal, method: PaymentMethod) -> NewExpense {
        NewExpense {
            date,
            payment_method: method,
            title: "Groceries run".to_string(),
            description: Some("weekly".to_string()),
            amount,
            category: ExpenseCategory::Groceries,
        }
    }

    fn new_income(date: NaiveDateTime, amount: Decimal) -> NewIncome {
        NewIncome {
            date,
            source: "Acme Corp".to_string(),
            description: None,
            amount,
            category: IncomeCategory::Salary,
        }
    }

    fn new_investment(date: NaiveDateTime, amount: Decimal) -> NewInvestment {
        NewInvestment {
            date,
            name: Some("Index fund".to_string()),
            investment_type: InvestmentType::MutualFunds,
            amount,
            description: None,
            return_percentage: Some(dec!(12.5)),
            risk_level: Some(RiskLevel::Medium),
        }
    }

    fn new_lent(name: &str, amount: Decimal) -> NewLentMoney {
        NewLentMoney {
            name: name.to_string(),
            amount,
            reason: Some("Rent shortfall".to_string()),
            given_date: at(2024, 3, 1, 9),
            return_date: None,
            comment: None,
            status: LentStatus::Pending,
        }
    }

    fn new_user(email: &str, name: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "hunter22".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert!(db.list_expenses().unwrap().is_empty());
        assert!(db.list_users().unwrap().is_empty());
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_schema_tables_exist() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        for table in ["users", "expenses", "incomes", "investments", "lent_money"] {
            let found: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(found, 1, "missing table {}", table);
        }
    }

    #[test]
    fn test_expense_add_get_roundtrip() {
        let db = Database::in_memory().unwrap();
        let input = new_expense(at(2024, 3, 10, 14), dec!(249.99), PaymentMethod::Upi);

        let id = db.add_expense(&input).unwrap();
        assert!(id > 0);

        let stored = db.get_expense(id).unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.date, input.date);
        assert_eq!(stored.payment_method, PaymentMethod::Upi);
        assert_eq!(stored.title, "Groceries run");
        assert_eq!(stored.description.as_deref(), Some("weekly"));
        assert_eq!(stored.amount, dec!(249.99));
        assert_eq!(stored.category, ExpenseCategory::Groceries);
        assert_eq!(stored.created_at, stored.updated_at);

        assert!(db.get_expense(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_expense_validation() {
        let db = Database::in_memory().unwrap();

        let zero = new_expense(at(2024, 3, 10, 14), Decimal::ZERO, PaymentMethod::Cash);
        assert!(matches!(db.add_expense(&zero), Err(Error::Validation(_))));

        let mut blank = new_expense(at(2024, 3, 10, 14), dec!(10), PaymentMethod::Cash);
        blank.title = "   ".to_string();
        assert!(matches!(db.add_expense(&blank), Err(Error::Validation(_))));

        assert!(db.list_expenses().unwrap().is_empty());
    }

    #[test]
    fn test_blank_description_stored_as_none() {
        let db = Database::in_memory().unwrap();
        let mut input = new_expense(at(2024, 3, 10, 14), dec!(10), PaymentMethod::Cash);
        input.title = "  Coffee  ".to_string();
        input.description = Some("  ".to_string());

        let id = db.add_expense(&input).unwrap();
        let stored = db.get_expense(id).unwrap().unwrap();
        assert_eq!(stored.title, "Coffee");
        assert!(stored.description.is_none());
    }

    #[test]
    fn test_update_expense_advances_updated_at() {
        let db = Database::in_memory().unwrap();
        let id = db
            .add_expense(&new_expense(at(2024, 3, 10, 14), dec!(100), PaymentMethod::Cash))
            .unwrap();
        let before = db.get_expense(id).unwrap().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));

        let patch = ExpensePatch {
            amount: Some(dec!(120.50)),
            description: Some(None),
            ..Default::default()
        };
        let updated = db.update_expense(id, &patch).unwrap();

        assert_eq!(updated.amount, dec!(120.50));
        assert!(updated.description.is_none());
        assert_eq!(updated.title, before.title);
        assert_eq!(updated.created_at, before.created_at);
        assert!(updated.updated_at > before.updated_at);

        // What was returned is what was stored
        assert_eq!(db.get_expense(id).unwrap().unwrap(), updated);
    }

    #[test]
    fn test_update_missing_record_is_not_found() {
        let db = Database::in_memory().unwrap();
        let patch = IncomePatch {
            amount: Some(dec!(1)),
            ..Default::default()
        };
        assert!(matches!(
            db.update_income(42, &patch),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_update_rejects_invalid_patch() {
        let db = Database::in_memory().unwrap();
        let id = db
            .add_income(&new_income(at(2024, 3, 1, 9), dec!(1000)))
            .unwrap();

        let patch = IncomePatch {
            amount: Some(dec!(-5)),
            ..Default::default()
        };
        assert!(matches!(
            db.update_income(id, &patch),
            Err(Error::Validation(_))
        ));
        assert_eq!(db.get_income(id).unwrap().unwrap().amount, dec!(1000));
    }

    #[test]
    fn test_sub_cent_amount_is_a_validation_error() {
        let db = Database::in_memory().unwrap();

        let tiny = new_expense(at(2024, 3, 10, 14), dec!(0.004), PaymentMethod::Cash);
        assert!(matches!(db.add_expense(&tiny), Err(Error::Validation(_))));
        assert!(matches!(
            db.add_income(&new_income(at(2024, 3, 1, 9), dec!(0.001))),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            db.add_lent_money(&new_lent("Alice", dec!(0.004))),
            Err(Error::Validation(_))
        ));

        let id = db
            .add_expense(&new_expense(at(2024, 3, 10, 14), dec!(5), PaymentMethod::Cash))
            .unwrap();
        let patch = ExpensePatch {
            amount: Some(dec!(0.001)),
            ..Default::default()
        };
        assert!(matches!(
            db.update_expense(id, &patch),
            Err(Error::Validation(_))
        ));
        assert_eq!(db.get_expense(id).unwrap().unwrap().amount, dec!(5));

        // Half a cent rounds to even, which is still zero
        let half = new_expense(at(2024, 3, 10, 14), dec!(0.005), PaymentMethod::Cash);
        assert!(matches!(db.add_expense(&half), Err(Error::Validation(_))));
        assert_eq!(db.list_expenses().unwrap().len(), 1);
    }

    #[test]
    fn test_amounts_are_kept_to_cents() {
        let db = Database::in_memory().unwrap();

        let id = db
            .add_expense(&new_expense(at(2024, 3, 10, 14), dec!(12.345), PaymentMethod::Cash))
            .unwrap();
        assert_eq!(db.get_expense(id).unwrap().unwrap().amount, dec!(12.34));

        let patch = ExpensePatch {
            amount: Some(dec!(7.777)),
            ..Default::default()
        };
        let updated = db.update_expense(id, &patch).unwrap();
        assert_eq!(updated.amount, dec!(7.78));
        assert_eq!(db.get_expense(id).unwrap().unwrap(), updated);

        let inv = db
            .add_investment(&new_investment(at(2024, 3, 1, 9), dec!(100)))
            .unwrap();
        let patch = InvestmentPatch {
            amount: Some(dec!(99.999)),
            ..Default::default()
        };
        let updated = db.update_investment(inv, &patch).unwrap();
        assert_eq!(updated.amount, dec!(100.00));
        assert_eq!(db.get_investment(inv).unwrap().unwrap(), updated);

        let lent = db.add_lent_money(&new_lent("Bob", dec!(10))).unwrap();
        let patch = LentMoneyPatch {
            amount: Some(dec!(20.125)),
            ..Default::default()
        };
        let updated = db.update_lent_money(lent, &patch).unwrap();
        assert_eq!(updated.amount, dec!(20.12));
        assert_eq!(db.get_lent_money(lent).unwrap().unwrap(), updated);
    }

    #[test]
    fn test_check_constraint_maps_to_constraint_error() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        let err = conn
            .execute(
                "INSERT INTO expenses (date, payment_method, title, amount, category, created_at, updated_at)
                 VALUES ('2024-03-01 00:00:00.000', 'cash', 'Zero', 0, 'others', 'x', 'x')",
                [],
            )
            .map_err(|e| Error::from_write(e, "expense"))
            .unwrap_err();
        assert!(matches!(err, Error::Constraint(_)));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let id = db
            .add_income(&new_income(at(2024, 3, 1, 9), dec!(1000)))
            .unwrap();

        assert!(db.delete_income(id).unwrap());
        assert!(!db.delete_income(id).unwrap());
        assert!(!db.delete_expense(9999).unwrap());
        assert!(db.get_income(id).unwrap().is_none());
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let db = Database::in_memory().unwrap();
        let start = at(2024, 3, 1, 0);
        let end = at(2024, 3, 31, 23);

        let first = db
            .add_expense(&new_expense(start, dec!(10), PaymentMethod::Cash))
            .unwrap();
        let last = db
            .add_expense(&new_expense(end, dec!(20), PaymentMethod::Cash))
            .unwrap();
        db.add_expense(&new_expense(at(2024, 2, 29, 23), dec!(30), PaymentMethod::Cash))
            .unwrap();
        db.add_expense(&new_expense(at(2024, 4, 1, 0), dec!(40), PaymentMethod::Cash))
            .unwrap();

        let found = db.get_expenses_by_date_range(start, end).unwrap();
        let ids: Vec<i64> = found.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![first, last]);
    }

    #[test]
    fn test_range_results_ordered_by_date() {
        let db = Database::in_memory().unwrap();
        let late = db
            .add_income(&new_income(at(2024, 3, 20, 9), dec!(10)))
            .unwrap();
        let early = db
            .add_income(&new_income(at(2024, 3, 2, 9), dec!(10)))
            .unwrap();

        let found = db
            .get_incomes_by_date_range(at(2024, 3, 1, 0), at(2024, 3, 31, 0))
            .unwrap();
        assert_eq!(found.iter().map(|i| i.id).collect::<Vec<_>>(), vec![early, late]);
    }

    #[test]
    fn test_equal_queries() {
        let db = Database::in_memory().unwrap();
        db.add_expense(&new_expense(at(2024, 3, 1, 9), dec!(10), PaymentMethod::CreditCard))
            .unwrap();
        db.add_expense(&new_expense(at(2024, 3, 2, 9), dec!(20), PaymentMethod::Cash))
            .unwrap();

        let cards = db
            .get_expenses_by_payment_method(PaymentMethod::CreditCard)
            .unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].amount, dec!(10));

        let groceries = db
            .get_expenses_by_category(ExpenseCategory::Groceries)
            .unwrap();
        assert_eq!(groceries.len(), 2);
        assert!(db
            .get_expenses_by_category(ExpenseCategory::Travel)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unindexed_field_is_invalid_data() {
        let db = Database::in_memory().unwrap();

        // Field of another table
        let result = db.equal::<Expense>(IndexedField::INCOME_CATEGORY, "salary");
        assert!(matches!(result, Err(Error::InvalidData(_))));

        // Column that is not indexed
        let title = IndexedField {
            table: Table::Expenses,
            column: "title",
        };
        let result = db.equal::<Expense>(title, "Coffee");
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_amount_range_query() {
        let db = Database::in_memory().unwrap();
        for amount in [dec!(5), dec!(50), dec!(500)] {
            db.add_expense(&new_expense(at(2024, 3, 1, 9), amount, PaymentMethod::Cash))
                .unwrap();
        }

        let mid: Vec<Expense> = db
            .range(IndexedField::EXPENSE_AMOUNT, dec!(10), dec!(500))
            .unwrap();
        assert_eq!(
            mid.iter().map(|e| e.amount).collect::<Vec<_>>(),
            vec![dec!(50), dec!(500)]
        );
    }

    #[test]
    fn test_investments() {
        let db = Database::in_memory().unwrap();

        let mut unnamed = new_investment(at(2024, 1, 5, 9), dec!(2000));
        unnamed.name = None;
        unnamed.investment_type = InvestmentType::Gold;
        let gold = db.add_investment(&unnamed).unwrap();
        db.add_investment(&new_investment(at(2024, 2, 5, 9), dec!(3000.25)))
            .unwrap();

        let stored = db.get_investment(gold).unwrap().unwrap();
        assert_eq!(stored.name, DEFAULT_INVESTMENT_NAME);
        assert_eq!(stored.return_percentage, Some(dec!(12.5)));

        assert_eq!(db.total_investments().unwrap(), dec!(5000.25));
        assert_eq!(
            db.get_investments_by_type(InvestmentType::Gold)
                .unwrap()
                .len(),
            1
        );

        let patch = InvestmentPatch {
            risk_level: Some(None),
            return_percentage: Some(Some(dec!(8))),
            ..Default::default()
        };
        let updated = db.update_investment(gold, &patch).unwrap();
        assert!(updated.risk_level.is_none());
        assert_eq!(updated.return_percentage, Some(dec!(8)));
    }

    #[test]
    fn test_total_investments_empty() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.total_investments().unwrap(), Decimal::ZERO);
    }

    // =========================================================================
    // Lent money
    // =========================================================================

    #[test]
    fn test_lent_money_status_flow() {
        let db = Database::in_memory().unwrap();
        let alice = db.add_lent_money(&new_lent("Alice", dec!(1000))).unwrap();
        db.add_lent_money(&new_lent("Bob", dec!(250))).unwrap();

        let pending = db.get_lent_money_by_status(LentStatus::Pending).unwrap();
        assert_eq!(pending.len(), 2);

        let returned_at = at(2024, 3, 20, 18);
        let lent = db
            .mark_lent_money_returned(alice, Some(returned_at))
            .unwrap();
        assert_eq!(lent.status, LentStatus::Returned);
        assert_eq!(lent.return_date, Some(returned_at));

        let returned = db.get_lent_money_by_status(LentStatus::Returned).unwrap();
        assert_eq!(returned.len(), 1);
        assert_eq!(returned[0].name, "Alice");

        // Reopening keeps the recorded return date
        let reopened = db.mark_lent_money_pending(alice).unwrap();
        assert_eq!(reopened.status, LentStatus::Pending);
        assert_eq!(reopened.return_date, Some(returned_at));
        assert_eq!(
            db.get_lent_money_by_status(LentStatus::Pending)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_returned_without_date_gets_now() {
        let db = Database::in_memory().unwrap();
        let id = db.add_lent_money(&new_lent("Carol", dec!(75))).unwrap();

        let now = at(2024, 4, 2, 12);
        let patch = LentMoneyPatch {
            status: Some(LentStatus::Returned),
            ..Default::default()
        };
        let lent = db.update_lent_money_at(id, &patch, now).unwrap();
        assert_eq!(lent.return_date, Some(now));

        // Inserted already returned
        let mut settled = new_lent("Dan", dec!(30));
        settled.status = LentStatus::Returned;
        let id = db.add_lent_money(&settled).unwrap();
        assert!(db.get_lent_money(id).unwrap().unwrap().return_date.is_some());
    }

    #[test]
    fn test_lent_money_by_borrower_and_given_date() {
        let db = Database::in_memory().unwrap();
        db.add_lent_money(&new_lent("Alice", dec!(10))).unwrap();
        db.add_lent_money(&new_lent("Alice", dec!(20))).unwrap();
        let mut later = new_lent("Bob", dec!(30));
        later.given_date = at(2024, 5, 1, 9);
        db.add_lent_money(&later).unwrap();

        assert_eq!(db.get_lent_money_by_borrower(" Alice ").unwrap().len(), 2);
        let march = db
            .get_lent_money_by_date_range(at(2024, 3, 1, 0), at(2024, 3, 31, 23))
            .unwrap();
        assert_eq!(march.len(), 2);
    }

    #[test]
    fn test_lent_money_totals() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.get_lent_money_totals().unwrap(), LentTotals::default());

        let id = db.add_lent_money(&new_lent("Alice", dec!(120.50))).unwrap();
        db.add_lent_money(&new_lent("Bob", dec!(80))).unwrap();
        db.add_lent_money(&new_lent("Cara", dec!(45))).unwrap();
        db.mark_lent_money_returned(id, Some(at(2024, 3, 20, 9)))
            .unwrap();

        let totals = db.get_lent_money_totals().unwrap();
        assert_eq!(totals.pending, dec!(125));
        assert_eq!(totals.pending_count, 2);
        assert_eq!(totals.returned, dec!(120.50));
        assert_eq!(totals.returned_count, 1);
    }

    // =========================================================================
    // Dashboard and insights
    // =========================================================================

    #[test]
    fn test_empty_dashboard_is_zero() {
        let db = Database::in_memory().unwrap();
        let stats = db.get_dashboard_stats_at(at(2024, 3, 15, 12)).unwrap();
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn test_dashboard_stats() {
        let db = Database::in_memory().unwrap();
        let now = at(2024, 3, 15, 12);

        db.add_expense(&new_expense(at(2024, 3, 15, 10), dec!(500), PaymentMethod::CreditCard))
            .unwrap();
        db.add_income(&new_income(at(2024, 3, 1, 9), dec!(2000)))
            .unwrap();
        // Outside the month: ignored by monthly numbers
        db.add_expense(&new_expense(at(2024, 2, 28, 10), dec!(300), PaymentMethod::CreditCard))
            .unwrap();
        db.add_income(&new_income(at(2024, 4, 1, 9), dec!(999)))
            .unwrap();
        // Investments are all-time
        db.add_investment(&new_investment(at(2023, 6, 1, 9), dec!(1000)))
            .unwrap();

        let stats = db.get_dashboard_stats_at(now).unwrap();
        assert_eq!(stats.monthly_expenses, dec!(500));
        assert_eq!(stats.daily_expenses, dec!(500));
        assert_eq!(stats.monthly_income, dec!(2000));
        assert_eq!(stats.current_balance, dec!(1500));
        assert_eq!(stats.total_investments, dec!(1000));
        assert_eq!(stats.credit_card_spending, dec!(500));
    }

    #[test]
    fn test_dashboard_daily_excludes_other_days() {
        let db = Database::in_memory().unwrap();
        db.add_expense(&new_expense(at(2024, 3, 14, 23), dec!(70), PaymentMethod::Cash))
            .unwrap();
        db.add_expense(&new_expense(at(2024, 3, 15, 0), dec!(30), PaymentMethod::Cash))
            .unwrap();

        let stats = db.get_dashboard_stats_at(at(2024, 3, 15, 12)).unwrap();
        assert_eq!(stats.monthly_expenses, dec!(100));
        assert_eq!(stats.daily_expenses, dec!(30));
        assert_eq!(stats.current_balance, dec!(-100));
        assert_eq!(stats.credit_card_spending, Decimal::ZERO);
    }

    #[test]
    fn test_insights_report() {
        let db = Database::in_memory().unwrap();
        let now = at(2024, 3, 15, 12);

        db.add_expense(&new_expense(at(2024, 3, 5, 10), dec!(1200), PaymentMethod::Upi))
            .unwrap();
        db.add_expense(&new_expense(at(2024, 2, 5, 10), dec!(1000), PaymentMethod::Upi))
            .unwrap();
        db.add_income(&new_income(at(2024, 3, 1, 9), dec!(1400)))
            .unwrap();
        // Before the six-month window
        db.add_expense(&new_expense(at(2023, 9, 30, 10), dec!(5000), PaymentMethod::Upi))
            .unwrap();

        let report = db.get_insights_at(now).unwrap();
        assert_eq!(report.generated_at, now);
        assert_eq!(report.trends.len(), 6);
        assert_eq!(report.trends[0].start, NaiveDate::from_ymd_opt(2023, 10, 1).unwrap());
        assert_eq!(report.trends[5].expenses, dec!(1200));
        assert_eq!(report.trends[5].savings, dec!(200));
        assert_eq!(report.savings_rate, dec!(14.29));
        assert_eq!(report.metrics.expense_growth, dec!(20));

        // Low savings and rising expenses, plus the biggest day
        assert_eq!(report.advisories.len(), 3);

        assert_eq!(report.top_categories.len(), 1);
        assert_eq!(report.top_categories[0].category, ExpenseCategory::Groceries);
    }

    #[test]
    fn test_tracking_month_and_week() {
        let db = Database::in_memory().unwrap();
        // Friday; its week runs Sun Mar 10 to Sat Mar 16
        let now = at(2024, 3, 15, 12);

        db.add_expense(&new_expense(at(2024, 3, 2, 10), dec!(40), PaymentMethod::Cash))
            .unwrap();
        db.add_expense(&new_expense(at(2024, 3, 11, 10), dec!(60), PaymentMethod::Cash))
            .unwrap();
        db.add_expense(&new_expense(at(2024, 3, 16, 23), dec!(15), PaymentMethod::Cash))
            .unwrap();
        db.add_income(&new_income(at(2024, 3, 1, 9), dec!(900)))
            .unwrap();
        // Previous month
        db.add_expense(&new_expense(at(2024, 2, 29, 10), dec!(500), PaymentMethod::Cash))
            .unwrap();

        let month = db.get_tracking_at(now, TrackingView::Monthly).unwrap();
        assert_eq!(month.total_expenses, dec!(115));
        assert_eq!(month.total_income, dec!(900));
        assert_eq!(month.net, dec!(785));
        assert_eq!(month.categories.len(), 1);
        assert_eq!(month.categories[0].amount, dec!(115));
        assert_eq!(month.trend[0].expenses, dec!(40));
        assert_eq!(month.trend[1].expenses, dec!(60));
        assert_eq!(month.trend[2].expenses, dec!(15));

        let week = db.get_tracking_at(now, TrackingView::Weekly).unwrap();
        assert_eq!(week.start, at(2024, 3, 10, 0));
        assert_eq!(week.total_expenses, dec!(75));
        assert_eq!(week.total_income, Decimal::ZERO);
        assert_eq!(week.trend[1].label, "Mon");
        assert_eq!(week.trend[1].expenses, dec!(60));
        assert_eq!(week.trend[6].expenses, dec!(15));
    }

    // =========================================================================
    // Users
    // =========================================================================

    #[test]
    fn test_register_and_login() {
        let db = Database::in_memory().unwrap();
        let id = db
            .register_user(&new_user("ana@example.com", "Ana"))
            .unwrap();

        let profile = db.login_user("ana@example.com", "hunter22").unwrap();
        assert_eq!(profile.id, id);
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.settings, UserSettings::default());

        assert!(matches!(
            db.login_user("ana@example.com", "wrong"),
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            db.login_user("nobody@example.com", "hunter22"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_password_is_hashed() {
        let db = Database::in_memory().unwrap();
        let id = db
            .register_user(&new_user("ana@example.com", "Ana"))
            .unwrap();

        let conn = db.conn().unwrap();
        let hash: String = conn
            .query_row("SELECT password_hash FROM users WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .unwrap();
        assert_ne!(hash, "hunter22");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_duplicate_register_keeps_original() {
        let db = Database::in_memory().unwrap();
        db.register_user(&new_user("ana@example.com", "Ana"))
            .unwrap();

        let mut again = new_user("ana@example.com", "Impostor");
        again.password = "other-pass".to_string();
        assert!(matches!(
            db.register_user(&again),
            Err(Error::DuplicateUser(_))
        ));

        assert_eq!(db.list_users().unwrap().len(), 1);
        let profile = db.login_user("ana@example.com", "hunter22").unwrap();
        assert_eq!(profile.name, "Ana");
    }

    #[test]
    fn test_register_race_reports_duplicate_user() {
        let db = Database::in_memory().unwrap();
        db.register_user(&new_user("ana@example.com", "Ana"))
            .unwrap();

        // A second writer that passed the email lookup before the first insert
        let conn = db.conn().unwrap();
        let result = crate::db::users::insert_user(
            &conn,
            &new_user("ana@example.com", "Late"),
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA",
        );
        assert!(matches!(
            result,
            Err(Error::DuplicateUser(ref email)) if email == "ana@example.com"
        ));
        assert_eq!(db.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_monthly_budget_rounded_to_cents() {
        let db = Database::in_memory().unwrap();
        let id = db
            .register_user(&new_user("ana@example.com", "Ana"))
            .unwrap();

        let patch = SettingsPatch {
            monthly_budget: Some(Some(dec!(1500.555))),
            ..Default::default()
        };
        let settings = db.update_user_settings(id, &patch).unwrap();
        assert_eq!(settings.monthly_budget, Some(dec!(1500.56)));
        assert_eq!(db.get_user(id).unwrap().unwrap().settings, settings);
    }

    #[test]
    fn test_settings_shallow_merge() {
        let db = Database::in_memory().unwrap();
        let id = db
            .register_user(&new_user("ana@example.com", "Ana"))
            .unwrap();

        let patch = SettingsPatch {
            currency: Some("usd".to_string()),
            monthly_budget: Some(Some(dec!(25000))),
            ..Default::default()
        };
        let settings = db.update_user_settings(id, &patch).unwrap();
        assert_eq!(settings.currency, "USD");
        assert_eq!(settings.monthly_budget, Some(dec!(25000)));
        assert_eq!(settings.theme, Theme::Light);
        assert!(settings.notifications);

        let patch = SettingsPatch {
            theme: Some(Theme::Dark),
            ..Default::default()
        };
        db.update_user_settings(id, &patch).unwrap();

        let stored = db.get_user(id).unwrap().unwrap().settings;
        assert_eq!(stored.theme, Theme::Dark);
        assert_eq!(stored.currency, "USD");
        assert_eq!(stored.monthly_budget, Some(dec!(25000)));
    }

    #[test]
    fn test_change_password() {
        let db = Database::in_memory().unwrap();
        let id = db
            .register_user(&new_user("ana@example.com", "Ana"))
            .unwrap();

        assert!(matches!(
            db.update_user_password(id, "wrong", "new-secret"),
            Err(Error::InvalidCredentials)
        ));
        db.update_user_password(id, "hunter22", "new-secret")
            .unwrap();

        assert!(db.login_user("ana@example.com", "hunter22").is_err());
        assert!(db.login_user("ana@example.com", "new-secret").is_ok());
    }

    #[test]
    fn test_demo_user_seeded_once() {
        let db = Database::in_memory().unwrap();
        assert!(db.ensure_demo_user().unwrap().is_some());
        assert!(db.ensure_demo_user().unwrap().is_none());

        let demo = db.find_user_by_email(DEMO_USER_EMAIL).unwrap().unwrap();
        assert_eq!(demo.name, "Demo User");
    }

    #[test]
    fn test_delete_account_clears_everything() {
        let db = Database::in_memory().unwrap();
        let id = db
            .register_user(&new_user("ana@example.com", "Ana"))
            .unwrap();
        db.add_expense(&new_expense(at(2024, 3, 1, 9), dec!(10), PaymentMethod::Cash))
            .unwrap();
        db.add_income(&new_income(at(2024, 3, 1, 9), dec!(10)))
            .unwrap();
        db.add_investment(&new_investment(at(2024, 3, 1, 9), dec!(10)))
            .unwrap();
        db.add_lent_money(&new_lent("Alice", dec!(10))).unwrap();

        db.delete_account(id).unwrap();

        assert!(db.get_user(id).unwrap().is_none());
        for table in Table::TRANSACTIONAL {
            assert_eq!(db.count(table).unwrap(), 0, "{} not cleared", table);
        }
        assert!(matches!(db.delete_account(id), Err(Error::NotFound(_))));
    }

    // =========================================================================
    // Change feed
    // =========================================================================

    #[test]
    fn test_writes_emit_change_events() {
        let db = Database::in_memory().unwrap();
        let mut events = db.subscribe();

        let id = db
            .add_expense(&new_expense(at(2024, 3, 1, 9), dec!(10), PaymentMethod::Cash))
            .unwrap();
        db.update_expense(
            id,
            &ExpensePatch {
                amount: Some(dec!(11)),
                ..Default::default()
            },
        )
        .unwrap();
        db.delete_expense(id).unwrap();
        // Nothing removed, nothing published
        db.delete_expense(id).unwrap();
        db.clear(Table::Incomes).unwrap();

        let kinds: Vec<(Table, ChangeKind, Option<i64>)> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| (e.table, e.kind, e.id))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (Table::Expenses, ChangeKind::Inserted, Some(id)),
                (Table::Expenses, ChangeKind::Updated, Some(id)),
                (Table::Expenses, ChangeKind::Deleted, Some(id)),
                (Table::Incomes, ChangeKind::Cleared, None),
            ]
        );
    }

    #[test]
    fn test_clones_share_change_feed() {
        let db = Database::in_memory().unwrap();
        let other = db.clone();
        let mut events = db.subscribe();

        other
            .add_income(&new_income(at(2024, 3, 1, 9), dec!(10)))
            .unwrap();
        let event = events.try_recv().unwrap();
        assert_eq!(event.table, Table::Incomes);
        assert_eq!(event.kind, ChangeKind::Inserted);
    }

    // =========================================================================
    // Export / import
    // =========================================================================

    fn seed(db: &Database) {
        db.add_expense(&new_expense(at(2024, 3, 1, 9), dec!(10.10), PaymentMethod::Cash))
            .unwrap();
        db.add_expense(&new_expense(at(2024, 3, 2, 9), dec!(20), PaymentMethod::Wallet))
            .unwrap();
        db.add_income(&new_income(at(2024, 3, 1, 9), dec!(3000)))
            .unwrap();
        db.add_investment(&new_investment(at(2024, 1, 1, 9), dec!(500)))
            .unwrap();
        db.add_lent_money(&new_lent("Alice", dec!(40))).unwrap();
    }

    #[test]
    fn test_export_import_roundtrip() {
        let source = Database::in_memory().unwrap();
        seed(&source);

        let doc = source.export_json("Ana", Utc::now()).unwrap();
        assert_eq!(doc.record_count(), 5);

        // Through JSON text, as a backup file would be
        let doc = crate::export::ExportDocument::from_json(&doc.to_json_pretty().unwrap()).unwrap();

        let target = Database::in_memory().unwrap();
        let stats = target.import_json(&doc, ImportMode::Append).unwrap();
        assert_eq!(stats.total(), 5);
        assert!(!stats.replaced);

        let mut imported = target.list_expenses().unwrap();
        let original = source.list_expenses().unwrap();
        assert_eq!(imported.len(), original.len());
        for (copy, orig) in imported.iter_mut().zip(&original) {
            copy.id = orig.id;
            assert_eq!(copy, orig);
        }

        let lent = target.list_lent_money().unwrap();
        assert_eq!(lent[0].name, "Alice");
        assert_eq!(lent[0].created_at, source.list_lent_money().unwrap()[0].created_at);
    }

    #[test]
    fn test_import_replace_and_append() {
        let db = Database::in_memory().unwrap();
        seed(&db);
        let doc = db.export_json("Ana", Utc::now()).unwrap();

        db.import_json(&doc, ImportMode::Append).unwrap();
        assert_eq!(db.list_expenses().unwrap().len(), 4);

        let stats = db.import_json(&doc, ImportMode::Replace).unwrap();
        assert!(stats.replaced);
        assert_eq!(db.list_expenses().unwrap().len(), 2);
        assert_eq!(db.list_incomes().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_import_leaves_store_untouched() {
        let db = Database::in_memory().unwrap();
        seed(&db);
        let mut doc = db.export_json("Ana", Utc::now()).unwrap();
        doc.incomes[0].amount = dec!(-1);

        assert!(db.import_json(&doc, ImportMode::Replace).is_err());
        assert_eq!(db.list_expenses().unwrap().len(), 2);
        assert_eq!(db.list_incomes().unwrap()[0].amount, dec!(3000));
    }

    #[test]
    fn test_reopen_keeps_data_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tally.db");

        {
            let db = Database::open(&path).unwrap();
            db.add_income(&new_income(at(2024, 3, 1, 9), dec!(42)))
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
        assert_eq!(db.list_incomes().unwrap()[0].amount, dec!(42));
    }
}
