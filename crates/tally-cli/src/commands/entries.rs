//! Expense, income and investment commands

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use tally_core::db::Database;
use tally_core::models::{
    Expense, ExpenseCategory, ExpensePatch, Income, IncomeCategory, IncomePatch, Investment,
    InvestmentPatch, InvestmentType, NewExpense, NewIncome, NewInvestment, PaymentMethod,
    RiskLevel,
};

use super::{clearable, date_or_now, parse_amount, parse_choice, parse_date, parse_range, truncate};

fn parse_opt<T, F>(input: Option<String>, parse: F) -> Result<Option<T>>
where
    F: Fn(&str) -> Result<T>,
{
    input.as_deref().map(parse).transpose()
}

fn print_total(count: usize, total: Decimal) {
    println!("{}", "-".repeat(86));
    println!("{} entries, total {}", count, total);
}

// ========== Expenses ==========

/// Fields to change on an expense, as given on the command line
#[derive(Debug, Default)]
pub struct ExpenseChanges {
    pub title: Option<String>,
    pub amount: Option<String>,
    pub category: Option<String>,
    pub method: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

impl ExpenseChanges {
    fn into_patch(self) -> Result<ExpensePatch> {
        Ok(ExpensePatch {
            date: parse_opt(self.date, parse_date)?,
            payment_method: parse_opt(self.method, parse_choice::<PaymentMethod>)?,
            title: self.title,
            description: clearable(self.description),
            amount: parse_opt(self.amount, parse_amount)?,
            category: parse_opt(self.category, parse_choice::<ExpenseCategory>)?,
        })
    }
}

fn print_expenses(expenses: &[Expense]) {
    println!(
        "{:>5}  {:<16}  {:<28}  {:<18}  {:<12}  {:>12}",
        "ID", "DATE", "TITLE", "CATEGORY", "METHOD", "AMOUNT"
    );
    println!("{}", "-".repeat(86));
    for e in expenses {
        println!(
            "{:>5}  {:<16}  {:<28}  {:<18}  {:<12}  {:>12}",
            e.id,
            e.date.format("%Y-%m-%d %H:%M"),
            truncate(&e.title, 28),
            truncate(e.category.label(), 18),
            truncate(e.payment_method.label(), 12),
            e.amount
        );
    }
}

pub fn cmd_expense_add(
    db: &Database,
    title: &str,
    amount: &str,
    category: &str,
    method: &str,
    date: Option<&str>,
    description: Option<String>,
) -> Result<()> {
    let expense = NewExpense {
        date: date_or_now(date)?,
        payment_method: parse_choice(method)?,
        title: title.to_string(),
        description,
        amount: parse_amount(amount)?,
        category: parse_choice(category)?,
    };

    let id = db.add_expense(&expense).context("Failed to add expense")?;
    println!(
        "✅ Expense {} added: {} ({})",
        id,
        expense.title.trim(),
        expense.amount
    );
    Ok(())
}

pub fn cmd_expense_list(
    db: &Database,
    from: Option<&str>,
    to: Option<&str>,
    category: Option<&str>,
) -> Result<()> {
    let mut expenses = match parse_range(from, to)? {
        Some((start, end)) => db.get_expenses_by_date_range(start, end)?,
        None => db.list_expenses()?,
    };
    if let Some(category) = category {
        let category: ExpenseCategory = parse_choice(category)?;
        expenses.retain(|e| e.category == category);
    }

    if expenses.is_empty() {
        println!("No expenses found");
        return Ok(());
    }

    print_expenses(&expenses);
    print_total(expenses.len(), expenses.iter().map(|e| e.amount).sum());
    Ok(())
}

pub fn cmd_expense_update(db: &Database, id: i64, changes: ExpenseChanges) -> Result<()> {
    let patch = changes.into_patch()?;
    let expense = db
        .update_expense(id, &patch)
        .with_context(|| format!("Failed to update expense {}", id))?;

    println!("✅ Expense {} updated", id);
    print_expenses(std::slice::from_ref(&expense));
    Ok(())
}

pub fn cmd_expense_delete(db: &Database, id: i64) -> Result<()> {
    if db.delete_expense(id)? {
        println!("✅ Expense {} deleted", id);
    } else {
        println!("Expense {} not found (nothing deleted)", id);
    }
    Ok(())
}

// ========== Incomes ==========

#[derive(Debug, Default)]
pub struct IncomeChanges {
    pub source: Option<String>,
    pub amount: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

impl IncomeChanges {
    fn into_patch(self) -> Result<IncomePatch> {
        Ok(IncomePatch {
            date: parse_opt(self.date, parse_date)?,
            source: self.source,
            description: clearable(self.description),
            amount: parse_opt(self.amount, parse_amount)?,
            category: parse_opt(self.category, parse_choice::<IncomeCategory>)?,
        })
    }
}

fn print_incomes(incomes: &[Income]) {
    println!(
        "{:>5}  {:<16}  {:<32}  {:<14}  {:>12}",
        "ID", "DATE", "SOURCE", "CATEGORY", "AMOUNT"
    );
    println!("{}", "-".repeat(86));
    for i in incomes {
        println!(
            "{:>5}  {:<16}  {:<32}  {:<14}  {:>12}",
            i.id,
            i.date.format("%Y-%m-%d %H:%M"),
            truncate(&i.source, 32),
            i.category.label(),
            i.amount
        );
    }
}

pub fn cmd_income_add(
    db: &Database,
    source: &str,
    amount: &str,
    category: &str,
    date: Option<&str>,
    description: Option<String>,
) -> Result<()> {
    let income = NewIncome {
        date: date_or_now(date)?,
        source: source.to_string(),
        description,
        amount: parse_amount(amount)?,
        category: parse_choice(category)?,
    };

    let id = db.add_income(&income).context("Failed to add income")?;
    println!(
        "✅ Income {} added: {} ({})",
        id,
        income.source.trim(),
        income.amount
    );
    Ok(())
}

pub fn cmd_income_list(db: &Database, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let incomes = match parse_range(from, to)? {
        Some((start, end)) => db.get_incomes_by_date_range(start, end)?,
        None => db.list_incomes()?,
    };

    if incomes.is_empty() {
        println!("No incomes found");
        return Ok(());
    }

    print_incomes(&incomes);
    print_total(incomes.len(), incomes.iter().map(|i| i.amount).sum());
    Ok(())
}

pub fn cmd_income_update(db: &Database, id: i64, changes: IncomeChanges) -> Result<()> {
    let patch = changes.into_patch()?;
    let income = db
        .update_income(id, &patch)
        .with_context(|| format!("Failed to update income {}", id))?;

    println!("✅ Income {} updated", id);
    print_incomes(std::slice::from_ref(&income));
    Ok(())
}

pub fn cmd_income_delete(db: &Database, id: i64) -> Result<()> {
    if db.delete_income(id)? {
        println!("✅ Income {} deleted", id);
    } else {
        println!("Income {} not found (nothing deleted)", id);
    }
    Ok(())
}

// ========== Investments ==========

/// New investment, as given on the command line
#[derive(Debug, Default)]
pub struct InvestmentArgs {
    pub amount: String,
    pub kind: String,
    pub name: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub returns: Option<String>,
    pub risk: Option<String>,
}

#[derive(Debug, Default)]
pub struct InvestmentChanges {
    pub amount: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

impl InvestmentChanges {
    fn into_patch(self) -> Result<InvestmentPatch> {
        Ok(InvestmentPatch {
            date: parse_opt(self.date, parse_date)?,
            name: self.name,
            investment_type: parse_opt(self.kind, parse_choice::<InvestmentType>)?,
            amount: parse_opt(self.amount, parse_amount)?,
            description: clearable(self.description),
            ..Default::default()
        })
    }
}

/// Expected return in percent; may be zero or negative
fn parse_percentage(input: &str) -> Result<Decimal> {
    match input.trim().trim_end_matches('%').parse::<Decimal>() {
        Ok(value) => Ok(value),
        Err(_) => bail!("Invalid percentage: {}", input),
    }
}

fn print_investments(investments: &[Investment]) {
    println!(
        "{:>5}  {:<10}  {:<24}  {:<16}  {:>8}  {:<6}  {:>12}",
        "ID", "DATE", "NAME", "TYPE", "RETURN", "RISK", "AMOUNT"
    );
    println!("{}", "-".repeat(86));
    for i in investments {
        println!(
            "{:>5}  {:<10}  {:<24}  {:<16}  {:>8}  {:<6}  {:>12}",
            i.id,
            i.date.format("%Y-%m-%d"),
            truncate(&i.name, 24),
            truncate(i.investment_type.label(), 16),
            i.return_percentage
                .map(|r| format!("{}%", r))
                .unwrap_or_else(|| "-".to_string()),
            i.risk_level.map(|r| r.label()).unwrap_or("-"),
            i.amount
        );
    }
}

pub fn cmd_investment_add(db: &Database, args: InvestmentArgs) -> Result<()> {
    let investment = NewInvestment {
        date: date_or_now(args.date.as_deref())?,
        name: args.name,
        investment_type: parse_choice(&args.kind)?,
        amount: parse_amount(&args.amount)?,
        description: args.description,
        return_percentage: parse_opt(args.returns, parse_percentage)?,
        risk_level: parse_opt(args.risk, parse_choice::<RiskLevel>)?,
    };

    let id = db
        .add_investment(&investment)
        .context("Failed to add investment")?;
    println!(
        "✅ Investment {} added: {} ({})",
        id,
        investment.resolved_name(),
        investment.amount
    );
    Ok(())
}

pub fn cmd_investment_list(db: &Database, kind: Option<&str>) -> Result<()> {
    let investments = match kind {
        Some(kind) => db.get_investments_by_type(parse_choice(kind)?)?,
        None => db.list_investments()?,
    };

    if investments.is_empty() {
        println!("No investments found");
        return Ok(());
    }

    print_investments(&investments);
    print_total(investments.len(), investments.iter().map(|i| i.amount).sum());
    Ok(())
}

pub fn cmd_investment_update(db: &Database, id: i64, changes: InvestmentChanges) -> Result<()> {
    let patch = changes.into_patch()?;
    let investment = db
        .update_investment(id, &patch)
        .with_context(|| format!("Failed to update investment {}", id))?;

    println!("✅ Investment {} updated", id);
    print_investments(std::slice::from_ref(&investment));
    Ok(())
}

pub fn cmd_investment_delete(db: &Database, id: i64) -> Result<()> {
    if db.delete_investment(id)? {
        println!("✅ Investment {} deleted", id);
    } else {
        println!("Investment {} not found (nothing deleted)", id);
    }
    Ok(())
}
