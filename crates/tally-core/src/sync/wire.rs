//! Remote row format
//!
//! The remote store mirrors each money table as a relational table keyed by
//! `user_email`. Columns are snake_case, amounts carry two decimal places,
//! entry dates are calendar dates (time of day is dropped) and `created_at`
//! / `updated_at` keep full precision. Enumerations travel as their stored
//! strings so rows written by other clients never fail to decode.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::export::ExportDocument;
use crate::models::{
    round_amount, Expense, ExpenseCategory, Income, IncomeCategory, Investment, InvestmentType,
    LentMoney, LentStatus, PaymentMethod, RiskLevel, DEFAULT_INVESTMENT_NAME,
};
use crate::period::start_of_day;

/// Remote tables, one per money entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteTable {
    Expenses,
    Incomes,
    Investments,
    LentMoney,
}

impl RemoteTable {
    pub const ALL: [RemoteTable; 4] = [
        RemoteTable::Expenses,
        RemoteTable::Incomes,
        RemoteTable::Investments,
        RemoteTable::LentMoney,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteTable::Expenses => "expenses",
            RemoteTable::Incomes => "incomes",
            RemoteTable::Investments => "investments",
            RemoteTable::LentMoney => "lent_money",
        }
    }
}

impl std::fmt::Display for RemoteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn money(amount: Decimal) -> Decimal {
    round_amount(amount)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteExpense {
    pub user_email: String,
    pub date: NaiveDate,
    pub payment_method: String,
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteIncome {
    pub user_email: String,
    pub date: NaiveDate,
    pub source: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteInvestment {
    pub user_email: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub investment_type: String,
    pub amount: Decimal,
    pub description: Option<String>,
    /// Columns added after the first remote schema; older rows lack them
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub return_percentage: Option<Decimal>,
    #[serde(default)]
    pub risk_level: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteLentMoney {
    pub user_email: String,
    pub name: String,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub given_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub comment: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row in any remote table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RemoteRow {
    Expense(RemoteExpense),
    Income(RemoteIncome),
    Investment(RemoteInvestment),
    LentMoney(RemoteLentMoney),
}

impl RemoteRow {
    pub fn table(&self) -> RemoteTable {
        match self {
            RemoteRow::Expense(_) => RemoteTable::Expenses,
            RemoteRow::Income(_) => RemoteTable::Incomes,
            RemoteRow::Investment(_) => RemoteTable::Investments,
            RemoteRow::LentMoney(_) => RemoteTable::LentMoney,
        }
    }

    pub fn user_email(&self) -> &str {
        match self {
            RemoteRow::Expense(r) => &r.user_email,
            RemoteRow::Income(r) => &r.user_email,
            RemoteRow::Investment(r) => &r.user_email,
            RemoteRow::LentMoney(r) => &r.user_email,
        }
    }

    pub fn from_expense(email: &str, e: &Expense) -> Self {
        RemoteRow::Expense(RemoteExpense {
            user_email: email.to_string(),
            date: e.date.date(),
            payment_method: e.payment_method.as_str().to_string(),
            title: e.title.clone(),
            description: e.description.clone(),
            amount: money(e.amount),
            category: e.category.as_str().to_string(),
            created_at: e.created_at,
            updated_at: e.updated_at,
        })
    }

    pub fn from_income(email: &str, i: &Income) -> Self {
        RemoteRow::Income(RemoteIncome {
            user_email: email.to_string(),
            date: i.date.date(),
            source: i.source.clone(),
            description: i.description.clone(),
            amount: money(i.amount),
            category: i.category.as_str().to_string(),
            created_at: i.created_at,
            updated_at: i.updated_at,
        })
    }

    pub fn from_investment(email: &str, i: &Investment) -> Self {
        RemoteRow::Investment(RemoteInvestment {
            user_email: email.to_string(),
            date: i.date.date(),
            investment_type: i.investment_type.as_str().to_string(),
            amount: money(i.amount),
            description: i.description.clone(),
            name: Some(i.name.clone()),
            return_percentage: i.return_percentage,
            risk_level: i.risk_level.map(|r| r.as_str().to_string()),
            created_at: i.created_at,
            updated_at: i.updated_at,
        })
    }

    pub fn from_lent_money(email: &str, l: &LentMoney) -> Self {
        RemoteRow::LentMoney(RemoteLentMoney {
            user_email: email.to_string(),
            name: l.name.clone(),
            amount: money(l.amount),
            reason: l.reason.clone(),
            given_date: l.given_date.date(),
            return_date: l.return_date.map(|d| d.date()),
            comment: l.comment.clone(),
            status: l.status.as_str().to_string(),
            created_at: l.created_at,
            updated_at: l.updated_at,
        })
    }
}

/// Every record of a local snapshot as remote rows for `email`
pub fn rows_from_document(email: &str, doc: &ExportDocument) -> Vec<RemoteRow> {
    let mut rows = Vec::with_capacity(doc.record_count());
    rows.extend(doc.expenses.iter().map(|e| RemoteRow::from_expense(email, e)));
    rows.extend(doc.incomes.iter().map(|i| RemoteRow::from_income(email, i)));
    rows.extend(doc.investments.iter().map(|i| RemoteRow::from_investment(email, i)));
    rows.extend(doc.lent_money.iter().map(|l| RemoteRow::from_lent_money(email, l)));
    rows
}

/// Collect remote rows into a document ready for a replace import.
/// Local ids are assigned on import, so every record carries id 0.
pub fn document_from_rows(email: &str, rows: Vec<RemoteRow>) -> ExportDocument {
    let mut doc = ExportDocument {
        export_date: Utc::now(),
        user: email.to_string(),
        expenses: Vec::new(),
        incomes: Vec::new(),
        investments: Vec::new(),
        lent_money: Vec::new(),
    };

    for row in rows {
        match row {
            RemoteRow::Expense(r) => doc.expenses.push(Expense {
                id: 0,
                date: start_of_day(r.date),
                payment_method: PaymentMethod::from_stored(&r.payment_method),
                title: r.title,
                description: r.description,
                amount: r.amount,
                category: ExpenseCategory::from_stored(&r.category),
                created_at: r.created_at,
                updated_at: r.updated_at,
            }),
            RemoteRow::Income(r) => doc.incomes.push(Income {
                id: 0,
                date: start_of_day(r.date),
                source: r.source,
                description: r.description,
                amount: r.amount,
                category: IncomeCategory::from_stored(&r.category),
                created_at: r.created_at,
                updated_at: r.updated_at,
            }),
            RemoteRow::Investment(r) => doc.investments.push(Investment {
                id: 0,
                date: start_of_day(r.date),
                name: r
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_INVESTMENT_NAME.to_string()),
                investment_type: InvestmentType::from_stored(&r.investment_type),
                amount: r.amount,
                description: r.description,
                return_percentage: r.return_percentage,
                risk_level: r.risk_level.as_deref().map(RiskLevel::from_stored),
                created_at: r.created_at,
                updated_at: r.updated_at,
            }),
            RemoteRow::LentMoney(r) => doc.lent_money.push(LentMoney {
                id: 0,
                name: r.name,
                amount: r.amount,
                reason: r.reason,
                given_date: start_of_day(r.given_date),
                return_date: r.return_date.map(start_of_day),
                comment: r.comment,
                status: LentStatus::from_stored(&r.status),
                created_at: r.created_at,
                updated_at: r.updated_at,
            }),
        }
    }

    doc
}
