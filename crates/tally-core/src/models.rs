//! Domain models for Tally

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Minimum password length the front ends ask for (not enforced by the store)
pub const MIN_PASSWORD_LEN: usize = 6;

/// Name given to investments recorded without one
pub const DEFAULT_INVESTMENT_NAME: &str = "Investment";

/// Currency code given to newly registered users
pub const DEFAULT_CURRENCY: &str = "INR";

/// Decimal places kept for money amounts
pub const AMOUNT_SCALE: u32 = 2;

/// Round an amount to the precision it is stored with (half-even)
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp(AMOUNT_SCALE)
}

/// Declares a string-backed enum with `as_str`, `label`, `FromStr`, `Display`
/// and an `ALL` list. Extra literals after the stored value are accepted
/// aliases when parsing.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($what:literal, fallback = $fallback:ident) {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $value:literal $(| $alias:literal)*, $label:literal;
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// Human-readable label
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Parse a value read back from storage. Values written by older
            /// versions that are no longer known map to the catch-all variant.
            pub(crate) fn from_stored(s: &str) -> Self {
                s.parse().unwrap_or(Self::$fallback)
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($value $(| $alias)* => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("Unknown ", $what, ": {}"), s)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

string_enum! {
    /// How an expense was paid
    pub enum PaymentMethod ("payment method", fallback = Other) {
        CreditCard => "credit_card", "Credit Card";
        DebitCard => "debit_card", "Debit Card";
        Cash => "cash", "Cash";
        BankTransfer => "bank_transfer", "Bank Transfer";
        Upi => "upi", "UPI";
        Wallet => "wallet", "Digital Wallet";
        Other => "other", "Other";
    }
}

string_enum! {
    /// Expense categories
    pub enum ExpenseCategory ("expense category", fallback = Others) {
        FoodDining => "food_dining", "Food & Dining";
        Shopping => "shopping", "Shopping";
        Transportation => "transportation", "Transportation";
        Entertainment => "entertainment", "Entertainment";
        BillsUtilities => "bills_utilities", "Bills & Utilities";
        Healthcare => "healthcare", "Healthcare";
        Education => "education", "Education";
        Travel => "travel", "Travel";
        PersonalCare => "personal_care", "Personal Care";
        Groceries => "groceries", "Groceries";
        RentMortgage => "rent_mortgage", "Rent/Mortgage";
        Insurance => "insurance", "Insurance";
        GiftsDonations => "gifts_donations", "Gifts & Donations";
        Others => "others", "Others";
    }
}

string_enum! {
    /// Income categories
    pub enum IncomeCategory ("income category", fallback = Others) {
        Salary => "salary", "Salary";
        Freelance => "freelance", "Freelance";
        Business => "business", "Business";
        Investments => "investments", "Investment Returns";
        Rental => "rental", "Rental Income";
        Others => "others", "Others";
    }
}

string_enum! {
    /// Investment types
    pub enum InvestmentType ("investment type", fallback = Others) {
        Stocks => "stocks", "Stocks";
        MutualFunds => "mutual_funds", "Mutual Funds";
        Bonds => "bonds", "Bonds";
        RealEstate => "real_estate", "Real Estate";
        Cryptocurrency => "cryptocurrency" | "crypto", "Cryptocurrency";
        FixedDeposit => "fixed_deposit" | "fixed_deposits", "Fixed Deposit";
        Gold => "gold", "Gold";
        Others => "others", "Others";
    }
}

string_enum! {
    /// Self-assessed investment risk
    pub enum RiskLevel ("risk level", fallback = Medium) {
        Low => "low", "Low";
        Medium => "medium", "Medium";
        High => "high", "High";
    }
}

string_enum! {
    /// Whether lent money has come back
    pub enum LentStatus ("lent money status", fallback = Pending) {
        Pending => "pending", "Pending";
        Returned => "returned", "Returned";
    }
}

string_enum! {
    /// UI theme preference
    pub enum Theme ("theme", fallback = Light) {
        Light => "light", "Light";
        Dark => "dark", "Dark";
    }
}

// =============================================================================
// Validation helpers
// =============================================================================

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Amounts must still be positive once rounded to cents
fn require_positive(field: &str, amount: Decimal) -> Result<()> {
    if round_amount(amount) <= Decimal::ZERO {
        return Err(Error::Validation(format!(
            "{} must be greater than zero (got {})",
            field, amount
        )));
    }
    Ok(())
}

/// Drop blank optional text so it is stored as NULL
fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

// =============================================================================
// Users
// =============================================================================

/// Per-user preferences, stored as JSON on the user row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub currency: String,
    #[serde(deserialize_with = "stored_theme")]
    pub theme: Theme,
    pub notifications: bool,
    pub budget_alerts: bool,
    pub monthly_budget: Option<Decimal>,
}

/// Settings written by older versions may carry themes that no longer exist
fn stored_theme<'de, D>(deserializer: D) -> std::result::Result<Theme, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Theme::from_stored(&raw))
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            theme: Theme::Light,
            notifications: true,
            budget_alerts: true,
            monthly_budget: None,
        }
    }
}

/// Partial settings update, shallow-merged into the stored settings
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub currency: Option<String>,
    pub theme: Option<Theme>,
    pub notifications: Option<bool>,
    pub budget_alerts: Option<bool>,
    /// `Some(None)` clears the budget
    pub monthly_budget: Option<Option<Decimal>>,
}

impl SettingsPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref currency) = self.currency {
            require_text("currency", currency)?;
        }
        if let Some(Some(budget)) = self.monthly_budget {
            if round_amount(budget) < Decimal::ZERO {
                return Err(Error::Validation(
                    "monthly budget cannot be negative".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn apply(&self, settings: &mut UserSettings) {
        if let Some(ref currency) = self.currency {
            settings.currency = currency.trim().to_uppercase();
        }
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
        if let Some(notifications) = self.notifications {
            settings.notifications = notifications;
        }
        if let Some(budget_alerts) = self.budget_alerts {
            settings.budget_alerts = budget_alerts;
        }
        if let Some(budget) = self.monthly_budget {
            settings.monthly_budget = budget.map(round_amount);
        }
    }
}

/// A user as seen by callers (never carries the password hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub settings: UserSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        require_text("email", &self.email)?;
        require_text("name", &self.name)?;
        if self.password.is_empty() {
            return Err(Error::Validation("password is required".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Expenses
// =============================================================================

/// A recorded expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    pub date: NaiveDateTime,
    pub payment_method: PaymentMethod,
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: ExpenseCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A new expense (before insertion)
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub date: NaiveDateTime,
    pub payment_method: PaymentMethod,
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: ExpenseCategory,
}

impl NewExpense {
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        require_positive("amount", self.amount)
    }
}

impl From<&Expense> for NewExpense {
    fn from(e: &Expense) -> Self {
        Self {
            date: e.date,
            payment_method: e.payment_method,
            title: e.title.clone(),
            description: e.description.clone(),
            amount: e.amount,
            category: e.category,
        }
    }
}

/// Fields to change on an expense
#[derive(Debug, Clone, Default)]
pub struct ExpensePatch {
    pub date: Option<NaiveDateTime>,
    pub payment_method: Option<PaymentMethod>,
    pub title: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub amount: Option<Decimal>,
    pub category: Option<ExpenseCategory>,
}

impl ExpensePatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref title) = self.title {
            require_text("title", title)?;
        }
        if let Some(amount) = self.amount {
            require_positive("amount", amount)?;
        }
        Ok(())
    }

    pub(crate) fn apply(&self, expense: &mut Expense) {
        if let Some(date) = self.date {
            expense.date = date;
        }
        if let Some(method) = self.payment_method {
            expense.payment_method = method;
        }
        if let Some(ref title) = self.title {
            expense.title = title.trim().to_string();
        }
        if let Some(ref description) = self.description {
            expense.description = non_blank(description);
        }
        if let Some(amount) = self.amount {
            expense.amount = round_amount(amount);
        }
        if let Some(category) = self.category {
            expense.category = category;
        }
    }
}

// =============================================================================
// Incomes
// =============================================================================

/// A recorded income
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    pub id: i64,
    pub date: NaiveDateTime,
    pub source: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: IncomeCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewIncome {
    pub date: NaiveDateTime,
    pub source: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: IncomeCategory,
}

impl NewIncome {
    pub fn validate(&self) -> Result<()> {
        require_text("source", &self.source)?;
        require_positive("amount", self.amount)
    }
}

impl From<&Income> for NewIncome {
    fn from(i: &Income) -> Self {
        Self {
            date: i.date,
            source: i.source.clone(),
            description: i.description.clone(),
            amount: i.amount,
            category: i.category,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IncomePatch {
    pub date: Option<NaiveDateTime>,
    pub source: Option<String>,
    pub description: Option<Option<String>>,
    pub amount: Option<Decimal>,
    pub category: Option<IncomeCategory>,
}

impl IncomePatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref source) = self.source {
            require_text("source", source)?;
        }
        if let Some(amount) = self.amount {
            require_positive("amount", amount)?;
        }
        Ok(())
    }

    pub(crate) fn apply(&self, income: &mut Income) {
        if let Some(date) = self.date {
            income.date = date;
        }
        if let Some(ref source) = self.source {
            income.source = source.trim().to_string();
        }
        if let Some(ref description) = self.description {
            income.description = non_blank(description);
        }
        if let Some(amount) = self.amount {
            income.amount = round_amount(amount);
        }
        if let Some(category) = self.category {
            income.category = category;
        }
    }
}

// =============================================================================
// Investments
// =============================================================================

/// A recorded investment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: i64,
    pub date: NaiveDateTime,
    pub name: String,
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,
    pub amount: Decimal,
    pub description: Option<String>,
    /// Expected return, in percent
    pub return_percentage: Option<Decimal>,
    pub risk_level: Option<RiskLevel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub date: NaiveDateTime,
    /// Defaults to "Investment" when missing or blank
    pub name: Option<String>,
    pub investment_type: InvestmentType,
    pub amount: Decimal,
    pub description: Option<String>,
    pub return_percentage: Option<Decimal>,
    pub risk_level: Option<RiskLevel>,
}

impl NewInvestment {
    pub fn validate(&self) -> Result<()> {
        require_positive("amount", self.amount)
    }

    /// The name to store
    pub fn resolved_name(&self) -> String {
        non_blank(&self.name).unwrap_or_else(|| DEFAULT_INVESTMENT_NAME.to_string())
    }
}

impl From<&Investment> for NewInvestment {
    fn from(i: &Investment) -> Self {
        Self {
            date: i.date,
            name: Some(i.name.clone()),
            investment_type: i.investment_type,
            amount: i.amount,
            description: i.description.clone(),
            return_percentage: i.return_percentage,
            risk_level: i.risk_level,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvestmentPatch {
    pub date: Option<NaiveDateTime>,
    pub name: Option<String>,
    pub investment_type: Option<InvestmentType>,
    pub amount: Option<Decimal>,
    pub description: Option<Option<String>>,
    pub return_percentage: Option<Option<Decimal>>,
    pub risk_level: Option<Option<RiskLevel>>,
}

impl InvestmentPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            require_text("name", name)?;
        }
        if let Some(amount) = self.amount {
            require_positive("amount", amount)?;
        }
        Ok(())
    }

    pub(crate) fn apply(&self, investment: &mut Investment) {
        if let Some(date) = self.date {
            investment.date = date;
        }
        if let Some(ref name) = self.name {
            investment.name = name.trim().to_string();
        }
        if let Some(kind) = self.investment_type {
            investment.investment_type = kind;
        }
        if let Some(amount) = self.amount {
            investment.amount = round_amount(amount);
        }
        if let Some(ref description) = self.description {
            investment.description = non_blank(description);
        }
        if let Some(ret) = self.return_percentage {
            investment.return_percentage = ret;
        }
        if let Some(risk) = self.risk_level {
            investment.risk_level = risk;
        }
    }
}

// =============================================================================
// Lent money
// =============================================================================

/// Money lent to someone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LentMoney {
    pub id: i64,
    /// Borrower
    pub name: String,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub given_date: NaiveDateTime,
    pub return_date: Option<NaiveDateTime>,
    pub comment: Option<String>,
    pub status: LentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLentMoney {
    pub name: String,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub given_date: NaiveDateTime,
    pub return_date: Option<NaiveDateTime>,
    pub comment: Option<String>,
    pub status: LentStatus,
}

impl NewLentMoney {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_positive("amount", self.amount)
    }
}

impl From<&LentMoney> for NewLentMoney {
    fn from(l: &LentMoney) -> Self {
        Self {
            name: l.name.clone(),
            amount: l.amount,
            reason: l.reason.clone(),
            given_date: l.given_date,
            return_date: l.return_date,
            comment: l.comment.clone(),
            status: l.status,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LentMoneyPatch {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub reason: Option<Option<String>>,
    pub given_date: Option<NaiveDateTime>,
    pub return_date: Option<Option<NaiveDateTime>>,
    pub comment: Option<Option<String>>,
    pub status: Option<LentStatus>,
}

impl LentMoneyPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            require_text("name", name)?;
        }
        if let Some(amount) = self.amount {
            require_positive("amount", amount)?;
        }
        Ok(())
    }

    /// Apply the patch. A record that ends up `Returned` without a return
    /// date gets `now`; going back to `Pending` keeps the old return date.
    pub(crate) fn apply(&self, lent: &mut LentMoney, now: NaiveDateTime) {
        if let Some(ref name) = self.name {
            lent.name = name.trim().to_string();
        }
        if let Some(amount) = self.amount {
            lent.amount = round_amount(amount);
        }
        if let Some(ref reason) = self.reason {
            lent.reason = non_blank(reason);
        }
        if let Some(given) = self.given_date {
            lent.given_date = given;
        }
        if let Some(ret) = self.return_date {
            lent.return_date = ret;
        }
        if let Some(ref comment) = self.comment {
            lent.comment = non_blank(comment);
        }
        if let Some(status) = self.status {
            lent.status = status;
        }
        if lent.status == LentStatus::Returned && lent.return_date.is_none() {
            lent.return_date = Some(now);
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub monthly_expenses: Decimal,
    pub daily_expenses: Decimal,
    pub monthly_income: Decimal,
    /// Monthly income minus monthly expenses; may be negative
    pub current_balance: Decimal,
    /// All-time, not month scoped
    pub total_investments: Decimal,
    pub credit_card_spending: Decimal,
}
