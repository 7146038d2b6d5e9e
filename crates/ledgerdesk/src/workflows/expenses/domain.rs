use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for expense records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpenseId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BudgetId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JournalEntryId(pub String);

/// Chart-of-accounts bucket an expense posts against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: CategoryId,
    pub name: String,
    pub account_code: String,
    pub is_active: bool,
}

/// Spending ceiling for one category over a date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseBudget {
    pub id: BudgetId,
    pub category_id: CategoryId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub amount: f64,
}

/// Budget row joined with approved spending inside its window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetConsumption {
    pub budget: ExpenseBudget,
    pub spent: f64,
    pub remaining: f64,
}

/// Kinds of configurable spending policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseRuleType {
    AmountLimit,
    VendorRestriction,
    ApprovalRequired,
}

/// Configurable policy row. `conditions` and `actions` carry raw JSON exactly
/// as stored; `priority` is recorded but does not reorder evaluation, which
/// runs in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRule {
    pub id: RuleId,
    pub name: String,
    pub rule_type: ExpenseRuleType,
    pub conditions: String,
    pub actions: String,
    pub priority: u32,
    pub is_active: bool,
}

/// Lifecycle of an expense entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl ExpenseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ExpenseStatus::Draft => "draft",
            ExpenseStatus::Submitted => "submitted",
            ExpenseStatus::Approved => "approved",
            ExpenseStatus::Rejected => "rejected",
        }
    }
}

/// A single expense entry awaiting submission and approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub category_id: Option<CategoryId>,
    pub vendor_name: Option<String>,
    pub description: String,
    pub total_amount: f64,
    pub incurred_on: NaiveDate,
    pub status: ExpenseStatus,
}

/// Inbound fields for creating an expense; the service assigns id and status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub category_id: Option<CategoryId>,
    pub vendor_name: Option<String>,
    pub description: String,
    pub total_amount: f64,
    pub incurred_on: NaiveDate,
}

/// Inbound fields for creating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub account_code: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Inbound fields for creating a budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBudget {
    pub category_id: CategoryId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub amount: f64,
}

/// Inbound fields for creating a rule. Conditions and actions default to
/// empty JSON objects when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRule {
    pub name: String,
    pub rule_type: ExpenseRuleType,
    #[serde(default = "default_json_object")]
    pub conditions: String,
    #[serde(default = "default_json_object")]
    pub actions: String,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

fn default_json_object() -> String {
    "{}".to_string()
}

fn default_priority() -> u32 {
    1
}

/// Role of the user performing submit/approve actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Admin,
    Accountant,
    Employee,
}

impl ActorRole {
    /// Only admins and accountants may approve when an approval_required
    /// rule is active.
    pub const fn is_approver(self) -> bool {
        matches!(self, ActorRole::Admin | ActorRole::Accountant)
    }

    pub const fn label(self) -> &'static str {
        match self {
            ActorRole::Admin => "admin",
            ActorRole::Accountant => "accountant",
            ActorRole::Employee => "employee",
        }
    }
}

/// One debit or credit leg of a journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account: String,
    pub debit: f64,
    pub credit: f64,
}

/// Ledger record written when an expense is approved. Read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub expense_id: ExpenseId,
    pub memo: String,
    pub posted_on: NaiveDate,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    pub fn is_balanced(&self) -> bool {
        let debits: f64 = self.lines.iter().map(|line| line.debit).sum();
        let credits: f64 = self.lines.iter().map(|line| line.credit).sum();
        (debits - credits).abs() < 0.005
    }
}
