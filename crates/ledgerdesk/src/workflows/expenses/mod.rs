//! Expense management workflow: categories, budgets, configurable spending
//! rules, expense entries with a submit/approve lifecycle, receipt capture
//! heuristics, CSV import/export, and the journal entries recorded on
//! approval.

pub mod domain;
pub mod export;
pub mod import;
pub mod policy;
pub mod receipt;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    ActorRole, BudgetConsumption, BudgetId, CategoryId, Expense, ExpenseBudget, ExpenseCategory,
    ExpenseId, ExpenseRule, ExpenseRuleType, ExpenseStatus, JournalEntry, JournalEntryId,
    JournalLine, NewBudget, NewCategory, NewExpense, NewRule, RuleId,
};
pub use export::{expenses_to_csv, ExportError};
pub use import::{ExpenseCsvImportError, ExpenseCsvImporter};
pub use policy::{
    approval_role_gate, evaluate_action, evaluate_rules, parse_conditions, ApprovalScope,
    ConditionParseError, PolicyAction, PolicyDecision, PolicySubject, RuleConditions,
};
pub use receipt::{
    apply_suggestions, extract_receipt_fields, ReceiptFormFields, ReceiptSuggestions,
};
pub use repository::{ExpenseRepository, RepositoryError};
pub use router::expense_router;
pub use service::{BulkFailure, BulkOutcome, ExpenseFilter, ExpenseService, ExpenseServiceError};
