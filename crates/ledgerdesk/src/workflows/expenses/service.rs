use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::domain::{
    ActorRole, BudgetConsumption, BudgetId, CategoryId, Expense, ExpenseBudget, ExpenseCategory,
    ExpenseId, ExpenseRule, ExpenseStatus, JournalEntry, JournalEntryId, JournalLine, NewBudget,
    NewCategory, NewExpense, NewRule, RuleId,
};
use super::export::{expenses_to_csv, ExportError};
use super::policy::{
    approval_role_gate, evaluate_rules, ApprovalScope, PolicyAction, PolicyDecision, PolicySubject,
};
use super::repository::{ExpenseRepository, RepositoryError};

const FALLBACK_EXPENSE_ACCOUNT: &str = "6000 General Expenses";
const ACCOUNTS_PAYABLE_ACCOUNT: &str = "2000 Accounts Payable";

/// Service composing the repository, policy evaluator, and CSV surfaces for
/// the expense workflow.
pub struct ExpenseService<R> {
    repository: Arc<R>,
    default_page_size: usize,
}

static EXPENSE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CATEGORY_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static BUDGET_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static RULE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static JOURNAL_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_expense_id() -> ExpenseId {
    let id = EXPENSE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ExpenseId(format!("exp-{id:06}"))
}

fn next_category_id() -> CategoryId {
    let id = CATEGORY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CategoryId(format!("cat-{id:04}"))
}

fn next_budget_id() -> BudgetId {
    let id = BUDGET_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BudgetId(format!("bud-{id:04}"))
}

fn next_rule_id() -> RuleId {
    let id = RULE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RuleId(format!("rule-{id:04}"))
}

fn next_journal_entry_id() -> JournalEntryId {
    let id = JOURNAL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JournalEntryId(format!("jrn-{id:06}"))
}

/// Filters accepted by the expense listing.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub status: Option<ExpenseStatus>,
    pub q: Option<String>,
    pub limit: Option<usize>,
}

/// Per-item outcome accounting for bulk operations. The loop is strictly
/// sequential and continues past failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<BulkFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub id: ExpenseId,
    pub reason: String,
}

impl BulkOutcome {
    fn tally(requested: usize, failures: Vec<BulkFailure>) -> Self {
        let failed = failures.len();
        Self {
            requested,
            succeeded: requested - failed,
            failed,
            failures,
        }
    }
}

/// Error raised by the expense service.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseServiceError {
    /// A policy block; the message is the user-facing refusal verbatim.
    #[error("{message}")]
    Policy { message: String },
    #[error("expense is {from}, cannot {action}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl<R> ExpenseService<R>
where
    R: ExpenseRepository + 'static,
{
    pub fn new(repository: Arc<R>, default_page_size: usize) -> Self {
        Self {
            repository,
            default_page_size,
        }
    }

    pub fn create_category(
        &self,
        draft: NewCategory,
    ) -> Result<ExpenseCategory, ExpenseServiceError> {
        let category = ExpenseCategory {
            id: next_category_id(),
            name: draft.name,
            account_code: draft.account_code,
            is_active: draft.is_active,
        };
        Ok(self.repository.insert_category(category)?)
    }

    pub fn categories(&self) -> Result<Vec<ExpenseCategory>, ExpenseServiceError> {
        Ok(self.repository.categories()?)
    }

    pub fn create_budget(&self, draft: NewBudget) -> Result<ExpenseBudget, ExpenseServiceError> {
        let budget = ExpenseBudget {
            id: next_budget_id(),
            category_id: draft.category_id,
            period_start: draft.period_start,
            period_end: draft.period_end,
            amount: draft.amount,
        };
        Ok(self.repository.insert_budget(budget)?)
    }

    /// Budgets joined with approved spending inside their windows.
    pub fn budget_consumption(&self) -> Result<Vec<BudgetConsumption>, ExpenseServiceError> {
        let budgets = self.repository.budgets()?;
        let expenses = self.repository.expenses()?;

        Ok(budgets
            .into_iter()
            .map(|budget| {
                let spent: f64 = expenses
                    .iter()
                    .filter(|expense| {
                        expense.status == ExpenseStatus::Approved
                            && expense.category_id.as_ref() == Some(&budget.category_id)
                            && expense.incurred_on >= budget.period_start
                            && expense.incurred_on <= budget.period_end
                    })
                    .map(|expense| expense.total_amount)
                    .sum();
                let remaining = budget.amount - spent;
                BudgetConsumption {
                    budget,
                    spent,
                    remaining,
                }
            })
            .collect())
    }

    pub fn create_rule(&self, draft: NewRule) -> Result<ExpenseRule, ExpenseServiceError> {
        let rule = ExpenseRule {
            id: next_rule_id(),
            name: draft.name,
            rule_type: draft.rule_type,
            conditions: draft.conditions,
            actions: draft.actions,
            priority: draft.priority.max(1),
            is_active: draft.is_active,
        };
        Ok(self.repository.insert_rule(rule)?)
    }

    pub fn rules(&self) -> Result<Vec<ExpenseRule>, ExpenseServiceError> {
        Ok(self.repository.rules()?)
    }

    pub fn create_expense(&self, draft: NewExpense) -> Result<Expense, ExpenseServiceError> {
        let expense = Expense {
            id: next_expense_id(),
            category_id: draft.category_id,
            vendor_name: draft.vendor_name,
            description: draft.description,
            total_amount: draft.total_amount,
            incurred_on: draft.incurred_on,
            status: ExpenseStatus::Draft,
        };
        Ok(self.repository.insert_expense(expense)?)
    }

    /// Insert a batch of drafts, as produced by the CSV importer.
    pub fn create_expenses(
        &self,
        drafts: Vec<NewExpense>,
    ) -> Result<Vec<Expense>, ExpenseServiceError> {
        drafts
            .into_iter()
            .map(|draft| self.create_expense(draft))
            .collect()
    }

    pub fn expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, ExpenseServiceError> {
        let needle = filter
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        let limit = filter.limit.unwrap_or(self.default_page_size);

        Ok(self
            .repository
            .expenses()?
            .into_iter()
            .filter(|expense| {
                filter
                    .status
                    .map(|status| expense.status == status)
                    .unwrap_or(true)
            })
            .filter(|expense| match &needle {
                Some(needle) => {
                    expense.description.to_lowercase().contains(needle)
                        || expense
                            .vendor_name
                            .as_deref()
                            .map(|vendor| vendor.to_lowercase().contains(needle))
                            .unwrap_or(false)
                }
                None => true,
            })
            .take(limit)
            .collect())
    }

    pub fn fetch_expense(&self, id: &ExpenseId) -> Result<Expense, ExpenseServiceError> {
        Ok(self
            .repository
            .fetch_expense(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    /// Submit a draft for approval, gated by the active rules.
    pub fn submit_expense(&self, id: &ExpenseId) -> Result<Expense, ExpenseServiceError> {
        let mut expense = self.fetch_expense(id)?;
        if expense.status != ExpenseStatus::Draft {
            return Err(ExpenseServiceError::InvalidTransition {
                from: expense.status.label(),
                action: "submit",
            });
        }

        let rules = self.rules_fail_open(PolicyAction::Submit);
        let subject = PolicySubject::from_expense(&expense);
        if let PolicyDecision::Blocked { message } = evaluate_rules(&subject, &rules) {
            return Err(ExpenseServiceError::Policy { message });
        }

        expense.status = ExpenseStatus::Submitted;
        self.repository.update_expense(expense.clone())?;
        Ok(expense)
    }

    /// Approve a submitted expense and record the matching journal entry.
    pub fn approve_expense(
        &self,
        id: &ExpenseId,
        role: ActorRole,
    ) -> Result<Expense, ExpenseServiceError> {
        let mut expense = self.fetch_expense(id)?;
        if expense.status != ExpenseStatus::Submitted {
            return Err(ExpenseServiceError::InvalidTransition {
                from: expense.status.label(),
                action: "approve",
            });
        }

        let rules = self.rules_fail_open(PolicyAction::Approve);
        let subject = PolicySubject::from_expense(&expense);
        if let PolicyDecision::Blocked { message } = evaluate_rules(&subject, &rules) {
            return Err(ExpenseServiceError::Policy { message });
        }
        if let PolicyDecision::Blocked { message } =
            approval_role_gate(&rules, role, ApprovalScope::Single)
        {
            return Err(ExpenseServiceError::Policy { message });
        }

        expense.status = ExpenseStatus::Approved;
        self.repository.update_expense(expense.clone())?;
        self.record_journal_entry(&expense)?;
        Ok(expense)
    }

    pub fn reject_expense(&self, id: &ExpenseId) -> Result<Expense, ExpenseServiceError> {
        let mut expense = self.fetch_expense(id)?;
        if expense.status != ExpenseStatus::Submitted {
            return Err(ExpenseServiceError::InvalidTransition {
                from: expense.status.label(),
                action: "reject",
            });
        }

        expense.status = ExpenseStatus::Rejected;
        self.repository.update_expense(expense.clone())?;
        Ok(expense)
    }

    pub fn delete_expense(&self, id: &ExpenseId) -> Result<(), ExpenseServiceError> {
        Ok(self.repository.delete_expense(id)?)
    }

    /// Approve a selection one at a time, continuing past failures. The role
    /// gate is checked once up front so an unauthorized caller fails the
    /// whole batch with the bulk wording before any item is touched.
    pub fn bulk_approve(
        &self,
        ids: &[ExpenseId],
        role: ActorRole,
    ) -> Result<BulkOutcome, ExpenseServiceError> {
        let rules = self.rules_fail_open(PolicyAction::Approve);
        if let PolicyDecision::Blocked { message } =
            approval_role_gate(&rules, role, ApprovalScope::Bulk)
        {
            return Err(ExpenseServiceError::Policy { message });
        }

        let mut failures = Vec::new();
        for id in ids {
            if let Err(err) = self.approve_expense(id, role) {
                failures.push(BulkFailure {
                    id: id.clone(),
                    reason: err.to_string(),
                });
            }
        }
        Ok(BulkOutcome::tally(ids.len(), failures))
    }

    pub fn bulk_reject(&self, ids: &[ExpenseId]) -> Result<BulkOutcome, ExpenseServiceError> {
        let mut failures = Vec::new();
        for id in ids {
            if let Err(err) = self.reject_expense(id) {
                failures.push(BulkFailure {
                    id: id.clone(),
                    reason: err.to_string(),
                });
            }
        }
        Ok(BulkOutcome::tally(ids.len(), failures))
    }

    pub fn bulk_delete(&self, ids: &[ExpenseId]) -> Result<BulkOutcome, ExpenseServiceError> {
        let mut failures = Vec::new();
        for id in ids {
            if let Err(err) = self.delete_expense(id) {
                failures.push(BulkFailure {
                    id: id.clone(),
                    reason: err.to_string(),
                });
            }
        }
        Ok(BulkOutcome::tally(ids.len(), failures))
    }

    pub fn journal_entries(&self) -> Result<Vec<JournalEntry>, ExpenseServiceError> {
        Ok(self.repository.journal_entries()?)
    }

    /// RFC4180 CSV of every stored expense.
    pub fn export_csv(&self) -> Result<String, ExpenseServiceError> {
        let expenses = self.repository.expenses()?;
        let categories = self.repository.categories()?;
        Ok(expenses_to_csv(&expenses, &categories)?)
    }

    /// Rules are fetched fresh on every policy check. A fetch failure is
    /// swallowed and treated as "no rules": the action proceeds unchecked.
    /// Deliberately fail-open to match the system this replaced; the warning
    /// keeps the gap visible to operators.
    fn rules_fail_open(&self, action: PolicyAction) -> Vec<ExpenseRule> {
        match self.repository.rules() {
            Ok(rules) => rules,
            Err(err) => {
                warn!(?action, %err, "expense rules unavailable, proceeding without policy checks");
                Vec::new()
            }
        }
    }

    fn record_journal_entry(&self, expense: &Expense) -> Result<(), ExpenseServiceError> {
        let expense_account = expense
            .category_id
            .as_ref()
            .and_then(|id| self.repository.fetch_category(id).ok().flatten())
            .map(|category| format!("{} {}", category.account_code, category.name))
            .unwrap_or_else(|| FALLBACK_EXPENSE_ACCOUNT.to_string());

        let entry = JournalEntry {
            id: next_journal_entry_id(),
            expense_id: expense.id.clone(),
            memo: expense.description.clone(),
            posted_on: expense.incurred_on,
            lines: vec![
                JournalLine {
                    account: expense_account,
                    debit: expense.total_amount,
                    credit: 0.0,
                },
                JournalLine {
                    account: ACCOUNTS_PAYABLE_ACCOUNT.to_string(),
                    debit: 0.0,
                    credit: expense.total_amount,
                },
            ],
        };

        self.repository.insert_journal_entry(entry)?;
        Ok(())
    }
}
