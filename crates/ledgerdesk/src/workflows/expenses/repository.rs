use super::domain::{
    CategoryId, Expense, ExpenseBudget, ExpenseCategory, ExpenseId, ExpenseRule, JournalEntry,
};

/// Storage abstraction so the service module can be exercised in isolation.
/// The binary supplies Mutex-guarded in-memory implementations; a database
/// adapter would slot in behind the same trait.
pub trait ExpenseRepository: Send + Sync {
    fn insert_category(&self, category: ExpenseCategory)
        -> Result<ExpenseCategory, RepositoryError>;
    fn categories(&self) -> Result<Vec<ExpenseCategory>, RepositoryError>;
    fn fetch_category(&self, id: &CategoryId) -> Result<Option<ExpenseCategory>, RepositoryError>;

    fn insert_budget(&self, budget: ExpenseBudget) -> Result<ExpenseBudget, RepositoryError>;
    fn budgets(&self) -> Result<Vec<ExpenseBudget>, RepositoryError>;

    fn insert_rule(&self, rule: ExpenseRule) -> Result<ExpenseRule, RepositoryError>;
    /// Rules in stored list order; the evaluator applies them as returned.
    fn rules(&self) -> Result<Vec<ExpenseRule>, RepositoryError>;

    fn insert_expense(&self, expense: Expense) -> Result<Expense, RepositoryError>;
    fn update_expense(&self, expense: Expense) -> Result<(), RepositoryError>;
    fn fetch_expense(&self, id: &ExpenseId) -> Result<Option<Expense>, RepositoryError>;
    fn delete_expense(&self, id: &ExpenseId) -> Result<(), RepositoryError>;
    fn expenses(&self) -> Result<Vec<Expense>, RepositoryError>;

    fn insert_journal_entry(&self, entry: JournalEntry) -> Result<JournalEntry, RepositoryError>;
    fn journal_entries(&self) -> Result<Vec<JournalEntry>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
