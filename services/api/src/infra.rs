use chrono::NaiveDate;
use ledgerdesk::workflows::expenses::{
    CategoryId, Expense, ExpenseBudget, ExpenseCategory, ExpenseId, ExpenseRepository, ExpenseRule,
    JournalEntry, RepositoryError,
};
use ledgerdesk::workflows::shipments::{
    ImportShipment, RepositoryError as ShipmentRepositoryError, ShipmentId, ShipmentRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Vec-backed stores: insertion order is part of the contract for rules
/// (the evaluator applies them in list order) and keeps listings stable.
#[derive(Default)]
struct ExpenseStore {
    categories: Vec<ExpenseCategory>,
    budgets: Vec<ExpenseBudget>,
    rules: Vec<ExpenseRule>,
    expenses: Vec<Expense>,
    journal_entries: Vec<JournalEntry>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryExpenseRepository {
    store: Arc<Mutex<ExpenseStore>>,
}

impl ExpenseRepository for InMemoryExpenseRepository {
    fn insert_category(
        &self,
        category: ExpenseCategory,
    ) -> Result<ExpenseCategory, RepositoryError> {
        let mut guard = self.store.lock().expect("expense store mutex poisoned");
        if guard.categories.iter().any(|row| row.id == category.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.categories.push(category.clone());
        Ok(category)
    }

    fn categories(&self) -> Result<Vec<ExpenseCategory>, RepositoryError> {
        let guard = self.store.lock().expect("expense store mutex poisoned");
        Ok(guard.categories.clone())
    }

    fn fetch_category(&self, id: &CategoryId) -> Result<Option<ExpenseCategory>, RepositoryError> {
        let guard = self.store.lock().expect("expense store mutex poisoned");
        Ok(guard.categories.iter().find(|row| &row.id == id).cloned())
    }

    fn insert_budget(&self, budget: ExpenseBudget) -> Result<ExpenseBudget, RepositoryError> {
        let mut guard = self.store.lock().expect("expense store mutex poisoned");
        if guard.budgets.iter().any(|row| row.id == budget.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.budgets.push(budget.clone());
        Ok(budget)
    }

    fn budgets(&self) -> Result<Vec<ExpenseBudget>, RepositoryError> {
        let guard = self.store.lock().expect("expense store mutex poisoned");
        Ok(guard.budgets.clone())
    }

    fn insert_rule(&self, rule: ExpenseRule) -> Result<ExpenseRule, RepositoryError> {
        let mut guard = self.store.lock().expect("expense store mutex poisoned");
        if guard.rules.iter().any(|row| row.id == rule.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.rules.push(rule.clone());
        Ok(rule)
    }

    fn rules(&self) -> Result<Vec<ExpenseRule>, RepositoryError> {
        let guard = self.store.lock().expect("expense store mutex poisoned");
        Ok(guard.rules.clone())
    }

    fn insert_expense(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let mut guard = self.store.lock().expect("expense store mutex poisoned");
        if guard.expenses.iter().any(|row| row.id == expense.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.expenses.push(expense.clone());
        Ok(expense)
    }

    fn update_expense(&self, expense: Expense) -> Result<(), RepositoryError> {
        let mut guard = self.store.lock().expect("expense store mutex poisoned");
        match guard.expenses.iter_mut().find(|row| row.id == expense.id) {
            Some(slot) => {
                *slot = expense;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_expense(&self, id: &ExpenseId) -> Result<Option<Expense>, RepositoryError> {
        let guard = self.store.lock().expect("expense store mutex poisoned");
        Ok(guard.expenses.iter().find(|row| &row.id == id).cloned())
    }

    fn delete_expense(&self, id: &ExpenseId) -> Result<(), RepositoryError> {
        let mut guard = self.store.lock().expect("expense store mutex poisoned");
        let before = guard.expenses.len();
        guard.expenses.retain(|row| &row.id != id);
        if guard.expenses.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn expenses(&self) -> Result<Vec<Expense>, RepositoryError> {
        let guard = self.store.lock().expect("expense store mutex poisoned");
        Ok(guard.expenses.clone())
    }

    fn insert_journal_entry(&self, entry: JournalEntry) -> Result<JournalEntry, RepositoryError> {
        let mut guard = self.store.lock().expect("expense store mutex poisoned");
        guard.journal_entries.push(entry.clone());
        Ok(entry)
    }

    fn journal_entries(&self) -> Result<Vec<JournalEntry>, RepositoryError> {
        let guard = self.store.lock().expect("expense store mutex poisoned");
        Ok(guard.journal_entries.clone())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryShipmentRepository {
    shipments: Arc<Mutex<Vec<ImportShipment>>>,
}

impl ShipmentRepository for InMemoryShipmentRepository {
    fn insert(&self, shipment: ImportShipment) -> Result<ImportShipment, ShipmentRepositoryError> {
        let mut guard = self.shipments.lock().expect("shipment store mutex poisoned");
        if guard.iter().any(|row| row.id == shipment.id) {
            return Err(ShipmentRepositoryError::Conflict);
        }
        guard.push(shipment.clone());
        Ok(shipment)
    }

    fn update(&self, shipment: ImportShipment) -> Result<(), ShipmentRepositoryError> {
        let mut guard = self.shipments.lock().expect("shipment store mutex poisoned");
        match guard.iter_mut().find(|row| row.id == shipment.id) {
            Some(slot) => {
                *slot = shipment;
                Ok(())
            }
            None => Err(ShipmentRepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &ShipmentId) -> Result<Option<ImportShipment>, ShipmentRepositoryError> {
        let guard = self.shipments.lock().expect("shipment store mutex poisoned");
        Ok(guard.iter().find(|row| &row.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<ImportShipment>, ShipmentRepositoryError> {
        let guard = self.shipments.lock().expect("shipment store mutex poisoned");
        Ok(guard.clone())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
