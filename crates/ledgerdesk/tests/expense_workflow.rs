//! Integration specifications for the expense intake, policy, and approval
//! workflow, driven through the public service facade and HTTP router.

mod common {
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;

    use ledgerdesk::workflows::expenses::{
        CategoryId, Expense, ExpenseBudget, ExpenseCategory, ExpenseId, ExpenseRepository,
        ExpenseRule, ExpenseRuleType, ExpenseService, JournalEntry, NewCategory, NewExpense,
        NewRule, RepositoryError,
    };

    #[derive(Default)]
    struct Store {
        categories: Vec<ExpenseCategory>,
        budgets: Vec<ExpenseBudget>,
        rules: Vec<ExpenseRule>,
        expenses: Vec<Expense>,
        journal_entries: Vec<JournalEntry>,
    }

    #[derive(Default, Clone)]
    pub(super) struct MemoryRepository {
        store: Arc<Mutex<Store>>,
        pub(super) rules_unavailable: Arc<Mutex<bool>>,
    }

    impl MemoryRepository {
        pub(super) fn break_rules_fetch(&self) {
            *self.rules_unavailable.lock().expect("lock") = true;
        }
    }

    impl ExpenseRepository for MemoryRepository {
        fn insert_category(
            &self,
            category: ExpenseCategory,
        ) -> Result<ExpenseCategory, RepositoryError> {
            let mut guard = self.store.lock().expect("lock");
            guard.categories.push(category.clone());
            Ok(category)
        }

        fn categories(&self) -> Result<Vec<ExpenseCategory>, RepositoryError> {
            Ok(self.store.lock().expect("lock").categories.clone())
        }

        fn fetch_category(
            &self,
            id: &CategoryId,
        ) -> Result<Option<ExpenseCategory>, RepositoryError> {
            Ok(self
                .store
                .lock()
                .expect("lock")
                .categories
                .iter()
                .find(|row| &row.id == id)
                .cloned())
        }

        fn insert_budget(&self, budget: ExpenseBudget) -> Result<ExpenseBudget, RepositoryError> {
            let mut guard = self.store.lock().expect("lock");
            guard.budgets.push(budget.clone());
            Ok(budget)
        }

        fn budgets(&self) -> Result<Vec<ExpenseBudget>, RepositoryError> {
            Ok(self.store.lock().expect("lock").budgets.clone())
        }

        fn insert_rule(&self, rule: ExpenseRule) -> Result<ExpenseRule, RepositoryError> {
            let mut guard = self.store.lock().expect("lock");
            guard.rules.push(rule.clone());
            Ok(rule)
        }

        fn rules(&self) -> Result<Vec<ExpenseRule>, RepositoryError> {
            if *self.rules_unavailable.lock().expect("lock") {
                return Err(RepositoryError::Unavailable("rules offline".to_string()));
            }
            Ok(self.store.lock().expect("lock").rules.clone())
        }

        fn insert_expense(&self, expense: Expense) -> Result<Expense, RepositoryError> {
            let mut guard = self.store.lock().expect("lock");
            guard.expenses.push(expense.clone());
            Ok(expense)
        }

        fn update_expense(&self, expense: Expense) -> Result<(), RepositoryError> {
            let mut guard = self.store.lock().expect("lock");
            match guard.expenses.iter_mut().find(|row| row.id == expense.id) {
                Some(slot) => {
                    *slot = expense;
                    Ok(())
                }
                None => Err(RepositoryError::NotFound),
            }
        }

        fn fetch_expense(&self, id: &ExpenseId) -> Result<Option<Expense>, RepositoryError> {
            Ok(self
                .store
                .lock()
                .expect("lock")
                .expenses
                .iter()
                .find(|row| &row.id == id)
                .cloned())
        }

        fn delete_expense(&self, id: &ExpenseId) -> Result<(), RepositoryError> {
            let mut guard = self.store.lock().expect("lock");
            let before = guard.expenses.len();
            guard.expenses.retain(|row| &row.id != id);
            if guard.expenses.len() == before {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        }

        fn expenses(&self) -> Result<Vec<Expense>, RepositoryError> {
            Ok(self.store.lock().expect("lock").expenses.clone())
        }

        fn insert_journal_entry(
            &self,
            entry: JournalEntry,
        ) -> Result<JournalEntry, RepositoryError> {
            let mut guard = self.store.lock().expect("lock");
            guard.journal_entries.push(entry.clone());
            Ok(entry)
        }

        fn journal_entries(&self) -> Result<Vec<JournalEntry>, RepositoryError> {
            Ok(self.store.lock().expect("lock").journal_entries.clone())
        }
    }

    pub(super) fn build_service() -> (ExpenseService<MemoryRepository>, Arc<MemoryRepository>) {
        let repository = Arc::new(MemoryRepository::default());
        let service = ExpenseService::new(repository.clone(), 50);
        (service, repository)
    }

    pub(super) fn incurred_on() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date")
    }

    pub(super) fn draft(vendor: Option<&str>, amount: f64) -> NewExpense {
        NewExpense {
            category_id: None,
            vendor_name: vendor.map(str::to_string),
            description: "integration expense".to_string(),
            total_amount: amount,
            incurred_on: incurred_on(),
        }
    }

    pub(super) fn rule(rule_type: ExpenseRuleType, conditions: &str) -> NewRule {
        NewRule {
            name: "integration rule".to_string(),
            rule_type,
            conditions: conditions.to_string(),
            actions: "{}".to_string(),
            priority: 1,
            is_active: true,
        }
    }

    pub(super) fn category(name: &str, account_code: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            account_code: account_code.to_string(),
            is_active: true,
        }
    }
}

mod lifecycle {
    use super::common::*;
    use ledgerdesk::workflows::expenses::{
        ActorRole, ExpenseRuleType, ExpenseServiceError, ExpenseStatus,
    };

    #[test]
    fn submit_then_approve_records_a_balanced_journal_entry() {
        let (service, _) = build_service();
        let travel = service
            .create_category(category("Travel", "6200"))
            .expect("category");

        let mut expense_draft = draft(Some("Initech"), 480.0);
        expense_draft.category_id = Some(travel.id.clone());
        let expense = service.create_expense(expense_draft).expect("created");
        assert_eq!(expense.status, ExpenseStatus::Draft);

        let submitted = service.submit_expense(&expense.id).expect("submitted");
        assert_eq!(submitted.status, ExpenseStatus::Submitted);

        let approved = service
            .approve_expense(&expense.id, ActorRole::Accountant)
            .expect("approved");
        assert_eq!(approved.status, ExpenseStatus::Approved);

        let entries = service.journal_entries().expect("entries");
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.expense_id, expense.id);
        assert!(entry.is_balanced());
        assert!(entry.lines.iter().any(|line| line.account.contains("Travel")));
    }

    #[test]
    fn policy_block_aborts_submission_with_message() {
        let (service, _) = build_service();
        service
            .create_rule(rule(ExpenseRuleType::AmountLimit, r#"{"limit": 1000}"#))
            .expect("rule stored");

        let expense = service
            .create_expense(draft(Some("Initech"), 1500.0))
            .expect("created");
        let error = service.submit_expense(&expense.id).expect_err("blocked");

        match error {
            ExpenseServiceError::Policy { message } => {
                assert_eq!(message, "Amount exceeds policy limit of 1000");
            }
            other => panic!("expected policy block, got {other:?}"),
        }

        let unchanged = service.fetch_expense(&expense.id).expect("still present");
        assert_eq!(unchanged.status, ExpenseStatus::Draft);
    }

    #[test]
    fn approval_requires_an_approver_role() {
        let (service, _) = build_service();
        service
            .create_rule(rule(ExpenseRuleType::ApprovalRequired, "{}"))
            .expect("rule stored");

        let expense = service
            .create_expense(draft(Some("Initech"), 100.0))
            .expect("created");
        service.submit_expense(&expense.id).expect("submitted");

        let error = service
            .approve_expense(&expense.id, ActorRole::Employee)
            .expect_err("blocked");
        match error {
            ExpenseServiceError::Policy { message } => {
                assert_eq!(message, "Approval requires an approver role");
            }
            other => panic!("expected role gate, got {other:?}"),
        }

        service
            .approve_expense(&expense.id, ActorRole::Admin)
            .expect("admin approves");
    }

    #[test]
    fn transitions_outside_the_lifecycle_are_conflicts() {
        let (service, _) = build_service();
        let expense = service
            .create_expense(draft(None, 10.0))
            .expect("created");

        let error = service
            .approve_expense(&expense.id, ActorRole::Admin)
            .expect_err("draft cannot be approved");
        assert!(matches!(
            error,
            ExpenseServiceError::InvalidTransition { from: "draft", .. }
        ));

        service.submit_expense(&expense.id).expect("submitted");
        let error = service.submit_expense(&expense.id).expect_err("resubmit");
        assert!(matches!(
            error,
            ExpenseServiceError::InvalidTransition {
                from: "submitted",
                ..
            }
        ));
    }

    #[test]
    fn rules_fetch_failure_fails_open() {
        let (service, repository) = build_service();
        service
            .create_rule(rule(ExpenseRuleType::AmountLimit, r#"{"limit": 1}"#))
            .expect("rule stored");

        let expense = service
            .create_expense(draft(Some("Initech"), 9_999.0))
            .expect("created");

        repository.break_rules_fetch();

        // The rule would block this, but a broken rules fetch permits all
        // actions. Deliberate fail-open carried over from the prior system.
        let submitted = service.submit_expense(&expense.id).expect("fails open");
        assert_eq!(submitted.status, ExpenseStatus::Submitted);
    }

    #[test]
    fn budget_consumption_tracks_approved_spending_only() {
        let (service, _) = build_service();
        let travel = service
            .create_category(category("Travel", "6200"))
            .expect("category");
        service
            .create_budget(ledgerdesk::workflows::expenses::NewBudget {
                category_id: travel.id.clone(),
                period_start: chrono::NaiveDate::from_ymd_opt(2026, 3, 1).expect("month start"),
                period_end: chrono::NaiveDate::from_ymd_opt(2026, 3, 31).expect("month end"),
                amount: 1000.0,
            })
            .expect("budget stored");

        let mut approved_draft = draft(Some("Initech"), 400.0);
        approved_draft.category_id = Some(travel.id.clone());
        let approved = service.create_expense(approved_draft).expect("created");
        service.submit_expense(&approved.id).expect("submitted");
        service
            .approve_expense(&approved.id, ActorRole::Admin)
            .expect("approved");

        let mut pending_draft = draft(Some("Initech"), 300.0);
        pending_draft.category_id = Some(travel.id.clone());
        service.create_expense(pending_draft).expect("created");

        let consumption = service.budget_consumption().expect("consumption");
        assert_eq!(consumption.len(), 1);
        assert_eq!(consumption[0].spent, 400.0);
        assert_eq!(consumption[0].remaining, 600.0);
    }
}

mod bulk {
    use super::common::*;
    use ledgerdesk::workflows::expenses::{ActorRole, ExpenseRuleType, ExpenseServiceError};

    #[test]
    fn bulk_approve_continues_past_failures_and_reports_counts() {
        let (service, _) = build_service();

        let submitted = service
            .create_expense(draft(Some("Initech"), 100.0))
            .expect("created");
        service.submit_expense(&submitted.id).expect("submitted");

        // Still a draft: approving it fails, the loop moves on.
        let still_draft = service
            .create_expense(draft(Some("Initech"), 50.0))
            .expect("created");

        let outcome = service
            .bulk_approve(
                &[submitted.id.clone(), still_draft.id.clone()],
                ActorRole::Admin,
            )
            .expect("bulk runs");

        assert_eq!(outcome.requested, 2);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.failures[0].id, still_draft.id);
    }

    #[test]
    fn bulk_approve_without_approver_role_fails_the_whole_batch() {
        let (service, _) = build_service();
        service
            .create_rule(rule(ExpenseRuleType::ApprovalRequired, "{}"))
            .expect("rule stored");

        let expense = service
            .create_expense(draft(Some("Initech"), 10.0))
            .expect("created");
        service.submit_expense(&expense.id).expect("submitted");

        let error = service
            .bulk_approve(&[expense.id.clone()], ActorRole::Employee)
            .expect_err("batch refused");
        match error {
            ExpenseServiceError::Policy { message } => {
                assert_eq!(message, "Bulk approval requires an approver role");
            }
            other => panic!("expected bulk role gate, got {other:?}"),
        }

        // The single item was never touched.
        let untouched = service.fetch_expense(&expense.id).expect("present");
        assert_eq!(
            untouched.status,
            ledgerdesk::workflows::expenses::ExpenseStatus::Submitted
        );
    }

    #[test]
    fn bulk_delete_reports_missing_ids_as_failures() {
        let (service, _) = build_service();
        let expense = service
            .create_expense(draft(None, 10.0))
            .expect("created");

        let outcome = service
            .bulk_delete(&[
                expense.id.clone(),
                ledgerdesk::workflows::expenses::ExpenseId("exp-missing".to_string()),
            ])
            .expect("bulk runs");

        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 1);
        assert!(outcome.failures[0].reason.contains("not found"));
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use ledgerdesk::workflows::expenses::expense_router;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn build_router() -> (axum::Router, Arc<MemoryRepository>) {
        let (service, repository) = build_service();
        (expense_router(Arc::new(service)), repository)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    #[tokio::test]
    async fn create_and_list_expenses_over_http() {
        let (router, _) = build_router();

        let create = Request::builder()
            .method("POST")
            .uri("/api/v1/expenses")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({
                    "category_id": null,
                    "vendor_name": "Initech",
                    "description": "Team lunch",
                    "total_amount": 58.20,
                    "incurred_on": "2026-03-15"
                }))
                .expect("payload"),
            ))
            .expect("request");

        let response = router.clone().oneshot(create).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(
            created.get("status").and_then(Value::as_str),
            Some("draft")
        );

        let list = Request::builder()
            .method("GET")
            .uri("/api/v1/expenses?q=lunch")
            .body(Body::empty())
            .expect("request");
        let response = router.clone().oneshot(list).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let listed = json_body(response).await;
        assert_eq!(
            listed
                .get("items")
                .and_then(Value::as_array)
                .map(Vec::len),
            Some(1)
        );
    }

    #[tokio::test]
    async fn policy_blocks_surface_as_unprocessable_entity() {
        let (router, _) = build_router();

        let rule_request = Request::builder()
            .method("POST")
            .uri("/api/v1/expense-rules")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({
                    "name": "Blocked suppliers",
                    "rule_type": "vendor_restriction",
                    "conditions": "{\"blocked\": [\"acme\"]}"
                }))
                .expect("payload"),
            ))
            .expect("request");
        let response = router.clone().oneshot(rule_request).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);

        let create = Request::builder()
            .method("POST")
            .uri("/api/v1/expenses")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({
                    "vendor_name": "Acme Industrial",
                    "description": "Fixtures",
                    "total_amount": 75.0,
                    "incurred_on": "2026-03-15"
                }))
                .expect("payload"),
            ))
            .expect("request");
        let created = json_body(router.clone().oneshot(create).await.expect("dispatch")).await;
        let id = created
            .get("id")
            .and_then(Value::as_str)
            .expect("id assigned")
            .to_string();

        let submit = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/expenses/{id}/submit"))
            .body(Body::empty())
            .expect("request");
        let response = router.clone().oneshot(submit).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = json_body(response).await;
        assert_eq!(
            payload.get("error").and_then(Value::as_str),
            Some("Vendor restricted by policy")
        );
    }

    #[tokio::test]
    async fn receipt_scan_merges_suggestions_into_empty_fields() {
        let (router, _) = build_router();

        let scan = Request::builder()
            .method("POST")
            .uri("/api/v1/receipts/scan")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({
                    "text": "Corner Cafe\nSubtotal $10.00\nTotal $12.50\n2026-03-15",
                    "fields": { "vendor": "Edited By Hand" }
                }))
                .expect("payload"),
            ))
            .expect("request");

        let response = router.clone().oneshot(scan).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;

        let fields = payload.get("fields").expect("fields");
        assert_eq!(
            fields.get("vendor").and_then(Value::as_str),
            Some("Edited By Hand")
        );
        assert_eq!(
            fields.get("amount").and_then(Value::as_str),
            Some("12.50")
        );
        assert_eq!(
            fields.get("date").and_then(Value::as_str),
            Some("2026-03-15")
        );
    }

    #[tokio::test]
    async fn export_returns_csv_with_header() {
        let (router, _) = build_router();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/expenses/export")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|value| value.to_str().ok()),
            Some("text/csv")
        );
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let text = String::from_utf8(body.to_vec()).expect("utf8");
        assert!(text.starts_with("id,date,vendor,description,category,status,amount"));
    }

    #[tokio::test]
    async fn import_creates_draft_expenses() {
        let (router, _) = build_router();

        let import = Request::builder()
            .method("POST")
            .uri("/api/v1/expenses/import")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({
                    "csv": "Date,Vendor,Description,Amount,Category\n2026-03-15,Acme Cab,Airport ride,$42.50,\n"
                }))
                .expect("payload"),
            ))
            .expect("request");

        let response = router.clone().oneshot(import).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let payload = json_body(response).await;
        assert_eq!(payload.get("imported").and_then(Value::as_u64), Some(1));
    }

    #[tokio::test]
    async fn unknown_expense_is_not_found() {
        let (router, _) = build_router();
        let submit = Request::builder()
            .method("POST")
            .uri("/api/v1/expenses/exp-missing/submit")
            .body(Body::empty())
            .expect("request");
        let response = router.clone().oneshot(submit).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
