use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ActorRole, ExpenseId, ExpenseStatus, NewBudget, NewCategory, NewExpense, NewRule,
};
use super::import::ExpenseCsvImporter;
use super::receipt::{apply_suggestions, extract_receipt_fields, ReceiptFormFields};
use super::repository::{ExpenseRepository, RepositoryError};
use super::service::{ExpenseFilter, ExpenseService, ExpenseServiceError};

/// Router builder exposing the expense management HTTP surface.
pub fn expense_router<R>(service: Arc<ExpenseService<R>>) -> Router
where
    R: ExpenseRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/expense-categories",
            get(list_categories_handler::<R>).post(create_category_handler::<R>),
        )
        .route(
            "/api/v1/expense-budgets",
            get(list_budgets_handler::<R>).post(create_budget_handler::<R>),
        )
        .route(
            "/api/v1/expense-rules",
            get(list_rules_handler::<R>).post(create_rule_handler::<R>),
        )
        .route(
            "/api/v1/expenses",
            get(list_expenses_handler::<R>).post(create_expense_handler::<R>),
        )
        .route("/api/v1/expenses/export", get(export_handler::<R>))
        .route("/api/v1/expenses/import", post(import_handler::<R>))
        .route("/api/v1/expenses/bulk/approve", post(bulk_approve_handler::<R>))
        .route("/api/v1/expenses/bulk/reject", post(bulk_reject_handler::<R>))
        .route("/api/v1/expenses/bulk/delete", post(bulk_delete_handler::<R>))
        .route("/api/v1/expenses/:expense_id", delete(delete_expense_handler::<R>))
        .route("/api/v1/expenses/:expense_id/submit", post(submit_handler::<R>))
        .route("/api/v1/expenses/:expense_id/approve", post(approve_handler::<R>))
        .route("/api/v1/expenses/:expense_id/reject", post(reject_handler::<R>))
        .route("/api/v1/receipts/scan", post(receipt_scan_handler))
        .route("/api/v1/journal-entries", get(journal_entries_handler::<R>))
        .with_state(service)
}

fn error_response(error: ExpenseServiceError) -> Response {
    let status = match &error {
        ExpenseServiceError::Policy { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ExpenseServiceError::InvalidTransition { .. } => StatusCode::CONFLICT,
        ExpenseServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ExpenseServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ExpenseServiceError::Repository(RepositoryError::Unavailable(_))
        | ExpenseServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn create_category_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    axum::Json(draft): axum::Json<NewCategory>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.create_category(draft) {
        Ok(category) => (StatusCode::CREATED, axum::Json(category)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_categories_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.categories() {
        Ok(categories) => axum::Json(json!({ "items": categories })).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_budget_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    axum::Json(draft): axum::Json<NewBudget>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.create_budget(draft) {
        Ok(budget) => (StatusCode::CREATED, axum::Json(budget)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_budgets_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.budget_consumption() {
        Ok(budgets) => axum::Json(json!({ "items": budgets })).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_rule_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    axum::Json(draft): axum::Json<NewRule>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.create_rule(draft) {
        Ok(rule) => (StatusCode::CREATED, axum::Json(rule)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_rules_handler<R>(State(service): State<Arc<ExpenseService<R>>>) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.rules() {
        Ok(rules) => axum::Json(json!({ "items": rules })).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListExpensesQuery {
    #[serde(default)]
    status: Option<ExpenseStatus>,
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

pub(crate) async fn list_expenses_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    Query(query): Query<ListExpensesQuery>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    let filter = ExpenseFilter {
        status: query.status,
        q: query.q,
        limit: query.limit,
    };
    match service.expenses(&filter) {
        Ok(expenses) => axum::Json(json!({ "items": expenses })).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_expense_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    axum::Json(draft): axum::Json<NewExpense>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.create_expense(draft) {
        Ok(expense) => (StatusCode::CREATED, axum::Json(expense)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_expense_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    Path(expense_id): Path<String>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.delete_expense(&ExpenseId(expense_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    Path(expense_id): Path<String>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.submit_expense(&ExpenseId(expense_id)) {
        Ok(expense) => axum::Json(expense).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApprovalRequest {
    pub(crate) role: ActorRole,
}

pub(crate) async fn approve_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    Path(expense_id): Path<String>,
    axum::Json(request): axum::Json<ApprovalRequest>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.approve_expense(&ExpenseId(expense_id), request.role) {
        Ok(expense) => axum::Json(expense).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reject_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    Path(expense_id): Path<String>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.reject_expense(&ExpenseId(expense_id)) {
        Ok(expense) => axum::Json(expense).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkApprovalRequest {
    pub(crate) ids: Vec<ExpenseId>,
    pub(crate) role: ActorRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkSelectionRequest {
    pub(crate) ids: Vec<ExpenseId>,
}

pub(crate) async fn bulk_approve_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    axum::Json(request): axum::Json<BulkApprovalRequest>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.bulk_approve(&request.ids, request.role) {
        Ok(outcome) => axum::Json(outcome).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bulk_reject_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    axum::Json(request): axum::Json<BulkSelectionRequest>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.bulk_reject(&request.ids) {
        Ok(outcome) => axum::Json(outcome).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bulk_delete_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    axum::Json(request): axum::Json<BulkSelectionRequest>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.bulk_delete(&request.ids) {
        Ok(outcome) => axum::Json(outcome).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImportRequest {
    pub(crate) csv: String,
}

pub(crate) async fn import_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
    axum::Json(request): axum::Json<ImportRequest>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    let categories = match service.categories() {
        Ok(categories) => categories,
        Err(error) => return error_response(error),
    };

    let drafts = match ExpenseCsvImporter::from_reader(
        Cursor::new(request.csv.into_bytes()),
        &categories,
    ) {
        Ok(drafts) => drafts,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    match service.create_expenses(drafts) {
        Ok(expenses) => (
            StatusCode::CREATED,
            axum::Json(json!({ "imported": expenses.len(), "items": expenses })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_handler<R>(State(service): State<Arc<ExpenseService<R>>>) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.export_csv() {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv")],
            csv,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReceiptScanRequest {
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) fields: ReceiptFormFields,
}

/// Stateless endpoint: runs the extraction heuristics and merges the
/// suggestions into whatever the user has already typed.
pub(crate) async fn receipt_scan_handler(
    axum::Json(request): axum::Json<ReceiptScanRequest>,
) -> Response {
    let suggestions = extract_receipt_fields(&request.text);
    let mut fields = request.fields;
    apply_suggestions(&mut fields, &suggestions);

    axum::Json(json!({ "suggestions": suggestions, "fields": fields })).into_response()
}

pub(crate) async fn journal_entries_handler<R>(
    State(service): State<Arc<ExpenseService<R>>>,
) -> Response
where
    R: ExpenseRepository + 'static,
{
    match service.journal_entries() {
        Ok(entries) => axum::Json(json!({ "items": entries })).into_response(),
        Err(error) => error_response(error),
    }
}
