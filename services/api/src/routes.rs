use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use ledgerdesk::workflows::expenses::{expense_router, ExpenseRepository, ExpenseService};
use ledgerdesk::workflows::shipments::{shipment_router, ShipmentRepository, ShipmentService};
use serde_json::json;
use std::sync::Arc;

/// Compose the expense and shipment routers with the operational endpoints.
pub(crate) fn with_back_office_routes<E, S>(
    expenses: Arc<ExpenseService<E>>,
    shipments: Arc<ShipmentService<S>>,
) -> axum::Router
where
    E: ExpenseRepository + 'static,
    S: ShipmentRepository + 'static,
{
    expense_router(expenses)
        .merge(shipment_router(shipments))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
