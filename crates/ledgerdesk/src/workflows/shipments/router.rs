use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::allocation::AllocationRequest;
use super::domain::{CustomsEvent, NewShipment, ShipmentId, ShipmentStatus};
use super::repository::{RepositoryError, ShipmentRepository};
use super::service::{ShipmentFilter, ShipmentService, ShipmentServiceError};

/// Router builder for the import-shipment surface. Paths match the wire
/// contract the dashboard clients already speak.
pub fn shipment_router<R>(service: Arc<ShipmentService<R>>) -> Router
where
    R: ShipmentRepository + 'static,
{
    Router::new()
        .route(
            "/api/import-shipments",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route("/api/import-shipments/stats", get(stats_handler::<R>))
        .route(
            "/api/import-shipments/:shipment_id/customs-events",
            post(customs_event_handler::<R>),
        )
        .route(
            "/api/import-shipments/:shipment_id/allocate-costs",
            post(allocate_costs_handler::<R>),
        )
        .with_state(service)
}

fn error_response(error: ShipmentServiceError) -> Response {
    let status = match &error {
        ShipmentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ShipmentServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ShipmentServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ShipmentServiceError::Allocation(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListShipmentsQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    status: Option<ShipmentStatus>,
    #[serde(default)]
    carrier: Option<String>,
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<ShipmentService<R>>>,
    Query(query): Query<ListShipmentsQuery>,
) -> Response
where
    R: ShipmentRepository + 'static,
{
    let filter = ShipmentFilter {
        q: query.q,
        status: query.status,
        carrier: query.carrier,
    };
    match service.list(&filter) {
        Ok(shipments) => axum::Json(json!({ "items": shipments })).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<R>(State(service): State<Arc<ShipmentService<R>>>) -> Response
where
    R: ShipmentRepository + 'static,
{
    match service.stats() {
        Ok(stats) => axum::Json(stats).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<ShipmentService<R>>>,
    axum::Json(draft): axum::Json<NewShipment>,
) -> Response
where
    R: ShipmentRepository + 'static,
{
    match service.create(draft) {
        Ok(shipment) => (StatusCode::CREATED, axum::Json(shipment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn customs_event_handler<R>(
    State(service): State<Arc<ShipmentService<R>>>,
    Path(shipment_id): Path<String>,
    axum::Json(event): axum::Json<CustomsEvent>,
) -> Response
where
    R: ShipmentRepository + 'static,
{
    match service.append_customs_event(&ShipmentId(shipment_id), event) {
        Ok(shipment) => (StatusCode::CREATED, axum::Json(shipment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn allocate_costs_handler<R>(
    State(service): State<Arc<ShipmentService<R>>>,
    Path(shipment_id): Path<String>,
    axum::Json(request): axum::Json<AllocationRequest>,
) -> Response
where
    R: ShipmentRepository + 'static,
{
    match service.allocate_costs(&ShipmentId(shipment_id), request) {
        Ok(allocation) => axum::Json(allocation).into_response(),
        Err(error) => error_response(error),
    }
}
