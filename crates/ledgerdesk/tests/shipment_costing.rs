//! Integration specifications for import shipment tracking and landed-cost
//! allocation, driven through the service facade and the HTTP router.

mod common {
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;

    use ledgerdesk::workflows::shipments::{
        ImportShipment, NewShipment, PurchaseOrderLine, RepositoryError, ShipmentCosts,
        ShipmentId, ShipmentRepository, ShipmentService,
    };

    #[derive(Default, Clone)]
    pub(super) struct MemoryRepository {
        shipments: Arc<Mutex<Vec<ImportShipment>>>,
    }

    impl ShipmentRepository for MemoryRepository {
        fn insert(&self, shipment: ImportShipment) -> Result<ImportShipment, RepositoryError> {
            let mut guard = self.shipments.lock().expect("lock");
            if guard.iter().any(|row| row.id == shipment.id) {
                return Err(RepositoryError::Conflict);
            }
            guard.push(shipment.clone());
            Ok(shipment)
        }

        fn update(&self, shipment: ImportShipment) -> Result<(), RepositoryError> {
            let mut guard = self.shipments.lock().expect("lock");
            match guard.iter_mut().find(|row| row.id == shipment.id) {
                Some(slot) => {
                    *slot = shipment;
                    Ok(())
                }
                None => Err(RepositoryError::NotFound),
            }
        }

        fn fetch(&self, id: &ShipmentId) -> Result<Option<ImportShipment>, RepositoryError> {
            let guard = self.shipments.lock().expect("lock");
            Ok(guard.iter().find(|row| &row.id == id).cloned())
        }

        fn list(&self) -> Result<Vec<ImportShipment>, RepositoryError> {
            Ok(self.shipments.lock().expect("lock").clone())
        }
    }

    pub(super) fn build_service() -> ShipmentService<MemoryRepository> {
        ShipmentService::new(Arc::new(MemoryRepository::default()))
    }

    pub(super) fn eta() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 2).expect("valid date")
    }

    pub(super) fn shipment_draft(reference: &str, carrier: &str) -> NewShipment {
        NewShipment {
            reference: reference.to_string(),
            supplier: "Shenzhen Components Ltd".to_string(),
            carrier: carrier.to_string(),
            expected_arrival: Some(eta()),
            lines: vec![
                PurchaseOrderLine {
                    id: "line-1".to_string(),
                    description: "Aluminium housings".to_string(),
                    unit_value: 12.0,
                    quantity: 500,
                },
                PurchaseOrderLine {
                    id: "line-2".to_string(),
                    description: "Fastener kits".to_string(),
                    unit_value: 4.0,
                    quantity: 500,
                },
            ],
            costs: ShipmentCosts {
                freight: 1800.0,
                insurance: 240.0,
                customs_fees: 410.0,
                storage: 150.0,
                other: 0.0,
            },
        }
    }
}

mod tracking {
    use super::common::*;
    use ledgerdesk::workflows::shipments::{
        CustomsEvent, CustomsEventKind, ShipmentFilter, ShipmentStatus,
    };

    #[test]
    fn customs_events_drive_shipment_status() {
        let service = build_service();
        let shipment = service
            .create(shipment_draft("PO-7741", "Maersk"))
            .expect("created");
        assert_eq!(shipment.status, ShipmentStatus::Ordered);

        let after_inspection = service
            .append_customs_event(
                &shipment.id,
                CustomsEvent {
                    kind: CustomsEventKind::Inspection,
                    occurred_on: eta(),
                    location: "Rotterdam".to_string(),
                    notes: Some("random check".to_string()),
                },
            )
            .expect("event appended");
        assert_eq!(after_inspection.status, ShipmentStatus::AtCustoms);
        assert_eq!(after_inspection.customs_events.len(), 1);

        let after_clearance = service
            .append_customs_event(
                &shipment.id,
                CustomsEvent {
                    kind: CustomsEventKind::Cleared,
                    occurred_on: eta(),
                    location: "Rotterdam".to_string(),
                    notes: None,
                },
            )
            .expect("event appended");
        assert_eq!(after_clearance.status, ShipmentStatus::Cleared);
        assert_eq!(after_clearance.customs_events.len(), 2);
    }

    #[test]
    fn listing_filters_by_query_status_and_carrier() {
        let service = build_service();
        service
            .create(shipment_draft("PO-7741", "Maersk"))
            .expect("created");
        service
            .create(shipment_draft("PO-9001", "DHL"))
            .expect("created");

        let by_reference = service
            .list(&ShipmentFilter {
                q: Some("7741".to_string()),
                ..ShipmentFilter::default()
            })
            .expect("list");
        assert_eq!(by_reference.len(), 1);
        assert_eq!(by_reference[0].reference, "PO-7741");

        let by_supplier = service
            .list(&ShipmentFilter {
                q: Some("shenzhen".to_string()),
                ..ShipmentFilter::default()
            })
            .expect("list");
        assert_eq!(by_supplier.len(), 2);

        let by_carrier = service
            .list(&ShipmentFilter {
                carrier: Some("dhl".to_string()),
                ..ShipmentFilter::default()
            })
            .expect("list");
        assert_eq!(by_carrier.len(), 1);

        let by_status = service
            .list(&ShipmentFilter {
                status: Some(ShipmentStatus::Delivered),
                ..ShipmentFilter::default()
            })
            .expect("list");
        assert!(by_status.is_empty());
    }

    #[test]
    fn stats_aggregate_counts_and_landed_cost() {
        let service = build_service();
        let first = service
            .create(shipment_draft("PO-7741", "Maersk"))
            .expect("created");
        service
            .create(shipment_draft("PO-9001", "DHL"))
            .expect("created");

        service
            .append_customs_event(
                &first.id,
                CustomsEvent {
                    kind: CustomsEventKind::HoldPlaced,
                    occurred_on: eta(),
                    location: "Rotterdam".to_string(),
                    notes: None,
                },
            )
            .expect("event appended");

        let stats = service.stats().expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.ordered, 1);
        assert_eq!(stats.at_customs, 1);
        assert_eq!(stats.pending_allocation, 2);
        assert!((stats.total_landed_cost - 5200.0).abs() < 1e-9);
    }
}

mod costing {
    use super::common::*;
    use ledgerdesk::workflows::shipments::{
        AllocationMethod, AllocationRequest, CustomAllocation, ShipmentServiceError,
    };

    #[test]
    fn value_allocation_is_persisted_on_the_shipment() {
        let service = build_service();
        let shipment = service
            .create(shipment_draft("PO-7741", "Maersk"))
            .expect("created");

        let allocation = service
            .allocate_costs(
                &shipment.id,
                AllocationRequest {
                    allocation_method: AllocationMethod::Value,
                    custom_allocations: None,
                },
            )
            .expect("allocated");

        // Line values 6000 vs 2000: a 75/25 split of the 2600 landed cost.
        assert_eq!(allocation.lines[0].amount, 1950.0);
        assert_eq!(allocation.lines[1].amount, 650.0);

        let stored = service.fetch(&shipment.id).expect("fetched");
        assert_eq!(stored.allocation, Some(allocation));
    }

    #[test]
    fn custom_allocation_normalizes_shares() {
        let service = build_service();
        let shipment = service
            .create(shipment_draft("PO-7741", "Maersk"))
            .expect("created");

        let allocation = service
            .allocate_costs(
                &shipment.id,
                AllocationRequest {
                    allocation_method: AllocationMethod::Custom,
                    custom_allocations: Some(vec![
                        CustomAllocation {
                            line_id: "line-1".to_string(),
                            share: 30.0,
                        },
                        CustomAllocation {
                            line_id: "line-2".to_string(),
                            share: 10.0,
                        },
                    ]),
                },
            )
            .expect("allocated");

        assert!((allocation.lines[0].share_pct - 75.0).abs() < 1e-9);
        assert!((allocation.lines[1].share_pct - 25.0).abs() < 1e-9);
        let sum: f64 = allocation.lines.iter().map(|line| line.amount).sum();
        assert!((sum - 2600.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_custom_allocation_is_rejected() {
        let service = build_service();
        let shipment = service
            .create(shipment_draft("PO-7741", "Maersk"))
            .expect("created");

        let error = service
            .allocate_costs(
                &shipment.id,
                AllocationRequest {
                    allocation_method: AllocationMethod::Custom,
                    custom_allocations: Some(vec![
                        CustomAllocation {
                            line_id: "line-1".to_string(),
                            share: 0.0,
                        },
                        CustomAllocation {
                            line_id: "line-2".to_string(),
                            share: 0.0,
                        },
                    ]),
                },
            )
            .expect_err("all-zero shares rejected");
        assert!(matches!(error, ShipmentServiceError::Allocation(_)));

        let stored = service.fetch(&shipment.id).expect("fetched");
        assert!(stored.allocation.is_none());
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use ledgerdesk::workflows::shipments::shipment_router;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn build_router() -> axum::Router {
        shipment_router(Arc::new(build_service()))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    fn create_request(reference: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/import-shipments")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({
                    "reference": reference,
                    "supplier": "Shenzhen Components Ltd",
                    "carrier": "Maersk",
                    "lines": [
                        {"id": "line-1", "description": "Housings", "unit_value": 12.0, "quantity": 500},
                        {"id": "line-2", "description": "Fasteners", "unit_value": 4.0, "quantity": 500}
                    ],
                    "costs": {"freight": 1800.0, "insurance": 240.0, "customs_fees": 410.0, "storage": 150.0, "other": 0.0}
                }))
                .expect("payload"),
            ))
            .expect("request")
    }

    #[tokio::test]
    async fn create_then_list_with_filters() {
        let router = build_router();

        let response = router
            .clone()
            .oneshot(create_request("PO-7741"))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/import-shipments?q=7741&status=ordered&carrier=Maersk")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        let items = payload.get("items").and_then(Value::as_array).expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].get("reference").and_then(Value::as_str),
            Some("PO-7741")
        );
    }

    #[tokio::test]
    async fn allocate_costs_accepts_the_camel_case_contract() {
        let router = build_router();

        let created = json_body(
            router
                .clone()
                .oneshot(create_request("PO-7741"))
                .await
                .expect("dispatch"),
        )
        .await;
        let id = created
            .get("id")
            .and_then(|value| value.as_str())
            .expect("id assigned")
            .to_string();

        let allocate = Request::builder()
            .method("POST")
            .uri(format!("/api/import-shipments/{id}/allocate-costs"))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({
                    "allocationMethod": "custom",
                    "customAllocations": [
                        {"lineId": "line-1", "share": 30},
                        {"lineId": "line-2", "share": 0}
                    ]
                }))
                .expect("payload"),
            ))
            .expect("request");

        let response = router.clone().oneshot(allocate).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        let lines = payload.get("lines").and_then(Value::as_array).expect("lines");
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].get("share_pct").and_then(Value::as_f64),
            Some(100.0)
        );
        assert_eq!(lines[1].get("amount").and_then(Value::as_f64), Some(0.0));
    }

    #[tokio::test]
    async fn stats_endpoint_reports_counters() {
        let router = build_router();
        router
            .clone()
            .oneshot(create_request("PO-7741"))
            .await
            .expect("dispatch");

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/import-shipments/stats")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload.get("total").and_then(Value::as_u64), Some(1));
        assert_eq!(
            payload.get("pending_allocation").and_then(Value::as_u64),
            Some(1)
        );
    }

    #[tokio::test]
    async fn customs_event_for_unknown_shipment_is_not_found() {
        let router = build_router();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/import-shipments/shp-missing/customs-events")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&json!({
                            "kind": "inspection",
                            "occurred_on": "2026-04-02",
                            "location": "Rotterdam"
                        }))
                        .expect("payload"),
                    ))
                    .expect("request"),
            )
            .await
            .expect("dispatch");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
