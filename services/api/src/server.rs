use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryExpenseRepository, InMemoryShipmentRepository};
use crate::routes::with_back_office_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ledgerdesk::config::AppConfig;
use ledgerdesk::error::AppError;
use ledgerdesk::telemetry;
use ledgerdesk::workflows::expenses::ExpenseService;
use ledgerdesk::workflows::shipments::ShipmentService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let expense_repository = Arc::new(InMemoryExpenseRepository::default());
    let expense_service = Arc::new(ExpenseService::new(
        expense_repository,
        config.api.default_page_size,
    ));

    let shipment_repository = Arc::new(InMemoryShipmentRepository::default());
    let shipment_service = Arc::new(ShipmentService::new(shipment_repository));

    let app = with_back_office_routes(expense_service, shipment_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "back office service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
