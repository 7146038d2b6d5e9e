use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::allocation::{allocate, AllocationError, AllocationRequest, CostAllocation};
use super::domain::{
    CustomsEvent, ImportShipment, NewShipment, ShipmentId, ShipmentStats, ShipmentStatus,
};
use super::repository::{RepositoryError, ShipmentRepository};

static SHIPMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_shipment_id() -> ShipmentId {
    let id = SHIPMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ShipmentId(format!("shp-{id:06}"))
}

/// Filters accepted by the shipment listing. `q` matches reference and
/// supplier case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ShipmentFilter {
    pub q: Option<String>,
    pub status: Option<ShipmentStatus>,
    pub carrier: Option<String>,
}

/// Error raised by the shipment service.
#[derive(Debug, thiserror::Error)]
pub enum ShipmentServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

/// Service composing the repository and the landed-cost allocator.
pub struct ShipmentService<R> {
    repository: Arc<R>,
}

impl<R> ShipmentService<R>
where
    R: ShipmentRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create(&self, draft: NewShipment) -> Result<ImportShipment, ShipmentServiceError> {
        let shipment = ImportShipment {
            id: next_shipment_id(),
            reference: draft.reference,
            supplier: draft.supplier,
            carrier: draft.carrier,
            status: ShipmentStatus::Ordered,
            expected_arrival: draft.expected_arrival,
            lines: draft.lines,
            costs: draft.costs,
            customs_events: Vec::new(),
            allocation: None,
        };
        Ok(self.repository.insert(shipment)?)
    }

    pub fn fetch(&self, id: &ShipmentId) -> Result<ImportShipment, ShipmentServiceError> {
        Ok(self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    pub fn list(&self, filter: &ShipmentFilter) -> Result<Vec<ImportShipment>, ShipmentServiceError> {
        let needle = filter
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        Ok(self
            .repository
            .list()?
            .into_iter()
            .filter(|shipment| {
                filter
                    .status
                    .map(|status| shipment.status == status)
                    .unwrap_or(true)
            })
            .filter(|shipment| {
                filter
                    .carrier
                    .as_deref()
                    .map(|carrier| shipment.carrier.eq_ignore_ascii_case(carrier))
                    .unwrap_or(true)
            })
            .filter(|shipment| match &needle {
                Some(needle) => {
                    shipment.reference.to_lowercase().contains(needle)
                        || shipment.supplier.to_lowercase().contains(needle)
                }
                None => true,
            })
            .collect())
    }

    pub fn stats(&self) -> Result<ShipmentStats, ShipmentServiceError> {
        let shipments = self.repository.list()?;

        let count_status = |status: ShipmentStatus| {
            shipments
                .iter()
                .filter(|shipment| shipment.status == status)
                .count()
        };

        Ok(ShipmentStats {
            total: shipments.len(),
            ordered: count_status(ShipmentStatus::Ordered),
            in_transit: count_status(ShipmentStatus::InTransit),
            at_customs: count_status(ShipmentStatus::AtCustoms),
            cleared: count_status(ShipmentStatus::Cleared),
            delivered: count_status(ShipmentStatus::Delivered),
            total_landed_cost: shipments
                .iter()
                .map(|shipment| shipment.costs.landed_total())
                .sum(),
            pending_allocation: shipments
                .iter()
                .filter(|shipment| shipment.allocation.is_none())
                .count(),
        })
    }

    /// Append a customs event and move the shipment to the status the event
    /// implies, when it implies one.
    pub fn append_customs_event(
        &self,
        id: &ShipmentId,
        event: CustomsEvent,
    ) -> Result<ImportShipment, ShipmentServiceError> {
        let mut shipment = self.fetch(id)?;
        if let Some(status) = event.kind.implied_status() {
            shipment.status = status;
        }
        shipment.customs_events.push(event);
        self.repository.update(shipment.clone())?;
        Ok(shipment)
    }

    /// Run the allocator over the shipment's landed-cost total and persist
    /// the outcome on the shipment.
    pub fn allocate_costs(
        &self,
        id: &ShipmentId,
        request: AllocationRequest,
    ) -> Result<CostAllocation, ShipmentServiceError> {
        let mut shipment = self.fetch(id)?;
        let total = shipment.costs.landed_total();

        let lines = allocate(
            total,
            &shipment.lines,
            request.allocation_method,
            request.custom_allocations.as_deref(),
        )?;

        let allocation = CostAllocation {
            method: request.allocation_method,
            total,
            lines,
        };

        shipment.allocation = Some(allocation.clone());
        self.repository.update(shipment)?;
        Ok(allocation)
    }
}
