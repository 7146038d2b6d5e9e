//! Import shipment tracking: customs event timelines, dashboard counters,
//! and landed-cost allocation across purchase-order lines.

pub mod allocation;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use allocation::{
    allocate, build_custom_allocations, AllocatedLine, AllocationError, AllocationMethod,
    AllocationRequest, CostAllocation, CustomAllocation,
};
pub use domain::{
    CustomsEvent, CustomsEventKind, ImportShipment, NewShipment, PurchaseOrderLine, ShipmentCosts,
    ShipmentId, ShipmentStats, ShipmentStatus,
};
pub use repository::{RepositoryError, ShipmentRepository};
pub use router::shipment_router;
pub use service::{ShipmentFilter, ShipmentService, ShipmentServiceError};
