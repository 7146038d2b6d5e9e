use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::allocation::CostAllocation;

/// Identifier wrapper for import shipments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShipmentId(pub String);

/// Progress of a shipment from purchase order to the warehouse dock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Ordered,
    InTransit,
    AtCustoms,
    Cleared,
    Delivered,
}

impl ShipmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ShipmentStatus::Ordered => "ordered",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::AtCustoms => "at_customs",
            ShipmentStatus::Cleared => "cleared",
            ShipmentStatus::Delivered => "delivered",
        }
    }
}

/// One purchase-order line the landed cost is spread across.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub id: String,
    pub description: String,
    pub unit_value: f64,
    pub quantity: u32,
}

impl PurchaseOrderLine {
    pub fn line_value(&self) -> f64 {
        self.unit_value * f64::from(self.quantity)
    }
}

/// Cost breakdown captured per shipment. The sum is the landed cost that
/// allocation spreads across the purchase-order lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentCosts {
    pub freight: f64,
    pub insurance: f64,
    pub customs_fees: f64,
    pub storage: f64,
    pub other: f64,
}

impl ShipmentCosts {
    pub fn landed_total(&self) -> f64 {
        self.freight + self.insurance + self.customs_fees + self.storage + self.other
    }
}

/// Milestone recorded while a shipment moves through customs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomsEventKind {
    Inspection,
    HoldPlaced,
    HoldReleased,
    DutyAssessed,
    Cleared,
}

impl CustomsEventKind {
    /// Status the shipment should sit in after this event, if the event
    /// implies one.
    pub const fn implied_status(self) -> Option<ShipmentStatus> {
        match self {
            CustomsEventKind::Inspection
            | CustomsEventKind::HoldPlaced
            | CustomsEventKind::DutyAssessed => Some(ShipmentStatus::AtCustoms),
            CustomsEventKind::Cleared => Some(ShipmentStatus::Cleared),
            CustomsEventKind::HoldReleased => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomsEvent {
    pub kind: CustomsEventKind,
    pub occurred_on: NaiveDate,
    pub location: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A tracked inbound shipment with its cost breakdown, customs timeline,
/// and the allocation once one has been computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportShipment {
    pub id: ShipmentId,
    pub reference: String,
    pub supplier: String,
    pub carrier: String,
    pub status: ShipmentStatus,
    pub expected_arrival: Option<NaiveDate>,
    pub lines: Vec<PurchaseOrderLine>,
    pub costs: ShipmentCosts,
    pub customs_events: Vec<CustomsEvent>,
    pub allocation: Option<CostAllocation>,
}

/// Inbound fields for creating a shipment; the service assigns id, status,
/// and the empty customs timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShipment {
    pub reference: String,
    pub supplier: String,
    pub carrier: String,
    #[serde(default)]
    pub expected_arrival: Option<NaiveDate>,
    pub lines: Vec<PurchaseOrderLine>,
    #[serde(default)]
    pub costs: ShipmentCosts,
}

/// Aggregate counters for the shipment dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentStats {
    pub total: usize,
    pub ordered: usize,
    pub in_transit: usize,
    pub at_customs: usize,
    pub cleared: usize,
    pub delivered: usize,
    pub total_landed_cost: f64,
    pub pending_allocation: usize,
}
