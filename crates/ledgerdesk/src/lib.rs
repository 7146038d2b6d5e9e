//! Back-office service library for expense management and import shipment
//! costing: policy evaluation, receipt capture heuristics, CSV import/export,
//! and landed-cost allocation, exposed over HTTP by `services/api`.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
