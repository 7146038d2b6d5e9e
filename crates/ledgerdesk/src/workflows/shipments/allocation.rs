//! Landed-cost allocation: spread a shipment's total cost across its
//! purchase-order lines by line value, line quantity, or user-entered
//! shares. Shares are normalized so percentages sum to 100, and currency
//! amounts are computed in integer cents with cumulative rounding so the
//! allocated amounts reproduce the total exactly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::PurchaseOrderLine;

/// How the landed cost is spread across lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMethod {
    Value,
    Quantity,
    Custom,
}

impl AllocationMethod {
    pub const fn label(self) -> &'static str {
        match self {
            AllocationMethod::Value => "value",
            AllocationMethod::Quantity => "quantity",
            AllocationMethod::Custom => "custom",
        }
    }
}

/// One user-entered share for the custom method. The wire shape is
/// camelCase because that is the request contract callers already speak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAllocation {
    pub line_id: String,
    pub share: f64,
}

/// Allocation request body: `{allocationMethod, customAllocations?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    pub allocation_method: AllocationMethod,
    #[serde(default)]
    pub custom_allocations: Option<Vec<CustomAllocation>>,
}

/// Result row: normalized percentage and exact currency amount per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatedLine {
    pub line_id: String,
    pub share_pct: f64,
    pub amount: f64,
}

/// Stored outcome of an allocation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAllocation {
    pub method: AllocationMethod,
    pub total: f64,
    pub lines: Vec<AllocatedLine>,
}

/// Rejections for degenerate allocations. The client this service replaced
/// sent requests through unchecked and left validation entirely to the
/// server; this is that validation.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("shipment has no purchase-order lines to allocate across")]
    NoLines,
    #[error("custom allocation requires customAllocations shares")]
    MissingShares,
    #[error("allocation basis sums to zero for method {method}")]
    ZeroBasis { method: &'static str },
    #[error("share for unknown purchase-order line '{line_id}'")]
    UnknownLine { line_id: String },
    #[error("negative share {share} for line '{line_id}'")]
    NegativeShare { line_id: String, share: f64 },
}

/// Build the custom-share list the allocator consumes: one entry per
/// purchase-order line in order, unset lines defaulting to share 0, never
/// omitted.
pub fn build_custom_allocations(
    lines: &[PurchaseOrderLine],
    shares: &HashMap<String, f64>,
) -> Vec<CustomAllocation> {
    lines
        .iter()
        .map(|line| CustomAllocation {
            line_id: line.id.clone(),
            share: shares.get(&line.id).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Spread `total` across `lines` using the requested method.
pub fn allocate(
    total: f64,
    lines: &[PurchaseOrderLine],
    method: AllocationMethod,
    custom: Option<&[CustomAllocation]>,
) -> Result<Vec<AllocatedLine>, AllocationError> {
    if lines.is_empty() {
        return Err(AllocationError::NoLines);
    }

    let weights = line_weights(lines, method, custom)?;
    let basis: f64 = weights.iter().sum();
    if basis <= 0.0 {
        return Err(AllocationError::ZeroBasis {
            method: method.label(),
        });
    }

    let total_cents = to_cents(total);
    let mut allocated = Vec::with_capacity(lines.len());
    let mut cumulative_weight = 0.0;
    let mut cumulative_cents: i64 = 0;

    for (line, weight) in lines.iter().zip(weights) {
        cumulative_weight += weight;
        let target_cents = (total_cents as f64 * cumulative_weight / basis).round() as i64;
        let amount_cents = target_cents - cumulative_cents;
        cumulative_cents = target_cents;

        allocated.push(AllocatedLine {
            line_id: line.id.clone(),
            share_pct: weight / basis * 100.0,
            amount: from_cents(amount_cents),
        });
    }

    Ok(allocated)
}

fn line_weights(
    lines: &[PurchaseOrderLine],
    method: AllocationMethod,
    custom: Option<&[CustomAllocation]>,
) -> Result<Vec<f64>, AllocationError> {
    match method {
        AllocationMethod::Value => Ok(lines.iter().map(PurchaseOrderLine::line_value).collect()),
        AllocationMethod::Quantity => Ok(lines.iter().map(|line| f64::from(line.quantity)).collect()),
        AllocationMethod::Custom => {
            let entries = custom.ok_or(AllocationError::MissingShares)?;

            // Duplicate entries for a line: last one wins.
            let mut by_line: HashMap<&str, f64> = HashMap::new();
            for entry in entries {
                if !lines.iter().any(|line| line.id == entry.line_id) {
                    return Err(AllocationError::UnknownLine {
                        line_id: entry.line_id.clone(),
                    });
                }
                if entry.share < 0.0 {
                    return Err(AllocationError::NegativeShare {
                        line_id: entry.line_id.clone(),
                        share: entry.share,
                    });
                }
                by_line.insert(entry.line_id.as_str(), entry.share);
            }

            Ok(lines
                .iter()
                .map(|line| by_line.get(line.id.as_str()).copied().unwrap_or(0.0))
                .collect())
        }
    }
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}
