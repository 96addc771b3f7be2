//! Common wire types used across the platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DepotLine, GlobalTotals, StockSummary};

/// Filters accepted by the depot read operation, echoed back in the
/// response metadata so callers can see what was actually applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepotFilter {
    pub stock_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    /// Free-text filter on product name / SKU
    pub q: Option<String>,
    pub detail: bool,
}

/// Metadata attached to every depot response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub user_role: String,
    pub can_view_vat: bool,
    pub filters: DepotFilter,
}

/// Response of the depot read operation.
///
/// The shape is identical regardless of which data-source tier answered;
/// a missing precomputed summary relation yields `ok: true` with an empty
/// `summary`, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepotResponse {
    pub ok: bool,
    pub summary: Vec<StockSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Vec<DepotLine>>,
    /// Cross-stock totals over every stock in `summary`; returned as an
    /// explicit value rather than broadcast out-of-band. Absent for callers
    /// without the VAT capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<GlobalTotals>,
    pub meta: ResponseMeta,
}
