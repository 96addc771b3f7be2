//! Presentation rows and rollup totals for the depot screens
//!
//! These are the shapes returned to callers regardless of which data-source
//! tier produced them. Monetary fields are optional for two reasons: the
//! live-stock approximation tier leaves lines "not yet valorized through the
//! ledger", and VAT redaction nulls them for callers without the capability.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{display_unit_price, total_line_price, ConsignmentLineAggregate, VatRegime};

/// Product identity fields merged into a presented line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductIdentity {
    pub name: String,
    pub sku: Option<String>,
    pub serial: Option<String>,
    pub pro_price: Option<Decimal>,
}

/// One consignment line as presented to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepotLine {
    /// Absent when the line was approximated from live stock only
    pub consignment_id: Option<Uuid>,
    pub stock_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: Option<String>,
    pub serial: Option<String>,
    pub qty_en_depot: Decimal,
    pub qty_facture_non_payee: Decimal,
    pub montant_ht: Option<Decimal>,
    pub tva_normal: Option<Decimal>,
    pub tva_marge: Option<Decimal>,
    /// Canonical regime of the last known pricing
    pub vat_regime: Option<VatRegime>,
    /// Display unit price (TTC-equivalent for margin-scheme lines)
    pub unit_price: Option<Decimal>,
    pub total_line_price: Option<Decimal>,
    /// Product master professional price
    pub pro_price: Option<Decimal>,
    pub last_move_at: Option<DateTime<Utc>>,
}

impl DepotLine {
    /// Merge a reconciled aggregate with product identity into a presented
    /// line. Pricing comes from the last known move; a consignment with no
    /// moves displays a zero unit price.
    pub fn from_aggregate(agg: ConsignmentLineAggregate, product: ProductIdentity) -> Self {
        let (vat_regime, unit_price, last_move_at) = match &agg.last_move {
            Some(last) => {
                let regime = last.vat_regime;
                let unit = display_unit_price(last.unit_price_ht, last.vat_rate, regime);
                (Some(regime), unit, Some(last.created_at))
            }
            None => (None, Decimal::ZERO, None),
        };

        DepotLine {
            consignment_id: Some(agg.consignment_id),
            stock_id: agg.stock_id,
            product_id: agg.product_id,
            product_name: product.name,
            sku: product.sku,
            serial: product.serial,
            qty_en_depot: agg.qty_en_depot,
            qty_facture_non_payee: agg.qty_facture_non_payee,
            montant_ht: Some(agg.montant_ht),
            tva_normal: Some(agg.tva_normal),
            tva_marge: Some(agg.tva_marge),
            vat_regime,
            unit_price: Some(unit_price),
            total_line_price: Some(total_line_price(unit_price, agg.qty_en_depot)),
            pro_price: product.pro_price,
            last_move_at,
        }
    }

    /// Case-insensitive free-text match on product name / SKU
    pub fn matches_query(&self, q: &str) -> bool {
        let needle = q.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.product_name.to_lowercase().contains(&needle)
            || self
                .sku
                .as_deref()
                .is_some_and(|sku| sku.to_lowercase().contains(&needle))
    }
}

/// Per-stock TTC totals split by regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockTotals {
    pub ttc_normale: Decimal,
    pub ttc_marge: Decimal,
    pub ttc_cumul: Decimal,
}

/// Cross-stock totals; same shape as the per-stock rollup
pub type GlobalTotals = StockTotals;

/// Per-reseller rollup, optionally merged with reseller identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSummary {
    pub stock_id: Uuid,
    pub stock_name: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub line_count: i64,
    pub qty_en_depot: Decimal,
    pub ttc_normale: Option<Decimal>,
    pub ttc_marge: Option<Decimal>,
    pub ttc_cumul: Option<Decimal>,
}

impl StockSummary {
    /// Sort key amount; redacted or not-yet-valorized summaries count as zero
    pub fn cumul_or_zero(&self) -> Decimal {
        self.ttc_cumul.unwrap_or(Decimal::ZERO)
    }
}
