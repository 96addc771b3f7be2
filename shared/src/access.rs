//! Role-based redaction of monetary fields
//!
//! Whether a caller may see amounts is resolved outside this crate and
//! arrives as a single boolean capability. [`VatVisibility`] is derived from
//! it once per request and applied at exactly one point per response path,
//! just before serialization. A redacted record cannot be un-redacted, so
//! the filter is never reapplied.

use serde::{Deserialize, Serialize};

use crate::models::{DepotLine, GlobalTotals, StockSummary};

/// Resolved VAT capability of the current caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatVisibility {
    Visible,
    Hidden,
}

impl VatVisibility {
    pub fn from_capability(can_view_vat: bool) -> Self {
        if can_view_vat {
            VatVisibility::Visible
        } else {
            VatVisibility::Hidden
        }
    }

    /// Redact one line. Nulls exactly the monetary/valuation fields
    /// (montant_ht, tva_normal, tva_marge, pro_price, vat_regime,
    /// unit_price, total_line_price); identity and quantity fields pass
    /// through untouched.
    pub fn apply_line(self, line: DepotLine) -> DepotLine {
        match self {
            VatVisibility::Visible => line,
            VatVisibility::Hidden => DepotLine {
                montant_ht: None,
                tva_normal: None,
                tva_marge: None,
                pro_price: None,
                vat_regime: None,
                unit_price: None,
                total_line_price: None,
                ..line
            },
        }
    }

    pub fn apply_lines(self, lines: Vec<DepotLine>) -> Vec<DepotLine> {
        lines.into_iter().map(|line| self.apply_line(line)).collect()
    }

    /// Redact one summary row; reseller identity and quantities stay visible.
    pub fn apply_summary(self, summary: StockSummary) -> StockSummary {
        match self {
            VatVisibility::Visible => summary,
            VatVisibility::Hidden => StockSummary {
                ttc_normale: None,
                ttc_marge: None,
                ttc_cumul: None,
                ..summary
            },
        }
    }

    pub fn apply_summaries(self, summaries: Vec<StockSummary>) -> Vec<StockSummary> {
        summaries
            .into_iter()
            .map(|summary| self.apply_summary(summary))
            .collect()
    }

    /// Global totals are withheld entirely from callers without the
    /// capability.
    pub fn apply_totals(self, totals: GlobalTotals) -> Option<GlobalTotals> {
        match self {
            VatVisibility::Visible => Some(totals),
            VatVisibility::Hidden => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VatRegime;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn full_line() -> DepotLine {
        DepotLine {
            consignment_id: Some(Uuid::from_u128(1)),
            stock_id: Uuid::from_u128(2),
            product_id: Uuid::from_u128(3),
            product_name: "Amp head".to_string(),
            sku: Some("AMP-01".to_string()),
            serial: Some("S123".to_string()),
            qty_en_depot: Decimal::TWO,
            qty_facture_non_payee: Decimal::ONE,
            montant_ht: Some(Decimal::from(200)),
            tva_normal: Some(Decimal::from(40)),
            tva_marge: Some(Decimal::ZERO),
            vat_regime: Some(VatRegime::Normal),
            unit_price: Some(Decimal::from(100)),
            total_line_price: Some(Decimal::from(200)),
            pro_price: Some(Decimal::from(80)),
            last_move_at: None,
        }
    }

    #[test]
    fn test_visible_is_identity() {
        let line = full_line();
        assert_eq!(VatVisibility::Visible.apply_line(line.clone()), line);
    }

    #[test]
    fn test_hidden_nulls_exactly_the_monetary_fields() {
        let redacted = VatVisibility::Hidden.apply_line(full_line());
        assert!(redacted.montant_ht.is_none());
        assert!(redacted.tva_normal.is_none());
        assert!(redacted.tva_marge.is_none());
        assert!(redacted.pro_price.is_none());
        assert!(redacted.vat_regime.is_none());
        assert!(redacted.unit_price.is_none());
        assert!(redacted.total_line_price.is_none());
        // Everything else is untouched.
        let original = full_line();
        assert_eq!(redacted.consignment_id, original.consignment_id);
        assert_eq!(redacted.product_name, original.product_name);
        assert_eq!(redacted.sku, original.sku);
        assert_eq!(redacted.serial, original.serial);
        assert_eq!(redacted.qty_en_depot, original.qty_en_depot);
        assert_eq!(redacted.qty_facture_non_payee, original.qty_facture_non_payee);
    }

    #[test]
    fn test_hidden_is_idempotent() {
        let once = VatVisibility::Hidden.apply_line(full_line());
        let twice = VatVisibility::Hidden.apply_line(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_summary_redaction_keeps_identity() {
        let summary = StockSummary {
            stock_id: Uuid::from_u128(9),
            stock_name: "Atelier Sud".to_string(),
            customer_id: Some(Uuid::from_u128(10)),
            customer_name: Some("Reverb SARL".to_string()),
            line_count: 4,
            qty_en_depot: Decimal::TEN,
            ttc_normale: Some(Decimal::from(200)),
            ttc_marge: Some(Decimal::from(120)),
            ttc_cumul: Some(Decimal::from(320)),
        };
        let redacted = VatVisibility::Hidden.apply_summary(summary.clone());
        assert!(redacted.ttc_cumul.is_none());
        assert_eq!(redacted.customer_name, summary.customer_name);
        assert_eq!(redacted.qty_en_depot, summary.qty_en_depot);
    }

    #[test]
    fn test_totals_withheld_when_hidden() {
        let totals = GlobalTotals::default();
        assert!(VatVisibility::Hidden.apply_totals(totals).is_none());
        assert!(VatVisibility::Visible.apply_totals(totals).is_some());
    }
}
