//! Rollups of line aggregates into per-stock and global totals
//!
//! Buckets are keyed by the canonical VAT regime already carried on the
//! lines. Only lines with a strictly positive total contribute; zero and
//! negative totals are excluded from both buckets (established policy of
//! the billing data, recorded in DESIGN.md).

use rust_decimal::Decimal;

use crate::models::{DepotLine, GlobalTotals, StockSummary, StockTotals, VatRegime};

/// Sum the displayed line totals of one stock into per-regime TTC buckets.
pub fn per_stock_totals(lines: &[DepotLine]) -> StockTotals {
    let mut ttc_normale = Decimal::ZERO;
    let mut ttc_marge = Decimal::ZERO;

    for line in lines {
        let total = match line.total_line_price {
            Some(total) if total > Decimal::ZERO => total,
            _ => continue,
        };
        match line.vat_regime.unwrap_or_default() {
            VatRegime::Normal => ttc_normale += total,
            VatRegime::Marge => ttc_marge += total,
        }
    }

    StockTotals {
        ttc_normale,
        ttc_marge,
        ttc_cumul: ttc_normale + ttc_marge,
    }
}

/// Roll one stock's lines up into its summary row.
pub fn summarize_stock(
    stock_id: uuid::Uuid,
    stock_name: String,
    customer_id: Option<uuid::Uuid>,
    customer_name: Option<String>,
    lines: &[DepotLine],
) -> StockSummary {
    let totals = per_stock_totals(lines);
    let qty_en_depot = lines.iter().map(|l| l.qty_en_depot).sum();

    StockSummary {
        stock_id,
        stock_name,
        customer_id,
        customer_name,
        line_count: lines.len() as i64,
        qty_en_depot,
        ttc_normale: Some(totals.ttc_normale),
        ttc_marge: Some(totals.ttc_marge),
        ttc_cumul: Some(totals.ttc_cumul),
    }
}

/// Elementwise sum of the per-stock totals over every visible stock.
pub fn global_totals(summaries: &[StockSummary]) -> GlobalTotals {
    let mut totals = GlobalTotals::default();
    for summary in summaries {
        totals.ttc_normale += summary.ttc_normale.unwrap_or(Decimal::ZERO);
        totals.ttc_marge += summary.ttc_marge.unwrap_or(Decimal::ZERO);
    }
    totals.ttc_cumul = totals.ttc_normale + totals.ttc_marge;
    totals
}

/// Total display order: cumulative TTC descending, ties by name ascending
/// (case-insensitive). Zero-amount entries sink to the bottom by virtue of
/// the descending sort rather than any special case.
pub fn sort_summaries(summaries: &mut [StockSummary]) {
    summaries.sort_by(|a, b| {
        b.cumul_or_zero()
            .cmp(&a.cumul_or_zero())
            .then_with(|| sort_name(a).cmp(&sort_name(b)))
    });
}

fn sort_name(summary: &StockSummary) -> String {
    summary
        .customer_name
        .as_deref()
        .unwrap_or(&summary.stock_name)
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(total: Option<&str>, regime: Option<VatRegime>) -> DepotLine {
        DepotLine {
            consignment_id: Some(Uuid::nil()),
            stock_id: Uuid::nil(),
            product_id: Uuid::nil(),
            product_name: "item".to_string(),
            sku: None,
            serial: None,
            qty_en_depot: Decimal::ONE,
            qty_facture_non_payee: Decimal::ZERO,
            montant_ht: None,
            tva_normal: None,
            tva_marge: None,
            vat_regime: regime,
            unit_price: None,
            total_line_price: total.map(dec),
            pro_price: None,
            last_move_at: None,
        }
    }

    fn summary(name: &str, cumul: Option<&str>) -> StockSummary {
        let totals = cumul.map(dec);
        StockSummary {
            stock_id: Uuid::new_v4(),
            stock_name: name.to_string(),
            customer_id: None,
            customer_name: None,
            line_count: 0,
            qty_en_depot: Decimal::ZERO,
            ttc_normale: totals,
            ttc_marge: Some(Decimal::ZERO),
            ttc_cumul: totals,
        }
    }

    #[test]
    fn test_buckets_split_by_regime() {
        let lines = vec![
            line(Some("200"), Some(VatRegime::Normal)),
            line(Some("120"), Some(VatRegime::Marge)),
        ];
        let totals = per_stock_totals(&lines);
        assert_eq!(totals.ttc_normale, dec("200"));
        assert_eq!(totals.ttc_marge, dec("120"));
        assert_eq!(totals.ttc_cumul, dec("320"));
    }

    #[test]
    fn test_zero_negative_and_unvalorized_lines_excluded() {
        let lines = vec![
            line(Some("0"), Some(VatRegime::Normal)),
            line(Some("-50"), Some(VatRegime::Marge)),
            line(None, Some(VatRegime::Normal)),
            line(Some("10"), Some(VatRegime::Normal)),
        ];
        let totals = per_stock_totals(&lines);
        assert_eq!(totals.ttc_normale, dec("10"));
        assert_eq!(totals.ttc_marge, Decimal::ZERO);
        assert_eq!(totals.ttc_cumul, dec("10"));
    }

    #[test]
    fn test_global_totals_sum_elementwise() {
        let summaries = vec![summary("a", Some("100")), summary("b", Some("40"))];
        let totals = global_totals(&summaries);
        assert_eq!(totals.ttc_normale, dec("140"));
        assert_eq!(totals.ttc_cumul, dec("140"));
    }

    #[test]
    fn test_sort_descending_with_name_tiebreak() {
        let mut summaries = vec![
            summary("Zoe", Some("50")),
            summary("anna", Some("50")),
            summary("empty", None),
            summary("Big", Some("900")),
        ];
        sort_summaries(&mut summaries);
        let names: Vec<_> = summaries.iter().map(|s| s.stock_name.as_str()).collect();
        assert_eq!(names, vec!["Big", "anna", "Zoe", "empty"]);
    }
}
