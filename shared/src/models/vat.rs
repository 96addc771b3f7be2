//! VAT regime canonicalization and display-price resolution
//!
//! Source data carries the tax regime as a free-form label. Everything
//! downstream of this module works with the canonical [`VatRegime`] enum;
//! [`VatRegime::normalize`] is the single place a raw label is interpreted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The two tax computation schemes.
///
/// `Normal` taxes the full sale price; `Marge` (margin scheme) taxes only the
/// resale margin and is typically used for second-hand goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VatRegime {
    #[default]
    Normal,
    Marge,
}

impl VatRegime {
    /// Canonicalize a free-form regime label. Total and idempotent: any
    /// case/whitespace variant of "marge", "margin" or "tvm" maps to `Marge`,
    /// everything else (missing, empty, unrecognized) maps to `Normal`.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw {
            Some(label) => match label.trim().to_lowercase().as_str() {
                "margin" | "marge" | "tvm" => VatRegime::Marge,
                _ => VatRegime::Normal,
            },
            None => VatRegime::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VatRegime::Normal => "normal",
            VatRegime::Marge => "marge",
        }
    }
}

/// Display unit price for a line, branching on regime.
///
/// Margin-scheme items are shown as a TTC-equivalent figure
/// (`ht + ht * vat_rate`); normal-regime items keep the HT price unchanged.
pub fn display_unit_price(unit_price_ht: Decimal, vat_rate: Decimal, regime: VatRegime) -> Decimal {
    match regime {
        VatRegime::Marge => unit_price_ht + unit_price_ht * vat_rate,
        VatRegime::Normal => unit_price_ht,
    }
}

/// Total displayed price for a line.
///
/// For normal-regime lines this figure feeds the ttc-normale rollup bucket
/// even though no VAT was added here; that is the established convention of
/// the billing data and is kept as-is.
pub fn total_line_price(unit_price: Decimal, qty_en_depot: Decimal) -> Decimal {
    unit_price * qty_en_depot
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_normalize_marge_variants() {
        for label in ["marge", "MARGE", " Marge ", "margin", "MARGIN", "tvm", "TVM", "\ttvm\n"] {
            assert_eq!(VatRegime::normalize(Some(label)), VatRegime::Marge, "{label:?}");
        }
    }

    #[test]
    fn test_normalize_defaults_to_normal() {
        for label in [None, Some(""), Some("   "), Some("normal"), Some("standard"), Some("tva")] {
            assert_eq!(VatRegime::normalize(label), VatRegime::Normal, "{label:?}");
        }
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in [Some("Marge"), Some("whatever"), None] {
            let once = VatRegime::normalize(raw);
            let twice = VatRegime::normalize(Some(once.as_str()));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_display_unit_price_normal_unchanged() {
        assert_eq!(
            display_unit_price(dec("100"), dec("0.20"), VatRegime::Normal),
            dec("100")
        );
    }

    #[test]
    fn test_display_unit_price_marge_includes_vat() {
        assert_eq!(
            display_unit_price(dec("100"), dec("0.20"), VatRegime::Marge),
            dec("120.00")
        );
    }

    #[test]
    fn test_total_line_price() {
        assert_eq!(total_line_price(dec("100"), dec("2")), dec("200"));
        assert_eq!(total_line_price(dec("120.00"), dec("1")), dec("120.00"));
    }
}
