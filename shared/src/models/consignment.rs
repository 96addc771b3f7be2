//! Consignment and move models
//!
//! A consignment is one product line physically held at a third-party
//! reseller's location. Its history is an append-only stream of typed moves;
//! moves are never mutated or deleted in normal operation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::VatRegime;

/// Typed stock/billing event against a consignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    /// Stock left for the reseller
    Out,
    /// Stock came back unsold
    Return,
    /// Reseller was invoiced for sold stock
    Invoice,
    /// Invoice was settled
    Payment,
}

impl MoveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveType::Out => "out",
            MoveType::Return => "return",
            MoveType::Invoice => "invoice",
            MoveType::Payment => "payment",
        }
    }

    /// Parse the stored wire form. Unknown labels are surfaced as `None`
    /// rather than silently coerced; the caller decides how to flag them.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "out" => Some(MoveType::Out),
            "return" => Some(MoveType::Return),
            "invoice" => Some(MoveType::Invoice),
            "payment" => Some(MoveType::Payment),
            _ => None,
        }
    }
}

/// One stock/billing event. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Move {
    pub id: Uuid,
    pub consignment_id: Uuid,
    pub move_type: MoveType,
    /// Quantity as recorded (>= 0 in well-formed data)
    pub qty: Decimal,
    pub unit_price_ht: Decimal,
    /// VAT rate as a decimal fraction (0.20 for 20%)
    pub vat_rate: Decimal,
    /// Raw regime label as recorded; canonicalized via `VatRegime::normalize`
    pub vat_regime: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One product line held at one reseller location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consignment {
    pub id: Uuid,
    pub stock_id: Uuid,
    pub product_id: Uuid,
    pub customer_id: Option<Uuid>,
}

/// Pricing snapshot taken from the most recent move of a consignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastMove {
    pub unit_price_ht: Decimal,
    pub vat_rate: Decimal,
    pub vat_regime: VatRegime,
    pub created_at: DateTime<Utc>,
}

/// Derived per-line totals; recomputed on every read, never persisted as
/// source of truth. Pure function of the move history, so recomputing from
/// the same moves always yields identical results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsignmentLineAggregate {
    pub consignment_id: Uuid,
    pub stock_id: Uuid,
    pub product_id: Uuid,
    /// Out minus returns. Negative values are passed through unclamped as a
    /// signal of upstream data inconsistency.
    pub qty_en_depot: Decimal,
    /// Invoiced minus paid
    pub qty_facture_non_payee: Decimal,
    pub montant_ht: Decimal,
    pub tva_normal: Decimal,
    pub tva_marge: Decimal,
    pub last_move: Option<LastMove>,
}
