//! Move reconciliation engine
//!
//! Folds the append-only move history of one consignment into a single line
//! aggregate. The fold is a pure function of the move set: every summed
//! field is invariant under permutation of the input, only the `last_move`
//! selection looks at timestamps. Nothing here clamps or repairs the data;
//! a negative running quantity is surfaced as-is so callers can see the
//! upstream inconsistency.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{ConsignmentLineAggregate, LastMove, Move, MoveType, VatRegime};

/// Fold all moves of one consignment into its line aggregate.
///
/// Moves may arrive in any order. Quantity rules: `Out` adds to and `Return`
/// subtracts from the quantity on depot; `Invoice` adds to and `Payment`
/// subtracts from the invoiced-not-paid quantity. Monetary rules: `Out` and
/// `Invoice` recognize `unit_price_ht * qty`, `Payment` reverses it, and
/// `Return` has no monetary effect (matching the recorded billing history;
/// see the returns policy note in DESIGN.md). Each monetary delta also
/// routes its VAT share into the normal or margin bucket per the move's
/// normalized regime.
pub fn reconcile(
    consignment_id: Uuid,
    stock_id: Uuid,
    product_id: Uuid,
    moves: &[Move],
) -> ConsignmentLineAggregate {
    let mut qty_en_depot = Decimal::ZERO;
    let mut qty_facture_non_payee = Decimal::ZERO;
    let mut montant_ht = Decimal::ZERO;
    let mut tva_normal = Decimal::ZERO;
    let mut tva_marge = Decimal::ZERO;
    let mut last: Option<&Move> = None;

    for mv in moves {
        match mv.move_type {
            MoveType::Out => qty_en_depot += mv.qty,
            MoveType::Return => qty_en_depot -= mv.qty,
            MoveType::Invoice => qty_facture_non_payee += mv.qty,
            MoveType::Payment => qty_facture_non_payee -= mv.qty,
        }

        let delta = match mv.move_type {
            MoveType::Out | MoveType::Invoice => mv.unit_price_ht * mv.qty,
            MoveType::Payment => -(mv.unit_price_ht * mv.qty),
            MoveType::Return => Decimal::ZERO,
        };

        if mv.move_type != MoveType::Return {
            montant_ht += delta;
            match VatRegime::normalize(mv.vat_regime.as_deref()) {
                VatRegime::Normal => tva_normal += delta * mv.vat_rate,
                VatRegime::Marge => tva_marge += delta * mv.vat_rate,
            }
        }

        // Latest move wins; ties on created_at break by id so the selection
        // is stable for any input order.
        let newer = match last {
            None => true,
            Some(prev) => (mv.created_at, mv.id) > (prev.created_at, prev.id),
        };
        if newer {
            last = Some(mv);
        }
    }

    if qty_en_depot < Decimal::ZERO || qty_facture_non_payee < Decimal::ZERO {
        // Inconsistent source data; surfaced unclamped.
        tracing::warn!(
            %consignment_id,
            %qty_en_depot,
            %qty_facture_non_payee,
            "negative running quantity in move history"
        );
    }

    ConsignmentLineAggregate {
        consignment_id,
        stock_id,
        product_id,
        qty_en_depot,
        qty_facture_non_payee,
        montant_ht,
        tva_normal,
        tva_marge,
        last_move: last.map(|mv| LastMove {
            unit_price_ht: mv.unit_price_ht,
            vat_rate: mv.vat_rate,
            vat_regime: VatRegime::normalize(mv.vat_regime.as_deref()),
            created_at: mv.created_at,
        }),
    }
}
