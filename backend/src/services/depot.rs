//! Depot data-source resolution and reseller summaries
//!
//! Line aggregates can come from three places, tried in a strict order:
//! the precomputed detail view, a raw reconstruction from the move ledger,
//! and finally an approximation from the live stock snapshot. Whichever
//! tier answers, the caller gets the same row shape and cannot tell the
//! tiers apart. Only a missing relation (Postgres 42P01) or an empty
//! result advances the chain; genuine database errors propagate.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tokio::task::JoinSet;
use uuid::Uuid;

use shared::models::{
    DepotLine, Move, MoveType, ProductIdentity, StockSummary, VatRegime,
};
use shared::{ledger, rollup};

use crate::error::{is_undefined_table, AppResult};

/// Depot service resolving line aggregates and reseller summaries
#[derive(Clone)]
pub struct DepotService {
    db: PgPool,
}

/// Criteria for one stock's line detail
#[derive(Debug, Clone)]
pub struct LineCriteria {
    pub stock_id: Uuid,
    /// Free-text filter on product name / SKU
    pub q: Option<String>,
}

/// Ordered fallback chain for line detail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTier {
    /// Precomputed per-line detail view
    DetailView,
    /// Reconstruction from consignments x moves x products
    RawReconstruction,
    /// Live on-hand snapshot; lines not yet valorized through the ledger
    LiveStock,
}

impl DetailTier {
    pub const CHAIN: [DetailTier; 3] = [
        DetailTier::DetailView,
        DetailTier::RawReconstruction,
        DetailTier::LiveStock,
    ];
}

/// Result of trying one tier
#[derive(Debug)]
pub enum TierOutcome {
    Applicable(Vec<DepotLine>),
    NotApplicable,
}

/// Reseller/stock identity used to label summaries
#[derive(Debug, Clone, FromRow)]
pub struct StockIdentity {
    pub stock_id: Uuid,
    pub stock_name: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
}

/// Row of the precomputed detail view
#[derive(Debug, FromRow)]
struct DetailViewRow {
    consignment_id: Uuid,
    stock_id: Uuid,
    product_id: Uuid,
    product_name: String,
    sku: Option<String>,
    serial: Option<String>,
    pro_price: Option<Decimal>,
    qty_en_depot: Decimal,
    qty_facture_non_payee: Decimal,
    montant_ht: Option<Decimal>,
    tva_normal: Option<Decimal>,
    tva_marge: Option<Decimal>,
    unit_price_ht: Option<Decimal>,
    vat_rate: Option<Decimal>,
    vat_regime: Option<String>,
    last_move_at: Option<DateTime<Utc>>,
}

impl DetailViewRow {
    fn into_line(self) -> DepotLine {
        // A present last-move price means the line went through the ledger;
        // its regime label (possibly null) canonicalizes like anywhere else.
        let (regime, unit_price) = match self.unit_price_ht {
            Some(ht) => {
                let regime = VatRegime::normalize(self.vat_regime.as_deref());
                let rate = self.vat_rate.unwrap_or(Decimal::ZERO);
                (
                    Some(regime),
                    Some(shared::display_unit_price(ht, rate, regime)),
                )
            }
            None => (None, None),
        };
        let total_line_price =
            unit_price.map(|unit| shared::total_line_price(unit, self.qty_en_depot));

        DepotLine {
            consignment_id: Some(self.consignment_id),
            stock_id: self.stock_id,
            product_id: self.product_id,
            product_name: self.product_name,
            sku: self.sku,
            serial: self.serial,
            qty_en_depot: self.qty_en_depot,
            qty_facture_non_payee: self.qty_facture_non_payee,
            montant_ht: self.montant_ht,
            tva_normal: self.tva_normal,
            tva_marge: self.tva_marge,
            vat_regime: regime,
            unit_price,
            total_line_price,
            pro_price: self.pro_price,
            last_move_at: self.last_move_at,
        }
    }
}

/// Row of the consignment x move x product join used for reconstruction.
/// Move columns are nullable because the join keeps consignments that have
/// no moves yet.
#[derive(Debug, FromRow)]
struct ReconstructionRow {
    consignment_id: Uuid,
    stock_id: Uuid,
    product_id: Uuid,
    product_name: String,
    sku: Option<String>,
    serial: Option<String>,
    pro_price: Option<Decimal>,
    move_id: Option<Uuid>,
    move_type: Option<String>,
    qty: Option<Decimal>,
    unit_price_ht: Option<Decimal>,
    vat_rate: Option<Decimal>,
    vat_regime: Option<String>,
    move_created_at: Option<DateTime<Utc>>,
}

/// Row of the live stock snapshot
#[derive(Debug, FromRow)]
struct LiveStockRow {
    stock_id: Uuid,
    product_id: Uuid,
    product_name: String,
    sku: Option<String>,
    serial: Option<String>,
    pro_price: Option<Decimal>,
    qty_on_hand: Decimal,
}

/// Row of the precomputed summary view
#[derive(Debug, FromRow)]
struct SummaryRow {
    stock_id: Uuid,
    stock_name: String,
    customer_id: Option<Uuid>,
    customer_name: Option<String>,
    line_count: i64,
    qty_en_depot: Decimal,
    ttc_normale: Option<Decimal>,
    ttc_marge: Option<Decimal>,
    ttc_cumul: Option<Decimal>,
}

impl DepotService {
    /// Create a new DepotService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Resolve line detail for one stock through the fallback chain.
    /// Returns the tier that answered along with the rows.
    pub async fn fetch_lines(
        &self,
        criteria: &LineCriteria,
    ) -> AppResult<(DetailTier, Vec<DepotLine>)> {
        for tier in DetailTier::CHAIN {
            match self.try_tier(tier, criteria).await? {
                TierOutcome::Applicable(lines) => {
                    tracing::debug!(?tier, stock_id = %criteria.stock_id, rows = lines.len(),
                        "depot detail resolved");
                    return Ok((tier, lines));
                }
                TierOutcome::NotApplicable => {
                    tracing::debug!(?tier, stock_id = %criteria.stock_id,
                        "depot detail tier not applicable, advancing");
                }
            }
        }

        // The live tier is terminal and always applicable; this is only
        // reachable if the chain constant is emptied.
        Ok((DetailTier::LiveStock, Vec::new()))
    }

    /// Try a single tier in isolation.
    pub async fn try_tier(
        &self,
        tier: DetailTier,
        criteria: &LineCriteria,
    ) -> AppResult<TierOutcome> {
        match tier {
            DetailTier::DetailView => self.fetch_detail_view(criteria).await,
            DetailTier::RawReconstruction => self.reconstruct_from_moves(criteria).await,
            DetailTier::LiveStock => self.approximate_from_live_stock(criteria).await,
        }
    }

    /// Tier 1: precomputed per-line detail view.
    async fn fetch_detail_view(&self, criteria: &LineCriteria) -> AppResult<TierOutcome> {
        let pattern = like_pattern(criteria.q.as_deref());
        let result = sqlx::query_as::<_, DetailViewRow>(
            r#"
            SELECT consignment_id, stock_id, product_id, product_name, sku, serial,
                   pro_price, qty_en_depot, qty_facture_non_payee,
                   montant_ht, tva_normal, tva_marge,
                   unit_price_ht, vat_rate, vat_regime, last_move_at
            FROM depot_line_detail
            WHERE stock_id = $1
              AND ($2::text IS NULL OR product_name ILIKE $2 OR sku ILIKE $2)
            ORDER BY product_name, consignment_id
            "#,
        )
        .bind(criteria.stock_id)
        .bind(&pattern)
        .fetch_all(&self.db)
        .await;

        match result {
            Ok(rows) if rows.is_empty() => Ok(TierOutcome::NotApplicable),
            Ok(rows) => Ok(TierOutcome::Applicable(
                rows.into_iter().map(DetailViewRow::into_line).collect(),
            )),
            Err(err) if is_undefined_table(&err) => Ok(TierOutcome::NotApplicable),
            Err(err) => Err(err.into()),
        }
    }

    /// Tier 2: reconstruct equivalent rows from the move ledger and fold
    /// them per consignment. The free-text filter is applied post-hoc over
    /// the reconstructed rows.
    async fn reconstruct_from_moves(&self, criteria: &LineCriteria) -> AppResult<TierOutcome> {
        let result = sqlx::query_as::<_, ReconstructionRow>(
            r#"
            SELECT c.id AS consignment_id, c.stock_id, c.product_id,
                   p.name AS product_name, p.sku, p.serial, p.pro_price,
                   m.id AS move_id, m.move_type, m.qty,
                   m.unit_price_ht, m.vat_rate, m.vat_regime,
                   m.created_at AS move_created_at
            FROM consignments c
            JOIN products p ON p.id = c.product_id
            LEFT JOIN consignment_moves m ON m.consignment_id = c.id
            WHERE c.stock_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(criteria.stock_id)
        .fetch_all(&self.db)
        .await;

        let rows = match result {
            Ok(rows) if rows.is_empty() => return Ok(TierOutcome::NotApplicable),
            Ok(rows) => rows,
            Err(err) if is_undefined_table(&err) => return Ok(TierOutcome::NotApplicable),
            Err(err) => return Err(err.into()),
        };

        // Group the flat join per consignment, keeping first-seen order.
        let mut order: Vec<Uuid> = Vec::new();
        let mut grouped: HashMap<Uuid, (ReconstructionKey, Vec<Move>)> = HashMap::new();

        for row in rows {
            let entry = grouped.entry(row.consignment_id).or_insert_with(|| {
                order.push(row.consignment_id);
                (
                    ReconstructionKey {
                        stock_id: row.stock_id,
                        product_id: row.product_id,
                        product: ProductIdentity {
                            name: row.product_name.clone(),
                            sku: row.sku.clone(),
                            serial: row.serial.clone(),
                            pro_price: row.pro_price,
                        },
                    },
                    Vec::new(),
                )
            });

            let (Some(move_id), Some(raw_type), Some(qty), Some(created_at)) =
                (row.move_id, row.move_type.as_deref(), row.qty, row.move_created_at)
            else {
                continue;
            };

            match MoveType::parse(raw_type) {
                Some(move_type) => entry.1.push(Move {
                    id: move_id,
                    consignment_id: row.consignment_id,
                    move_type,
                    qty,
                    unit_price_ht: row.unit_price_ht.unwrap_or(Decimal::ZERO),
                    vat_rate: row.vat_rate.unwrap_or(Decimal::ZERO),
                    vat_regime: row.vat_regime.clone(),
                    created_at,
                }),
                None => {
                    tracing::warn!(%move_id, raw_type, "unknown move type in ledger, skipping move");
                }
            }
        }

        let mut lines = Vec::with_capacity(order.len());
        for consignment_id in order {
            if let Some((key, moves)) = grouped.remove(&consignment_id) {
                let agg = ledger::reconcile(consignment_id, key.stock_id, key.product_id, &moves);
                lines.push(DepotLine::from_aggregate(agg, key.product));
            }
        }

        if let Some(q) = criteria.q.as_deref() {
            lines.retain(|line| line.matches_query(q));
        }

        Ok(TierOutcome::Applicable(lines))
    }

    /// Tier 3: minimal rows from the live on-hand snapshot and product
    /// master price. Monetary fields stay null to mark the lines as not yet
    /// valorized through the ledger. Terminal tier.
    async fn approximate_from_live_stock(&self, criteria: &LineCriteria) -> AppResult<TierOutcome> {
        let pattern = like_pattern(criteria.q.as_deref());
        let result = sqlx::query_as::<_, LiveStockRow>(
            r#"
            SELECT si.stock_id, si.product_id, p.name AS product_name,
                   p.sku, p.serial, p.pro_price, si.qty_on_hand
            FROM stock_items si
            JOIN products p ON p.id = si.product_id
            WHERE si.stock_id = $1
              AND ($2::text IS NULL OR p.name ILIKE $2 OR p.sku ILIKE $2)
            ORDER BY p.name
            "#,
        )
        .bind(criteria.stock_id)
        .bind(&pattern)
        .fetch_all(&self.db)
        .await;

        let rows = match result {
            Ok(rows) => rows,
            Err(err) if is_undefined_table(&err) => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let lines = rows
            .into_iter()
            .map(|row| DepotLine {
                consignment_id: None,
                stock_id: row.stock_id,
                product_id: row.product_id,
                product_name: row.product_name,
                sku: row.sku,
                serial: row.serial,
                qty_en_depot: row.qty_on_hand,
                qty_facture_non_payee: Decimal::ZERO,
                montant_ht: None,
                tva_normal: None,
                tva_marge: None,
                vat_regime: None,
                unit_price: None,
                total_line_price: None,
                pro_price: row.pro_price,
                last_move_at: None,
            })
            .collect();

        Ok(TierOutcome::Applicable(lines))
    }

    /// Reseller summaries from the precomputed summary view. A missing
    /// relation is a successful empty result, never an error, so the UI can
    /// still list known resellers by identity alone.
    pub async fn fetch_summaries(
        &self,
        customer_id: Option<Uuid>,
    ) -> AppResult<Vec<StockSummary>> {
        let result = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT stock_id, stock_name, customer_id, customer_name,
                   line_count, qty_en_depot, ttc_normale, ttc_marge, ttc_cumul
            FROM depot_stock_summary
            WHERE ($1::uuid IS NULL OR customer_id = $1)
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.db)
        .await;

        let rows = match result {
            Ok(rows) => rows,
            Err(err) if is_undefined_table(&err) => {
                tracing::debug!("summary view missing, returning empty summary set");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        Ok(rows
            .into_iter()
            .map(|row| StockSummary {
                stock_id: row.stock_id,
                stock_name: row.stock_name,
                customer_id: row.customer_id,
                customer_name: row.customer_name,
                line_count: row.line_count,
                qty_en_depot: row.qty_en_depot,
                ttc_normale: row.ttc_normale,
                ttc_marge: row.ttc_marge,
                ttc_cumul: row.ttc_cumul,
            })
            .collect())
    }

    /// Identity lookup for one stock. A failure here is a partial
    /// enrichment failure: the summary degrades to an unlabeled row instead
    /// of failing the response.
    pub async fn stock_identity(&self, stock_id: Uuid) -> Option<StockIdentity> {
        let result = sqlx::query_as::<_, StockIdentity>(
            r#"
            SELECT s.id AS stock_id, s.name AS stock_name,
                   s.customer_id, c.name AS customer_name
            FROM stocks s
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE s.id = $1
            "#,
        )
        .bind(stock_id)
        .fetch_optional(&self.db)
        .await;

        match result {
            Ok(identity) => identity,
            Err(err) => {
                tracing::warn!(%stock_id, error = %err, "stock identity lookup failed, degrading");
                None
            }
        }
    }

    /// List stocks visible under the given filter.
    pub async fn list_stocks(&self, customer_id: Option<Uuid>) -> AppResult<Vec<StockIdentity>> {
        let stocks = sqlx::query_as::<_, StockIdentity>(
            r#"
            SELECT s.id AS stock_id, s.name AS stock_name,
                   s.customer_id, c.name AS customer_name
            FROM stocks s
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE ($1::uuid IS NULL OR s.customer_id = $1)
            ORDER BY s.name
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(stocks)
    }

    /// Build one stock's summary from its resolved lines, enriched with
    /// reseller identity where available.
    pub async fn summarize_one_stock(
        &self,
        stock_id: Uuid,
        lines: &[DepotLine],
    ) -> StockSummary {
        let identity = self.stock_identity(stock_id).await;
        let (stock_name, customer_id, customer_name) = match identity {
            Some(identity) => (identity.stock_name, identity.customer_id, identity.customer_name),
            None => (String::new(), None, None),
        };
        rollup::summarize_stock(stock_id, stock_name, customer_id, customer_name, lines)
    }

    /// Fetch line detail for every visible stock concurrently. One stock's
    /// failure degrades that stock to an empty line set; it never blocks or
    /// fails the others, and there is no retry.
    pub async fn fetch_all_lines(
        &self,
        customer_id: Option<Uuid>,
        q: Option<String>,
    ) -> AppResult<Vec<DepotLine>> {
        let stocks = self.list_stocks(customer_id).await?;

        let mut tasks = JoinSet::new();
        for stock in &stocks {
            let service = self.clone();
            let criteria = LineCriteria {
                stock_id: stock.stock_id,
                q: q.clone(),
            };
            tasks.spawn(async move {
                let stock_id = criteria.stock_id;
                (stock_id, service.fetch_lines(&criteria).await)
            });
        }

        let mut by_stock: HashMap<Uuid, Vec<DepotLine>> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((stock_id, Ok((_tier, lines)))) => {
                    by_stock.insert(stock_id, lines);
                }
                Ok((stock_id, Err(err))) => {
                    tracing::warn!(%stock_id, error = %err,
                        "detail fetch failed for stock, degrading to empty line set");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "detail fetch task panicked, degrading");
                }
            }
        }

        // Reassemble in stock display order.
        let mut lines = Vec::new();
        for stock in stocks {
            if let Some(stock_lines) = by_stock.remove(&stock.stock_id) {
                lines.extend(stock_lines);
            }
        }
        Ok(lines)
    }
}

#[derive(Debug)]
struct ReconstructionKey {
    stock_id: Uuid,
    product_id: Uuid,
    product: ProductIdentity,
}

fn like_pattern(q: Option<&str>) -> Option<String> {
    q.map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", q))
}
