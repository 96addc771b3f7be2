//! HTTP handlers for the depot read operation

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::StockSummary;
use shared::{rollup, DepotFilter, DepotResponse, ResponseMeta, VatVisibility};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::depot::{DepotService, LineCriteria};
use crate::AppState;

/// Query parameters of the depot read operation
#[derive(Debug, Deserialize)]
pub struct DepotQuery {
    pub stock_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    /// Free-text filter on product name / SKU
    pub q: Option<String>,
    /// 1 to include per-line detail
    #[serde(default)]
    pub detail: u8,
}

/// Consignment summary and optional line detail for one reseller stock or
/// for every stock the caller may see. The VAT redaction is applied here,
/// exactly once, on every path out of this handler.
pub async fn get_depots(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<DepotQuery>,
) -> AppResult<Json<DepotResponse>> {
    if params.detail > 1 {
        return Err(AppError::Validation(
            "detail must be 0 or 1".to_string(),
        ));
    }

    let service = DepotService::new(state.db.clone());
    let visibility = VatVisibility::from_capability(current_user.0.can_view_vat);
    let want_detail = params.detail == 1;

    let filters = DepotFilter {
        stock_id: params.stock_id,
        customer_id: params.customer_id,
        q: params.q.clone(),
        detail: want_detail,
    };

    let (mut summaries, detail): (Vec<StockSummary>, _) = match params.stock_id {
        Some(stock_id) => {
            let criteria = LineCriteria {
                stock_id,
                q: params.q.clone(),
            };
            let (_tier, lines) = service.fetch_lines(&criteria).await?;
            let summary = service.summarize_one_stock(stock_id, &lines).await;
            (vec![summary], want_detail.then_some(lines))
        }
        None => {
            let summaries = service.fetch_summaries(params.customer_id).await?;
            let detail = if want_detail {
                Some(
                    service
                        .fetch_all_lines(params.customer_id, params.q.clone())
                        .await?,
                )
            } else {
                None
            };
            (summaries, detail)
        }
    };

    rollup::sort_summaries(&mut summaries);
    let totals = rollup::global_totals(&summaries);

    Ok(Json(DepotResponse {
        ok: true,
        summary: visibility.apply_summaries(summaries),
        detail: detail.map(|lines| visibility.apply_lines(lines)),
        totals: visibility.apply_totals(totals),
        meta: ResponseMeta {
            user_role: current_user.0.role,
            can_view_vat: current_user.0.can_view_vat,
            filters,
        },
    }))
}
