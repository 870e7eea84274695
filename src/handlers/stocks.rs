//! Public lookups against the TSE master loaded at startup

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{StockSearchResult, TickerRecord};
use crate::services::stock_search::{find_by_symbol, search_local_stocks};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /api/stocks/search?q= - Autocomplete over the local master
pub async fn search_stocks(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<StockSearchResult>> {
    let q = query.q.unwrap_or_default();
    Json(search_local_stocks(&state.tse_master.current().stocks, &q))
}

/// GET /api/stocks/:symbol - Exact lookup by code ("7203") or symbol ("7203.T")
pub async fn get_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<TickerRecord>, AppError> {
    find_by_symbol(&state.tse_master.current().stocks, &symbol)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Stock {} not found", symbol)))
}
