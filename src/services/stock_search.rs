//! Substring search over the local TSE master

use crate::models::{StockSearchResult, TickerRecord, TSE_SUFFIX};

pub const MAX_RESULTS: usize = 10;

pub fn contains_non_ascii(s: &str) -> bool {
    !s.is_ascii()
}

/// Map full-width ASCII variants (U+FF01..=U+FF5E) to their half-width form.
/// JPX names use full-width letters and digits, e.g. "ＫＤＤＩ".
pub fn normalize_full_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Search by name (Japanese input) or by code prefix / name (ASCII input)
pub fn search_local_stocks(stocks: &[TickerRecord], query: &str) -> Vec<StockSearchResult> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let lower_query = trimmed.to_lowercase();
    let normalized_query = normalize_full_width(&lower_query);
    let non_ascii = contains_non_ascii(trimmed);

    stocks
        .iter()
        .filter(|stock| {
            let normalized_name = normalize_full_width(&stock.name.to_lowercase());

            if non_ascii {
                stock.name.contains(trimmed) || normalized_name.contains(&normalized_query)
            } else {
                stock.code().starts_with(trimmed)
                    || stock.symbol.to_lowercase().starts_with(&lower_query)
                    || normalized_name.contains(&normalized_query)
            }
        })
        .take(MAX_RESULTS)
        .map(|stock| StockSearchResult {
            symbol: stock.symbol.clone(),
            name: stock.name.clone(),
            exchange: "Tokyo".to_string(),
            security_type: "EQUITY".to_string(),
        })
        .collect()
}

/// Exact lookup by code or full symbol
pub fn find_by_symbol<'a>(stocks: &'a [TickerRecord], symbol: &str) -> Option<&'a TickerRecord> {
    let target = symbol.trim().to_uppercase();
    let target = if target.ends_with(TSE_SUFFIX) {
        target
    } else {
        format!("{}{}", target, TSE_SUFFIX)
    };
    stocks.iter().find(|s| s.symbol == target)
}
