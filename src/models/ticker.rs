use serde::{Deserialize, Serialize};

/// Suffix Yahoo-style quote providers use for Tokyo listings
pub const TSE_SUFFIX: &str = ".T";

/// A single TSE listing as kept in the master list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerRecord {
    pub symbol: String,
    pub name: String,
}

impl TickerRecord {
    /// Build a record from a bare 4-digit exchange code
    pub fn from_code(code: &str, name: &str) -> Self {
        Self {
            symbol: format!("{}{}", code, TSE_SUFFIX),
            name: name.to_string(),
        }
    }

    /// Symbol without the market suffix (e.g. "7203")
    pub fn code(&self) -> &str {
        self.symbol.strip_suffix(TSE_SUFFIX).unwrap_or(&self.symbol)
    }
}

/// Ordered, symbol-unique list of listings
pub type TickerList = Vec<TickerRecord>;

/// Set difference between the committed master and a freshly parsed candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub added: Vec<TickerRecord>,
    pub removed: Vec<TickerRecord>,
    pub total_before: usize,
    pub total_after: usize,
    pub unchanged: usize,
}

impl DiffResult {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Which header detection strategy located the code/name columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStrategy {
    /// Header row found by matching code/name labels
    Labels,
    /// Nothing matched; fixed row 0 / column 1 / column 2 layout used
    Positional,
}

impl HeaderStrategy {
    pub fn is_fallback(&self) -> bool {
        matches!(self, HeaderStrategy::Positional)
    }
}

/// Where the parser read its data from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderLayout {
    pub strategy: HeaderStrategy,
    pub header_row: usize,
    pub code_column: usize,
    pub name_column: usize,
}

/// Parser output: the normalized list plus the layout diagnostic
#[derive(Debug, Clone)]
pub struct ParsedWorkbook {
    pub stocks: TickerList,
    pub layout: HeaderLayout,
}

/// Search hit returned by the local stock search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSearchResult {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    #[serde(rename = "type")]
    pub security_type: String,
}
