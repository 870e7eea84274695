use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ticker::{TickerList, TickerRecord};

pub const MASTER_NOTICE: &str =
    "This file is auto-generated by the TSE master update. Do not edit manually.";

/// Metadata block at the top of the persisted master.
/// `generated_date` is `None` only for the placeholder used when no file exists yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterMetadata {
    pub generated_date: Option<NaiveDate>,
    pub total: usize,
}

/// Persisted TSE master list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterFile {
    #[serde(default)]
    pub notice: String,
    pub metadata: MasterMetadata,
    pub stocks: TickerList,
}

impl MasterFile {
    pub fn new(stocks: TickerList, generated_date: NaiveDate) -> Self {
        Self {
            notice: MASTER_NOTICE.to_string(),
            metadata: MasterMetadata {
                generated_date: Some(generated_date),
                total: stocks.len(),
            },
            stocks,
        }
    }

    /// Placeholder for a master that has never been generated
    pub fn empty() -> Self {
        Self {
            notice: MASTER_NOTICE.to_string(),
            metadata: MasterMetadata {
                generated_date: None,
                total: 0,
            },
            stocks: Vec::new(),
        }
    }

    pub fn sample(&self, n: usize) -> &[TickerRecord] {
        &self.stocks[..self.stocks.len().min(n)]
    }
}

/// Response for GET /api/admin/tse-stocks/status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterStatus {
    pub total_stocks: usize,
    pub generated_date: Option<NaiveDate>,
    pub sample_stocks: Vec<TickerRecord>,
}
