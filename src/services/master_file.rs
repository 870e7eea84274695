//! Render and load the persisted TSE master (`tse-stocks.json`)

use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{MasterFile, TickerRecord};

/// Serialize a ticker list as the master file, stamped with `generated_date`.
/// Records keep the order they were given in.
pub fn render_master(stocks: &[TickerRecord], generated_date: NaiveDate) -> Result<String, AppError> {
    let master = MasterFile::new(stocks.to_vec(), generated_date);
    let mut content = serde_json::to_string_pretty(&master)?;
    content.push('\n');
    Ok(content)
}

/// Load a master file previously written by [`render_master`]
pub fn parse_master(content: &str) -> Result<MasterFile, AppError> {
    let master: MasterFile = serde_json::from_str(content)
        .map_err(|e| AppError::Internal(format!("Invalid TSE master file: {}", e)))?;

    if master.metadata.generated_date.is_none() {
        return Err(AppError::Internal(
            "Invalid TSE master file: metadata.generatedDate is missing".to_string(),
        ));
    }

    if master.metadata.total != master.stocks.len() {
        tracing::warn!(
            "⚠️ TSE master metadata says {} stocks but the file lists {}",
            master.metadata.total,
            master.stocks.len()
        );
    }

    Ok(master)
}
