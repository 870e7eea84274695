//! TSE master update pipeline: download → parse → sanity check → diff → (render → persist)

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::models::{DiffResult, HeaderLayout, MasterFile, MasterStatus, ParsedWorkbook};
use crate::services::diff::compute_diff;
use crate::services::jpx_fetcher::WorkbookSource;
use crate::services::jpx_parser::parse_workbook;
use crate::services::master_file::render_master;
use crate::services::master_store::MasterStore;

const STATUS_SAMPLE_SIZE: usize = 5;

pub const REBUILD_NOTICE: &str =
    "Master file updated. Restart or redeploy the service for the new list to take effect.";

pub type WorkbookParser = fn(&[u8]) -> Result<ParsedWorkbook, AppError>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub diff: DiffResult,
    pub fetched_at: DateTime<Utc>,
    pub header_strategy: HeaderLayout,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    pub success: bool,
    pub diff: DiffResult,
    pub updated_at: DateTime<Utc>,
    pub message: String,
    pub header_strategy: HeaderLayout,
}

/// Owns the master snapshot loaded at startup and runs update pipelines against it
#[derive(Clone)]
pub struct TseMasterService {
    source: Arc<dyn WorkbookSource>,
    store: Arc<dyn MasterStore>,
    parser: WorkbookParser,
    current: Arc<MasterFile>,
    min_stock_count: usize,
    commit_lock: Arc<Mutex<()>>,
}

impl TseMasterService {
    pub fn new(
        source: Arc<dyn WorkbookSource>,
        store: Arc<dyn MasterStore>,
        current: MasterFile,
        min_stock_count: usize,
    ) -> Self {
        Self {
            source,
            store,
            parser: parse_workbook,
            current: Arc::new(current),
            min_stock_count,
            commit_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Swap the workbook parser so tests can feed canned lists through fake bytes
    #[cfg(test)]
    pub fn with_parser(mut self, parser: WorkbookParser) -> Self {
        self.parser = parser;
        self
    }

    /// Snapshot of the master as loaded at startup
    pub fn current(&self) -> &MasterFile {
        &self.current
    }

    pub fn status(&self) -> MasterStatus {
        MasterStatus {
            total_stocks: self.current.stocks.len(),
            generated_date: self.current.metadata.generated_date,
            sample_stocks: self.current.sample(STATUS_SAMPLE_SIZE).to_vec(),
        }
    }

    /// Diff the live JPX list against the current master without writing anything
    pub async fn preview(&self) -> Result<PreviewResult, AppError> {
        let candidate = self.fetch_candidate().await?;
        let diff = self.diff_against_current(&candidate);

        Ok(PreviewResult {
            diff,
            fetched_at: Utc::now(),
            header_strategy: candidate.layout,
        })
    }

    /// Fetch, diff and overwrite the persisted master with the candidate
    pub async fn commit(&self) -> Result<CommitResult, AppError> {
        // Commits are serialized; a second caller waits for the first to finish
        let _guard = self.commit_lock.lock().await;

        let candidate = self.fetch_candidate().await?;
        let diff = self.diff_against_current(&candidate);

        let content = render_master(&candidate.stocks, Utc::now().date_naive())?;
        self.store.save(&content).await?;

        tracing::info!(
            "✅ TSE master committed: {} stocks (+{} / -{})",
            candidate.stocks.len(),
            diff.added.len(),
            diff.removed.len()
        );

        Ok(CommitResult {
            success: true,
            diff,
            updated_at: Utc::now(),
            message: REBUILD_NOTICE.to_string(),
            header_strategy: candidate.layout,
        })
    }

    async fn fetch_candidate(&self) -> Result<ParsedWorkbook, AppError> {
        let bytes = self.source.download().await?;

        let parser = self.parser;
        let parsed = tokio::task::spawn_blocking(move || parser(&bytes))
            .await
            .map_err(|e| AppError::Internal(format!("Parser task failed: {}", e)))??;

        if parsed.layout.strategy.is_fallback() {
            tracing::warn!(
                "⚠️ JPX header row not found; fell back to row {} / code column {} / name column {}. The file format may have changed.",
                parsed.layout.header_row,
                parsed.layout.code_column,
                parsed.layout.name_column
            );
        } else {
            tracing::debug!("JPX header detected at {:?}", parsed.layout);
        }

        tracing::info!("📊 Parsed {} TSE stocks from JPX workbook", parsed.stocks.len());
        check_sanity(parsed.stocks.len(), self.min_stock_count)?;

        Ok(parsed)
    }

    fn diff_against_current(&self, candidate: &ParsedWorkbook) -> DiffResult {
        let diff = compute_diff(&self.current.stocks, &candidate.stocks);
        if !diff.has_changes() {
            tracing::info!("✅ JPX list matches the current master");
        }
        tracing::info!(
            "🔍 TSE diff: {} added, {} removed, {} unchanged ({} → {})",
            diff.added.len(),
            diff.removed.len(),
            diff.unchanged,
            diff.total_before,
            diff.total_after
        );
        diff
    }
}

/// Refuse candidates too small to be a real TSE listing
pub fn check_sanity(count: usize, min_stock_count: usize) -> Result<(), AppError> {
    if count < min_stock_count {
        return Err(AppError::SanityCheck(format!(
            "Too few stocks fetched ({} < {}). Check the JPX data format.",
            count, min_stock_count
        )));
    }
    Ok(())
}
