//! Storage for the persisted master file

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::MasterFile;
use crate::services::master_file::parse_master;

#[async_trait]
pub trait MasterStore: Send + Sync {
    async fn load(&self) -> Result<MasterFile, AppError>;

    /// Replace the stored master with `contents` as a whole
    async fn save(&self, contents: &str) -> Result<(), AppError>;
}

/// Master kept as a JSON file on local disk
#[derive(Debug, Clone)]
pub struct FileMasterStore {
    path: PathBuf,
}

impl FileMasterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "tse-stocks.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl MasterStore for FileMasterStore {
    async fn load(&self) -> Result<MasterFile, AppError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AppError::NotFound(format!("TSE master file {} does not exist", self.path.display()))
            } else {
                AppError::Internal(format!("Failed to read {}: {}", self.path.display(), e))
            }
        })?;

        parse_master(&content)
    }

    async fn save(&self, contents: &str) -> Result<(), AppError> {
        let temp = self.temp_path();

        // Write beside the target, then rename over it so readers never see a half-written file
        if let Err(e) = tokio::fs::write(&temp, contents).await {
            return Err(persist_error(&self.path, e));
        }
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(persist_error(&self.path, e));
        }

        tracing::info!("💾 Wrote TSE master to {}", self.path.display());
        Ok(())
    }
}

fn persist_error(path: &Path, err: std::io::Error) -> AppError {
    tracing::error!("❌ Failed to write TSE master {}: {}", path.display(), err);

    if err.kind() == ErrorKind::ReadOnlyFilesystem {
        AppError::Persist(format!(
            "{} is on a read-only filesystem. Run the update in a development environment with write access.",
            path.display()
        ))
    } else {
        AppError::Persist(format!(
            "Failed to write {}: {}. Run the update where the master file is writable.",
            path.display(),
            err
        ))
    }
}
