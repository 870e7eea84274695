//! Download of the JPX listed-issues workbook

use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::AppError;

/// Where the raw workbook bytes come from
#[async_trait]
pub trait WorkbookSource: Send + Sync {
    async fn download(&self) -> Result<Vec<u8>, AppError>;
}

/// Fetches the workbook from JPX with a single GET, no retries
#[derive(Clone)]
pub struct JpxFetcher {
    client: reqwest::Client,
    url: String,
}

impl JpxFetcher {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.jpx_download_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config.jpx_data_url.clone()))
    }

    pub fn with_client(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WorkbookSource for JpxFetcher {
    async fn download(&self) -> Result<Vec<u8>, AppError> {
        tracing::info!("📥 Downloading JPX listed issues from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::Download(format!("JPX request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("⚠️ JPX download returned {}", status);
            return Err(AppError::Download(format!(
                "JPX file download failed: HTTP {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Download(format!("Failed to read JPX response body: {}", e)))?;

        tracing::info!("✅ Downloaded JPX workbook ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }
}
