//! Admin endpoints for the TSE master list

use axum::{extract::State, http::HeaderMap, Json};

use crate::error::AppError;
use crate::models::MasterStatus;
use crate::services::tse_master::{CommitResult, PreviewResult};
use crate::AppState;

/// Check the static admin key. Runs before any network or file I/O.
pub fn require_admin(admin_api_key: Option<&str>, headers: &HeaderMap) -> Result<(), AppError> {
    let admin_key = admin_api_key.ok_or_else(|| {
        AppError::Config("Admin features are not configured (ADMIN_API_KEY is not set)".to_string())
    })?;

    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Authentication failed".to_string()))?;

    if token != admin_key {
        return Err(AppError::Unauthorized("Authentication failed".to_string()));
    }

    Ok(())
}

/// GET /api/admin/tse-stocks/status - Current master size and generation date
pub async fn get_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MasterStatus>, AppError> {
    require_admin(state.config.admin_api_key.as_deref(), &headers)?;
    Ok(Json(state.tse_master.status()))
}

/// POST /api/admin/tse-stocks/preview - Diff live JPX data against the master
pub async fn preview(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PreviewResult>, AppError> {
    require_admin(state.config.admin_api_key.as_deref(), &headers)?;
    tracing::info!("🔎 TSE master preview requested");

    let result = state.tse_master.preview().await?;
    Ok(Json(result))
}

/// POST /api/admin/tse-stocks/update - Regenerate the master from live JPX data
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CommitResult>, AppError> {
    require_admin(state.config.admin_api_key.as_deref(), &headers)?;
    tracing::info!("📝 TSE master update requested");

    let result = state.tse_master.commit().await?;
    Ok(Json(result))
}
