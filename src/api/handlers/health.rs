//! Health endpoint reflecting the secrets backend

use axum::{extract::State, Json};
use tracing::warn;

use crate::api::{error::ApiError, routes::ApiState};
use crate::secrets::HealthStatus;

/// `GET /health`: a fresh backend health snapshot.
///
/// 200 with the normalized status document, or 500 with the probe error as plain text.
pub async fn health_handler(
    State(state): State<ApiState>,
) -> Result<Json<HealthStatus>, ApiError> {
    let status = state.health_probe.query().await.inspect_err(|e| {
        warn!(error = %e, "Backend health probe failed");
    })?;
    Ok(Json(status))
}
