use std::sync::Arc;

use axum::{
    http::{HeaderName, HeaderValue},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::secrets::HealthProbe;
use crate::services::ProfileService;

use super::handlers::{health_handler, issue_profile_handler};

/// Shared, read-only state for all requests.
#[derive(Clone)]
pub struct ApiState {
    pub profile_service: Arc<ProfileService>,
    pub health_probe: Arc<dyn HealthProbe>,
    pub identity_header: HeaderName,
    pub content_disposition: HeaderValue,
}

impl ApiState {
    pub fn new(
        profile_service: Arc<ProfileService>,
        health_probe: Arc<dyn HealthProbe>,
        identity_header: HeaderName,
        download_name: &str,
    ) -> Result<Self> {
        let content_disposition =
            HeaderValue::from_str(&format!("attachment; filename=\"{}\"", download_name))
                .map_err(|e| {
                    Error::config(format!("download name '{}' is not header-safe: {}", download_name, e))
                })?;

        Ok(Self { profile_service, health_probe, identity_header, content_disposition })
    }

    pub fn from_config(
        profile_service: Arc<ProfileService>,
        health_probe: Arc<dyn HealthProbe>,
        config: &Config,
    ) -> Result<Self> {
        Self::new(
            profile_service,
            health_probe,
            config.profile.identity_header()?,
            &config.profile.download_name,
        )
    }
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(issue_profile_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
