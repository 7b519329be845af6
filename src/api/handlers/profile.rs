//! Profile download endpoint

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::{error::ApiError, routes::ApiState};
use crate::domain::Identity;
use crate::errors::{Error, Result};

pub const PROFILE_CONTENT_TYPE: &str = "application/x-openvpn-profile";

/// `GET /`: issue a fresh client profile for the identity asserted by the proxy.
///
/// 403 without the identity header, 500 with an empty body for any issuance failure.
pub async fn issue_profile_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> std::result::Result<Response, ApiError> {
    let identity = identity_from_headers(&headers, &state.identity_header).inspect_err(|e| {
        warn!(header = %state.identity_header, error = %e, "Rejecting profile request");
    })?;

    let delivered = state.profile_service.issue_profile(&identity).await?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(PROFILE_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, state.content_disposition.clone()),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        Body::from(delivered.contents),
    )
        .into_response())
}

/// Read the asserted identity from `name`. Missing, blank and non-UTF-8 values are
/// `Error::Forbidden`.
pub fn identity_from_headers(headers: &HeaderMap, name: &HeaderName) -> Result<Identity> {
    let value = headers
        .get(name)
        .ok_or_else(|| Error::forbidden(format!("missing {} header", name)))?;
    let raw = value
        .to_str()
        .map_err(|_| Error::forbidden(format!("{} header is not valid text", name)))?;
    Identity::parse(raw)
}
