//! # Observability Infrastructure
//!
//! Structured logging for openvpn-authd. HTTP request spans come from
//! `tower_http::trace::TraceLayer` in [`crate::api::routes`]; issuance requests get their
//! own span via [`issuance_span!`](crate::issuance_span).

pub mod logging;

pub use logging::{init_logging, log_config_info};
