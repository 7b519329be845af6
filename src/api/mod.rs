//! # HTTP API
//!
//! `GET /` issues a client profile for the proxy-asserted identity; `GET /health`
//! reports the secrets backend's health.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
