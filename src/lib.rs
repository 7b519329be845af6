//! # openvpn-authd
//!
//! Turns an identity asserted by an upstream reverse proxy into a short-lived OpenVPN
//! client profile. Each `GET /` asks HashiCorp Vault's PKI engine for a fresh client
//! certificate, renders it into a profile and hands it back as a one-time
//! download. `GET /health` mirrors Vault's own health document.
//!
//! ## Architecture
//!
//! ```text
//! proxy ── X-Auth-Email ──▶ api ──▶ services::ProfileService
//!                                     ├─ secrets::CertificateBackend (Vault PKI)
//!                                     ├─ profile::ProfileRenderer    (template)
//!                                     └─ profile::ArtifactStore      (one-time file)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use openvpn_authd::{
//!     api::{start_api_server, ApiState},
//!     secrets::{VaultHealthProbe, VaultPkiBackend},
//!     services::ProfileService,
//!     Config, Result,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_env()?;
//!     let backend = VaultPkiBackend::connect(&config.vault).await?;
//!     let probe = VaultHealthProbe::new(&config.vault)?;
//!     let service = ProfileService::from_config(Arc::new(backend), &config)?;
//!     let state = ApiState::from_config(Arc::new(service), Arc::new(probe), &config)?;
//!     start_api_server(&config.server, state).await
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod profile;
pub mod secrets;
pub mod services;

// Re-export commonly used types and traits
pub use config::Config;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "openvpn-authd");
    }
}
