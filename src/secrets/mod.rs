//! Secrets backend integration.
//!
//! The gateway never holds long-lived key material. For each request it asks the
//! secrets backend (HashiCorp Vault) for a fresh client certificate, renders it into a
//! profile, hands it to the caller and forgets it.
//!
//! # Architecture
//!
//! - [`CertificateBackend`]: issue a certificate for a subject with a TTL
//! - [`HealthProbe`]: report backend health for `GET /health`
//! - [`VaultPkiBackend`] and [`VaultHealthProbe`]: the Vault implementations
//! - [`SecretString`]: redacting, zeroizing wrapper for passwords and private keys
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use openvpn_authd::secrets::{CertificateBackend, VaultHealthProbe, VaultPkiBackend};
//!
//! let backend: Arc<dyn CertificateBackend> =
//!     Arc::new(VaultPkiBackend::connect(&config.vault).await?);
//! let probe = VaultHealthProbe::new(&config.vault)?;
//! ```

pub mod backend;
pub mod health;
pub mod types;
pub mod vault;

pub use backend::{format_ttl, CertificateBackend, CertificateResult, HealthProbe, IssuePath};
pub use health::{HealthStatus, VaultHealthProbe};
pub use types::SecretString;
pub use vault::VaultPkiBackend;
