//! Capability traits for the secrets backend.
//!
//! The gateway only ever talks to the backend through [`CertificateBackend`] and
//! [`HealthProbe`], so tests can substitute doubles that return fixed values without a
//! running Vault.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::health::HealthStatus;
use super::types::SecretString;
use crate::errors::{Error, Result};

/// A certificate issued for one request.
///
/// Owned by the request that produced it and dropped with it; the private key buffer is
/// zeroed on drop.
#[derive(Clone)]
pub struct CertificateResult {
    /// PEM-encoded client certificate
    pub certificate: String,

    /// PEM-encoded private key
    pub private_key: SecretString,

    /// PEM-encoded CA chain, every backend entry joined by newlines in backend order
    pub issuing_ca: String,

    /// Requested validity period
    pub ttl: Duration,

    /// Common name the certificate was issued for
    pub subject: String,

    /// Serial number reported by the backend
    pub serial_number: String,

    /// Local time at which the certificate was received
    pub issued_at: DateTime<Utc>,
}

impl CertificateResult {
    /// Absolute expiry: `issued_at + ttl`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        self.issued_at.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl fmt::Debug for CertificateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateResult")
            .field("certificate", &format!("[{} bytes PEM]", self.certificate.len()))
            .field("private_key", &self.private_key)
            .field("issuing_ca", &format!("[{} bytes PEM]", self.issuing_ca.len()))
            .field("ttl", &self.ttl)
            .field("subject", &self.subject)
            .field("serial_number", &self.serial_number)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// A PKI issue endpoint, written as `<mount>/issue/<role>`.
///
/// The mount may itself contain slashes (`pki/int/issue/openvpn`); a leading `/` or
/// `v1/` is accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuePath {
    pub mount: String,
    pub role: String,
}

impl FromStr for IssuePath {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim().trim_start_matches('/');
        let trimmed = trimmed.strip_prefix("v1/").unwrap_or(trimmed);

        let (mount, role) = trimmed.rsplit_once("/issue/").ok_or_else(|| {
            Error::config(format!("issue path '{}' must look like '<mount>/issue/<role>'", value))
        })?;

        if mount.is_empty() || role.is_empty() || role.contains('/') {
            return Err(Error::config(format!(
                "issue path '{}' must look like '<mount>/issue/<role>'",
                value
            )));
        }

        Ok(Self { mount: mount.to_string(), role: role.to_string() })
    }
}

impl fmt::Display for IssuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/issue/{}", self.mount, self.role)
    }
}

/// Formats a TTL the way Vault and Go durations print it, e.g. `12h0m0s`.
pub fn format_ttl(ttl: Duration) -> String {
    let total = ttl.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Issues client certificates from the secrets backend.
///
/// Implementations are authenticated before they are handed to the gateway and are only
/// used through `&self` afterwards, so one instance is shared by all requests without
/// locking.
#[async_trait]
pub trait CertificateBackend: Send + Sync + fmt::Debug {
    /// Issue a certificate for `subject` from `path`, valid for `ttl`.
    ///
    /// Never retried: the backend gives no idempotency guarantee, and a retry could leave
    /// several live credentials behind one request.
    ///
    /// # Errors
    ///
    /// `Error::Issuance` on transport failure, backend rejection, or a response missing
    /// the certificate, key, or at least two CA chain entries.
    async fn issue_certificate(
        &self,
        subject: &str,
        path: &IssuePath,
        ttl: Duration,
    ) -> Result<CertificateResult>;
}

/// Reports the health of the secrets backend.
#[async_trait]
pub trait HealthProbe: Send + Sync + fmt::Debug {
    /// Fetch a fresh health snapshot. Nothing is cached between calls.
    async fn query(&self) -> Result<HealthStatus>;
}
