//! HashiCorp Vault PKI certificate backend.
//!
//! Logs in once with the userpass auth method, then issues client certificates from a
//! PKI role (`<mount>/issue/<role>`) on behalf of proxy-authenticated users.
//!
//! # Example
//!
//! ```rust,ignore
//! use openvpn_authd::secrets::{CertificateBackend, VaultPkiBackend};
//!
//! let backend = VaultPkiBackend::connect(&config.vault).await?;
//! let cert = backend
//!     .issue_certificate("jane@example.com", &config.vault.issue_path()?, ttl)
//!     .await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info};
use vaultrs::api::pki::requests::GenerateCertificateRequestBuilder;
use vaultrs::client::{Client, VaultClient, VaultClientSettingsBuilder};

use super::backend::{format_ttl, CertificateBackend, CertificateResult, IssuePath};
use super::types::SecretString;
use crate::config::VaultConfig;
use crate::errors::{Error, Result};

/// A client bundle is only usable with at least the issuing CA and its parent.
const MIN_CA_CHAIN_ENTRIES: usize = 2;

/// Vault-backed [`CertificateBackend`].
///
/// The session token is written once by [`VaultPkiBackend::authenticate`] while the
/// backend is still exclusively owned; afterwards it is only read. There is no
/// re-login: if Vault revokes the token, each request fails with `Error::Issuance`.
pub struct VaultPkiBackend {
    client: VaultClient,
    address: String,
}

impl std::fmt::Debug for VaultPkiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultPkiBackend")
            .field("address", &self.address)
            .field("client", &"[VaultClient]")
            .finish()
    }
}

impl VaultPkiBackend {
    /// Build an unauthenticated client for the configured Vault.
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder
            .address(&config.address)
            .token(String::new())
            .verify(config.tls_verify)
            .timeout(Some(config.timeout()))
            .ca_certs(
                config.ca_file.iter().map(|path| path.display().to_string()).collect::<Vec<_>>(),
            );

        let settings = settings_builder
            .build()
            .map_err(|e| Error::config(format!("Invalid Vault configuration: {}", e)))?;

        let client = VaultClient::new(settings)
            .map_err(|e| Error::config(format!("Failed to create Vault client: {}", e)))?;

        Ok(Self { client, address: config.address.clone() })
    }

    /// Build the client and log in with the configured userpass credentials.
    ///
    /// Fails fast: callers must not start serving traffic if this returns an error.
    pub async fn connect(config: &VaultConfig) -> Result<Self> {
        let mut backend = Self::new(config)?;
        backend.authenticate(&config.auth_mount, &config.username, &config.password).await?;
        Ok(backend)
    }

    /// Exchange a username/password for a Vault token and keep it for later calls.
    pub async fn authenticate(
        &mut self,
        mount: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<()> {
        debug!(vault_addr = %self.address, mount = %mount, username = %username, "Authenticating to Vault");

        let auth =
            vaultrs::auth::userpass::login(&self.client, mount, username, password.expose_secret())
                .await
                .map_err(|e| {
                    error!(error = %e, username = %username, mount = %mount, "Vault userpass login failed");
                    Error::auth(format!("userpass login for '{}' failed: {}", username, e))
                })?;

        if auth.client_token.is_empty() {
            return Err(Error::auth(format!(
                "userpass login for '{}' returned an empty client token",
                username
            )));
        }

        info!(
            vault_addr = %self.address,
            username = %username,
            policies = ?auth.policies,
            lease_duration = auth.lease_duration,
            "Authenticated to Vault"
        );

        self.client.set_token(&auth.client_token);
        Ok(())
    }
}

/// Concatenate every CA chain entry, in the order Vault returned them.
fn join_ca_chain(chain: Option<&[String]>) -> Result<String> {
    let chain = chain.unwrap_or_default();

    if chain.len() < MIN_CA_CHAIN_ENTRIES {
        return Err(Error::issuance(format!(
            "malformed PKI response: expected at least {} ca_chain entries, got {}",
            MIN_CA_CHAIN_ENTRIES,
            chain.len()
        )));
    }

    if let Some(index) = chain.iter().position(|entry| entry.trim().is_empty()) {
        return Err(Error::issuance(format!(
            "malformed PKI response: ca_chain entry {} is empty",
            index
        )));
    }

    Ok(chain.join("\n"))
}

#[async_trait]
impl CertificateBackend for VaultPkiBackend {
    async fn issue_certificate(
        &self,
        subject: &str,
        path: &IssuePath,
        ttl: Duration,
    ) -> Result<CertificateResult> {
        let ttl_string = format_ttl(ttl);

        info!(
            subject = %subject,
            pki_mount = %path.mount,
            role = %path.role,
            ttl = %ttl_string,
            "Requesting client certificate from Vault PKI"
        );

        let mut opts = GenerateCertificateRequestBuilder::default();
        opts.common_name(subject).ttl(&ttl_string);

        let response =
            vaultrs::pki::cert::generate(&self.client, &path.mount, &path.role, Some(&mut opts))
                .await
                .map_err(|e| {
                    error!(error = %e, subject = %subject, path = %path, "Vault PKI issuance failed");
                    Error::issuance(format!("Vault PKI issue at {} failed: {}", path, e))
                })?;

        let issuing_ca = join_ca_chain(response.ca_chain.as_deref()).inspect_err(|e| {
            error!(error = %e, subject = %subject, serial_number = %response.serial_number, "Rejecting PKI response");
        })?;

        if response.certificate.trim().is_empty() || response.private_key.trim().is_empty() {
            error!(subject = %subject, "Vault PKI response is missing the certificate or private key");
            return Err(Error::issuance(
                "malformed PKI response: certificate or private_key is empty",
            ));
        }

        info!(
            subject = %subject,
            serial_number = %response.serial_number,
            ca_chain_entries = response.ca_chain.as_ref().map_or(0, Vec::len),
            "Issued client certificate via Vault PKI"
        );

        Ok(CertificateResult {
            certificate: response.certificate,
            private_key: SecretString::new(response.private_key),
            issuing_ca,
            ttl,
            subject: subject.to_string(),
            serial_number: response.serial_number,
            issued_at: Utc::now(),
        })
    }
}
