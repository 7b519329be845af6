//! # Backend Health
//!
//! Queries Vault's `sys/health` endpoint and normalizes the answer into the gateway's
//! [`HealthStatus`] shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::HealthProbe;
use crate::config::VaultConfig;
use crate::errors::{Error, Result};

/// Normalized backend health, served verbatim by `GET /health`.
///
/// Fields Vault omits (replication modes on OSS builds, for instance) fall back to their
/// zero values, as they would in Vault's own clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub initialized: bool,
    pub sealed: bool,
    pub standby: bool,
    pub replication_performance_mode: String,
    pub replication_dr_mode: String,
    pub server_time_utc: i64,
    /// Backend version
    pub version: String,
    pub cluster_id: String,
    pub cluster_name: String,
    /// Version of this gateway, stamped on every probe
    pub app_version: String,
}

/// Unauthenticated `GET /v1/sys/health` against the configured Vault.
#[derive(Debug, Clone)]
pub struct VaultHealthProbe {
    health_url: String,
    http: reqwest::Client,
}

impl VaultHealthProbe {
    /// Build a probe that uses the same CA bundle, TLS verification and timeout as the
    /// secrets client.
    pub fn new(config: &VaultConfig) -> Result<Self> {
        Ok(Self::with_client(&config.address, build_http_client(config)?))
    }

    /// Build a probe around an existing HTTP client.
    pub fn with_client(address: &str, http: reqwest::Client) -> Self {
        Self { health_url: format!("{}/v1/sys/health", address.trim_end_matches('/')), http }
    }
}

fn build_http_client(config: &VaultConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout())
        .danger_accept_invalid_certs(!config.tls_verify);

    if let Some(ca_file) = &config.ca_file {
        let pem = std::fs::read(ca_file).map_err(|e| {
            Error::config(format!("Failed to read Vault CA file {}: {}", ca_file.display(), e))
        })?;
        let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
            Error::config(format!("Vault CA file {} is not valid PEM: {}", ca_file.display(), e))
        })?;
        builder = builder.add_root_certificate(certificate);
    }

    builder.build().map_err(|e| Error::config(format!("Failed to build health client: {}", e)))
}

#[async_trait]
impl HealthProbe for VaultHealthProbe {
    async fn query(&self) -> Result<HealthStatus> {
        debug!(url = %self.health_url, "Querying Vault health");

        let response = self.http.get(&self.health_url).send().await.map_err(|e| {
            warn!(error = %e, url = %self.health_url, "Vault health request failed");
            Error::probe(format!("request to {} failed: {}", self.health_url, e))
        })?;

        // Sealed, standby and uninitialized nodes answer with non-2xx codes but still
        // carry a health document, so the body is parsed whatever the status.
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::probe(format!("failed to read health response from {}: {}", self.health_url, e))
        })?;

        let mut health: HealthStatus = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, http_status = status.as_u16(), "Vault returned a malformed health body");
            Error::probe(format!(
                "malformed health response from {} (HTTP {}): {}",
                self.health_url,
                status.as_u16(),
                e
            ))
        })?;

        health.app_version = crate::VERSION.to_string();
        Ok(health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_health_status_parses_full_vault_document() {
        let body = json!({
            "initialized": true,
            "sealed": false,
            "standby": false,
            "performance_standby": false,
            "replication_performance_mode": "disabled",
            "replication_dr_mode": "disabled",
            "server_time_utc": 1_700_000_000,
            "version": "1.15.2",
            "cluster_name": "vault-cluster-1",
            "cluster_id": "7b2e6a2c"
        });

        let health: HealthStatus = serde_json::from_value(body).unwrap();
        assert!(health.initialized);
        assert_eq!(health.server_time_utc, 1_700_000_000);
        assert_eq!(health.version, "1.15.2");
        assert_eq!(health.cluster_name, "vault-cluster-1");
        assert!(health.app_version.is_empty());
    }

    #[test]
    fn test_health_status_tolerates_missing_fields() {
        let health: HealthStatus =
            serde_json::from_str(r#"{"initialized": true, "sealed": true}"#).unwrap();
        assert!(health.sealed);
        assert_eq!(health.replication_dr_mode, "");
    }

    #[test]
    fn test_health_status_serializes_contract_field_names() {
        let value = serde_json::to_value(HealthStatus {
            app_version: "0.3.0".to_string(),
            ..Default::default()
        })
        .unwrap();

        for field in [
            "initialized",
            "sealed",
            "standby",
            "replication_performance_mode",
            "replication_dr_mode",
            "server_time_utc",
            "version",
            "cluster_id",
            "cluster_name",
            "app_version",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn test_health_url_strips_trailing_slash() {
        let probe = VaultHealthProbe::with_client("http://vault:8200/", reqwest::Client::new());
        assert_eq!(probe.health_url, "http://vault:8200/v1/sys/health");
    }
}
