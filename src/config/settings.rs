//! # Configuration Settings
//!
//! Defines the configuration structure for openvpn-authd.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{Error, Result};
use crate::secrets::{IssuePath, SecretString};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct Config {
    /// HTTP listener configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Secrets backend configuration
    #[validate(nested)]
    pub vault: VaultConfig,

    /// Rendered profile and delivery configuration
    #[validate(nested)]
    pub profile: ProfileConfig,

    /// Logging configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    /// Checks that need parsing rather than simple field rules
    fn validate_custom(&self) -> Result<()> {
        let url = url::Url::parse(&self.vault.address).map_err(|e| {
            Error::config(format!("vault.address '{}' is not a valid URL: {}", self.vault.address, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "vault.address must use http or https, got '{}'",
                url.scheme()
            )));
        }

        self.vault.issue_path()?;
        self.profile.identity_header()?;

        for server in &self.profile.servers {
            validate_server_entry(server)?;
        }

        if self.profile.download_name.contains(['"', '/', '\\']) {
            return Err(Error::config(format!(
                "profile.download_name '{}' must be a bare file name",
                self.profile.download_name
            )));
        }

        Ok(())
    }
}

/// A profile server entry is `<host> <port>`, as written after `remote` in the profile.
fn validate_server_entry(entry: &str) -> Result<()> {
    let mut parts = entry.split_whitespace();
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(_host), Some(port), None) => port.parse::<u16>().map(|p| p > 0).unwrap_or(false),
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::config(format!("openvpn server '{}' must look like '<host> <port>'", entry)))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Bind address cannot be empty"))]
    pub bind_address: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl ServerConfig {
    /// Get the server listen address
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Vault connection, login and issuance configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VaultConfig {
    /// Vault base URL, e.g. `https://vault.example.com:8200`
    #[validate(length(min = 1, message = "Vault URL is required"))]
    pub address: String,

    /// PEM CA bundle used to verify the Vault server
    pub ca_file: Option<PathBuf>,

    /// Verify the Vault server certificate
    pub tls_verify: bool,

    /// Userpass username
    #[validate(length(min = 1, message = "Vault username is required"))]
    pub username: String,

    /// Userpass password
    pub password: SecretString,

    /// Mount of the userpass auth method
    #[validate(length(min = 1, message = "Auth mount cannot be empty"))]
    pub auth_mount: String,

    /// PKI issue endpoint, `<mount>/issue/<role>`
    #[validate(length(min = 1, message = "Vault issue path is required"))]
    pub issue_path: String,

    /// Timeout for every Vault request, in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            ca_file: None,
            tls_verify: true,
            username: String::new(),
            password: SecretString::new(""),
            auth_mount: "userpass".to_string(),
            issue_path: String::new(),
            timeout_seconds: 30,
        }
    }
}

impl VaultConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Parse the configured issue path
    pub fn issue_path(&self) -> Result<IssuePath> {
        IssuePath::from_str(&self.issue_path)
    }
}

/// Settings for the rendered client profile and its delivery
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileConfig {
    /// Request header carrying the proxy-asserted identity
    #[validate(length(min = 1, message = "Identity header cannot be empty"))]
    pub identity_header: String,

    /// Certificate TTL in seconds
    #[validate(range(min = 1, message = "Session TTL must be at least 1 second"))]
    pub session_ttl_seconds: u64,

    /// OpenVPN servers, each `<host> <port>`
    #[validate(length(min = 1, message = "At least one OpenVPN server is required"))]
    pub servers: Vec<String>,

    /// Profile template file
    pub template_path: PathBuf,

    /// Optional tls-auth static key embedded in every profile
    pub tls_auth_file: Option<PathBuf>,

    /// Root for ephemeral artifacts (system temp dir when unset)
    pub artifact_dir: Option<PathBuf>,

    /// Attachment file name offered to the client
    #[validate(length(min = 1, message = "Download name cannot be empty"))]
    pub download_name: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            identity_header: "X-Auth-Email".to_string(),
            session_ttl_seconds: 43200, // 12 hours
            servers: Vec::new(),
            template_path: PathBuf::from("templates/openvpn.tmpl"),
            tls_auth_file: None,
            artifact_dir: None,
            download_name: "openvpn.ovpn".to_string(),
        }
    }
}

impl ProfileConfig {
    /// Get certificate TTL as Duration
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    /// Parse the identity header name
    pub fn identity_header(&self) -> Result<HeaderName> {
        HeaderName::from_str(self.identity_header.trim()).map_err(|e| {
            Error::config(format!(
                "identity header '{}' is not a valid header name: {}",
                self.identity_header, e
            ))
        })
    }

    /// Directory under which ephemeral artifacts are created
    pub fn artifact_root(&self) -> PathBuf {
        self.artifact_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            vault: VaultConfig {
                address: "https://vault.example.com:8200".to_string(),
                username: "openvpn".to_string(),
                password: SecretString::new("hunter2"),
                issue_path: "pki/issue/openvpn".to_string(),
                ..Default::default()
            },
            profile: ProfileConfig {
                servers: vec!["vpn1.example.com 1194".to_string()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_default_config_is_incomplete() {
        let err = Config::default().validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Vault URL is required"));
        assert!(message.contains("At least one OpenVPN server is required"));
    }

    #[test]
    fn test_rejects_non_http_vault_address() {
        let mut config = valid_config();
        config.vault.address = "ftp://vault:21".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_bad_issue_path() {
        let mut config = valid_config();
        config.vault.issue_path = "pki/sign/openvpn".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("<mount>/issue/<role>"));
    }

    #[test]
    fn test_rejects_bad_server_entries() {
        for entry in ["vpn.example.com", "vpn.example.com port", "vpn 0", "a 1194 udp"] {
            let mut config = valid_config();
            config.profile.servers = vec![entry.to_string()];
            assert!(config.validate().is_err(), "{entry} should be rejected");
        }
    }

    #[test]
    fn test_rejects_invalid_header_and_download_name() {
        let mut config = valid_config();
        config.profile.identity_header = "X Auth Email".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.profile.download_name = "../profile.ovpn".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations_and_paths() {
        let config = valid_config();
        assert_eq!(config.vault.timeout(), Duration::from_secs(30));
        assert_eq!(config.profile.session_ttl(), Duration::from_secs(43200));
        assert_eq!(config.server.listen_address(), "0.0.0.0:8080");
        assert_eq!(config.profile.artifact_root(), std::env::temp_dir());
        assert_eq!(config.vault.issue_path().unwrap().role, "openvpn");
    }
}
