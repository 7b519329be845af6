//! # Configuration Management
//!
//! openvpn-authd is configured from `AUTHD_*` environment variables (optionally seeded
//! from a `.env` file by the binary). Everything is validated at startup; an invalid
//! value stops the process before it binds the listener.

mod settings;

use std::path::PathBuf;

pub use settings::{Config, ObservabilityConfig, ProfileConfig, ServerConfig, VaultConfig};

use crate::errors::{Error, Result};
use crate::secrets::SecretString;

/// Prefix shared by every configuration variable
pub const ENV_PREFIX: &str = "AUTHD_";

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    ///
    /// `lookup` receives the full variable name (e.g. `AUTHD_VAULT_URL`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvSource { lookup };
        let defaults = Config::default();

        let config = Config {
            server: ServerConfig {
                bind_address: env.string("BIND_ADDRESS").unwrap_or(defaults.server.bind_address),
                port: env.parse("PORT")?.unwrap_or(defaults.server.port),
            },
            vault: VaultConfig {
                address: env.string("VAULT_URL").unwrap_or_default(),
                ca_file: env.string("VAULT_CA_FILE").map(PathBuf::from),
                tls_verify: env.bool("VAULT_TLS_VERIFY")?.unwrap_or(defaults.vault.tls_verify),
                username: env.string("VAULT_USERNAME").unwrap_or_default(),
                password: SecretString::new(env.raw("VAULT_PASSWORD").unwrap_or_default()),
                auth_mount: env
                    .string("VAULT_AUTH_MOUNT")
                    .map(|mount| mount.trim_matches('/').to_string())
                    .unwrap_or(defaults.vault.auth_mount),
                issue_path: env.string("VAULT_ISSUE_PATH").unwrap_or_default(),
                timeout_seconds: env
                    .parse("VAULT_TIMEOUT_SECONDS")?
                    .unwrap_or(defaults.vault.timeout_seconds),
            },
            profile: ProfileConfig {
                identity_header: env
                    .string("AUTH_HEADER")
                    .unwrap_or(defaults.profile.identity_header),
                session_ttl_seconds: env
                    .parse("SESSION_TTL_SECONDS")?
                    .unwrap_or(defaults.profile.session_ttl_seconds),
                servers: env.list("OPENVPN_SERVERS"),
                template_path: env
                    .string("TEMPLATE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.profile.template_path),
                tls_auth_file: env.string("TLS_AUTH_FILE").map(PathBuf::from),
                artifact_dir: env.string("ARTIFACT_DIR").map(PathBuf::from),
                download_name: env
                    .string("DOWNLOAD_NAME")
                    .unwrap_or(defaults.profile.download_name),
            },
            observability: ObservabilityConfig {
                log_level: env.string("LOG_LEVEL").unwrap_or(defaults.observability.log_level),
                json_logging: env
                    .bool("LOG_JSON")?
                    .unwrap_or(defaults.observability.json_logging),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Pretty JSON view of the configuration with the password replaced by `[REDACTED]`.
    pub fn redacted_summary(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize configuration: {}", e)))
    }
}

struct EnvSource<F> {
    lookup: F,
}

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(&format!("{}{}", ENV_PREFIX, key))
    }

    /// Trimmed value; empty counts as unset.
    fn string(&self, key: &str) -> Option<String> {
        self.raw(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
    }

    fn parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(key)
            .map(|value| {
                value.parse::<T>().map_err(|e| {
                    Error::config(format!("Invalid {}{} '{}': {}", ENV_PREFIX, key, value, e))
                })
            })
            .transpose()
    }

    fn bool(&self, key: &str) -> Result<Option<bool>> {
        self.string(key)
            .map(|value| match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(Error::config(format!(
                    "Invalid {}{} '{}': expected true or false",
                    ENV_PREFIX, key, value
                ))),
            })
            .transpose()
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.string(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
