//! # Structured Logging
//!
//! Subscriber setup and span macros built on the tracing ecosystem.
//!
//! Private keys, rendered profiles and the Vault password are wrapped in
//! [`crate::secrets::SecretString`], which renders as `[REDACTED]`, so they are never
//! written by the fields recorded here.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, ObservabilityConfig};
use crate::errors::{Error, Result};

/// Create a tracing span for one issuance request.
///
/// Every span gets a fresh `request_id` so all log lines of one request can be grouped.
///
/// ```rust,ignore
/// let span = issuance_span!(identity.as_str());
/// let span = issuance_span!(identity.as_str(), ttl = %ttl);
/// ```
#[macro_export]
macro_rules! issuance_span {
    ($subject:expr) => {
        tracing::info_span!(
            "issue_profile",
            subject = %$subject,
            request_id = %uuid::Uuid::new_v4()
        )
    };
    ($subject:expr, $($field:tt)*) => {
        tracing::info_span!(
            "issue_profile",
            subject = %$subject,
            request_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level; `verbose` raises the default to `debug`.
pub fn init_logging(config: &ObservabilityConfig, verbose: bool) -> Result<()> {
    let default_directive = if verbose { "debug" } else { config.log_level.as_str() };
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(default_directive),
    }
    .map_err(|e| Error::config(format!("Invalid log filter: {}", e)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| Error::config(format!("Failed to install tracing subscriber: {}", e)))
}

/// Log configuration at startup. Secrets are not included.
pub fn log_config_info(config: &Config) {
    tracing::info!(
        listen_address = %config.server.listen_address(),
        vault_addr = %config.vault.address,
        vault_username = %config.vault.username,
        vault_auth_mount = %config.vault.auth_mount,
        vault_issue_path = %config.vault.issue_path,
        vault_tls_verify = config.vault.tls_verify,
        vault_ca_file = ?config.vault.ca_file,
        identity_header = %config.profile.identity_header,
        session_ttl_seconds = config.profile.session_ttl_seconds,
        openvpn_servers = ?config.profile.servers,
        template_path = %config.profile.template_path.display(),
        tls_auth_enabled = config.profile.tls_auth_file.is_some(),
        artifact_root = %config.profile.artifact_root().display(),
        "openvpn-authd configuration"
    );
}
