//! Renders issued certificates into OpenVPN client profiles.

use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use tracing::{debug, error};

use super::template::{Fields, Template};
use super::RenderedProfile;
use crate::config::ProfileConfig;
use crate::domain::Identity;
use crate::errors::{Error, Result};
use crate::secrets::{format_ttl, CertificateResult, SecretString};

/// Fields every profile template may use. All but `tlsauth` are required.
pub const REQUIRED_FIELDS: &[&str] = &[
    "openvpn_servers",
    "ttl",
    "expires_in",
    "certificate",
    "private_key",
    "issuing_ca",
    "email",
];

/// Optional field holding the tls-auth static key.
pub const TLS_AUTH_FIELD: &str = "tlsauth";

/// Combines a [`CertificateResult`] with the deployment's static profile settings.
///
/// The template and tls-auth files are read on every render, so edits take effect without
/// a restart.
#[derive(Debug, Clone)]
pub struct ProfileRenderer {
    template_path: PathBuf,
    tls_auth_file: Option<PathBuf>,
    servers: Vec<String>,
}

impl ProfileRenderer {
    pub fn new(
        template_path: impl Into<PathBuf>,
        tls_auth_file: Option<PathBuf>,
        servers: Vec<String>,
    ) -> Self {
        Self { template_path: template_path.into(), tls_auth_file, servers }
    }

    pub fn from_config(config: &ProfileConfig) -> Self {
        Self::new(
            config.template_path.clone(),
            config.tls_auth_file.clone(),
            config.servers.clone(),
        )
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// Render the profile for `identity` from a freshly issued certificate.
    ///
    /// # Errors
    ///
    /// `Error::Template` if the template or tls-auth file cannot be read, the template
    /// does not parse, or a required field is empty. Nothing is produced in that case.
    pub async fn render(
        &self,
        identity: &Identity,
        certificate: &CertificateResult,
    ) -> Result<RenderedProfile> {
        let source = read_file(&self.template_path, "template").await?;
        let template = Template::parse(&source).inspect_err(|e| {
            error!(error = %e, template = %self.template_path.display(), "Profile template does not parse");
        })?;

        let tls_auth = match &self.tls_auth_file {
            Some(path) => Some(SecretString::new(read_file(path, "tls-auth file").await?)),
            None => None,
        };

        let expires_at = certificate.expires_at();
        let ttl = format_ttl(certificate.ttl);
        let expires_in = expires_at.to_rfc3339_opts(SecondsFormat::Secs, true);

        let fields = Fields::new()
            .list("openvpn_servers", &self.servers)
            .text("ttl", &ttl)
            .text("expires_in", &expires_in)
            .text("certificate", &certificate.certificate)
            .text("private_key", certificate.private_key.expose_secret())
            .text("issuing_ca", &certificate.issuing_ca)
            .text("email", identity.as_str())
            .optional(TLS_AUTH_FIELD, tls_auth.as_ref().map(SecretString::expose_secret));

        fields.require(REQUIRED_FIELDS)?;
        let contents = SecretString::new(template.render(&fields)?);

        debug!(
            subject = %identity,
            bytes = contents.len(),
            tls_auth = tls_auth.is_some(),
            expires_at = %expires_in,
            "Rendered client profile"
        );

        Ok(RenderedProfile { contents, expires_at })
    }
}

async fn read_file(path: &Path, what: &str) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        error!(error = %e, path = %path.display(), "Failed to read {}", what);
        Error::template(format!("failed to read {} {}: {}", what, path.display(), e))
    })
}
