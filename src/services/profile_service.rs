//! Profile issuance service
//!
//! Runs the issuance pipeline for one request, separated from HTTP concerns:
//! issue a certificate, render it into a profile, deliver it through a one-time artifact.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, Instrument};

use crate::{
    config::Config,
    domain::Identity,
    errors::{Error, Result},
    profile::{ArtifactStore, DeliveredArtifact, ProfileRenderer},
    secrets::{format_ttl, CertificateBackend, IssuePath},
};

/// Pipeline stage, recorded on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Issue,
    Render,
    Deliver,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Issue => "issue",
            Stage::Render => "render",
            Stage::Deliver => "deliver",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service that turns an identity into a delivered client profile
pub struct ProfileService {
    backend: Arc<dyn CertificateBackend>,
    renderer: ProfileRenderer,
    store: ArtifactStore,
    issue_path: IssuePath,
    session_ttl: Duration,
}

impl fmt::Debug for ProfileService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileService")
            .field("backend", &self.backend)
            .field("issue_path", &self.issue_path.to_string())
            .field("session_ttl", &self.session_ttl)
            .field("artifact_root", &self.store.root())
            .finish()
    }
}

impl ProfileService {
    /// Create a new profile service
    pub fn new(
        backend: Arc<dyn CertificateBackend>,
        renderer: ProfileRenderer,
        store: ArtifactStore,
        issue_path: IssuePath,
        session_ttl: Duration,
    ) -> Self {
        Self { backend, renderer, store, issue_path, session_ttl }
    }

    /// Wire the service from validated configuration
    pub fn from_config(backend: Arc<dyn CertificateBackend>, config: &Config) -> Result<Self> {
        Ok(Self::new(
            backend,
            ProfileRenderer::from_config(&config.profile),
            ArtifactStore::new(config.profile.artifact_root()),
            config.vault.issue_path()?,
            config.profile.session_ttl(),
        ))
    }

    /// Issue, render and deliver a fresh profile for `identity`.
    ///
    /// Every call issues a new certificate; nothing is cached or retried. On failure the
    /// stage and error are logged and nothing is left on disk.
    pub async fn issue_profile(&self, identity: &Identity) -> Result<DeliveredArtifact> {
        let span = crate::issuance_span!(identity, ttl = %format_ttl(self.session_ttl));

        async move {
            let certificate = self
                .backend
                .issue_certificate(identity.as_str(), &self.issue_path, self.session_ttl)
                .await
                .inspect_err(|e| log_failure(identity, Stage::Issue, e))?;

            let profile = self
                .renderer
                .render(identity, &certificate)
                .await
                .inspect_err(|e| log_failure(identity, Stage::Render, e))?;
            let expires_at = profile.expires_at;

            let delivered = self
                .store
                .deliver(profile)
                .await
                .inspect_err(|e| log_failure(identity, Stage::Deliver, e))?;

            info!(
                subject = %identity,
                serial_number = %certificate.serial_number,
                expires_at = %expires_at,
                bytes = delivered.contents.len(),
                "Issued client profile"
            );

            Ok(delivered)
        }
        .instrument(span)
        .await
    }
}

fn log_failure(identity: &Identity, stage: Stage, err: &Error) {
    error!(
        subject = %identity,
        stage = %stage,
        error_kind = err.kind(),
        error = %err,
        "Profile issuance failed"
    );
}
