//! Client profile rendering and one-time delivery.
//!
//! [`ProfileRenderer`] turns an issued certificate into OpenVPN client configuration
//! text; [`ArtifactStore`] passes that text through a single-use file that is gone again
//! before the response is sent.

pub mod artifact;
pub mod render;
pub mod template;

use chrono::{DateTime, Utc};

use crate::secrets::SecretString;

pub use artifact::{ArtifactStore, DeliveredArtifact, StagedArtifact};
pub use render::ProfileRenderer;
pub use template::{FieldValue, Fields, Template};

/// A fully rendered client profile.
///
/// The text embeds the private key, so it is held in a [`SecretString`] and zeroed when
/// dropped.
#[derive(Debug, Clone)]
pub struct RenderedProfile {
    pub contents: SecretString,
    pub expires_at: DateTime<Utc>,
}
