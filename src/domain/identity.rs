//! Proxy-asserted user identity.

use std::fmt;

use serde::Serialize;

use crate::errors::{Error, Result};

/// The identity an upstream proxy asserted for the caller, typically an email address.
///
/// Trusted as given: the gateway performs no authentication of its own. Used as the
/// certificate common name and as the `email` field of the rendered profile. Never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Build an identity from a raw header value. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// `Error::Forbidden` when the value is empty after trimming.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::forbidden("identity header is empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
