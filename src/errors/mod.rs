//! # Error Handling
//!
//! Error types for openvpn-authd, defined with `thiserror`.
//!
//! Startup errors (`Config`, `Auth`) propagate out of `main` and stop the process
//! before it serves traffic. Everything else is per-request and is converted into an
//! HTTP status at the API boundary (see [`crate::api::error::ApiError`]).

/// Custom result type for openvpn-authd operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for openvpn-authd
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Initial authentication against the secrets backend failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The backend rejected or failed to produce a well-formed certificate
    #[error("Certificate issuance failed: {0}")]
    Issuance(String),

    /// Rendering input invalid or template unreadable
    #[error("Template error: {0}")]
    Template(String),

    /// The transient artifact could not be written, read or removed
    #[error("Storage error: {context}")]
    Storage {
        context: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Backend health query failed or returned an unparseable body
    #[error("Health probe failed: {0}")]
    Probe(String),

    /// The identity header was absent or empty
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Listener / server transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth(message.into())
    }

    /// Create a new issuance error
    pub fn issuance<S: Into<String>>(message: S) -> Self {
        Self::Issuance(message.into())
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(message: S) -> Self {
        Self::Template(message.into())
    }

    /// Create a storage error without an underlying I/O cause
    pub fn storage<S: Into<String>>(context: S) -> Self {
        Self::Storage { context: context.into(), source: None }
    }

    /// Create a storage error wrapping the I/O failure that caused it
    pub fn storage_io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Storage { context: context.into(), source: Some(source) }
    }

    /// Create a new health probe error
    pub fn probe<S: Into<String>>(message: S) -> Self {
        Self::Probe(message.into())
    }

    /// Create a new forbidden error
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Short machine-friendly name of the error kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Auth(_) => "auth",
            Error::Issuance(_) => "issuance",
            Error::Template(_) => "template",
            Error::Storage { .. } => "storage",
            Error::Probe(_) => "probe",
            Error::Forbidden(_) => "forbidden",
            Error::Transport(_) => "transport",
            Error::Io(_) => "io",
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_validation_messages(&errors, "", &mut messages);
        messages.sort();
        Error::Config(messages.join("; "))
    }
}

fn collect_validation_messages(
    errors: &validator::ValidationErrors,
    prefix: &str,
    out: &mut Vec<String>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path =
            if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                out.push(format!("{}: {}", path, error_messages.join(", ")));
            }
            ValidationErrorsKind::Struct(nested) => collect_validation_messages(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_messages(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::issuance("ca_chain has 1 entry");
        assert_eq!(err.to_string(), "Certificate issuance failed: ca_chain has 1 entry");

        let err = Error::storage_io("write profile", std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "Storage error: write profile");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::forbidden("missing header").kind(), "forbidden");
        assert_eq!(Error::probe("bad json").kind(), "probe");
        assert_eq!(Error::storage("cleanup").kind(), "storage");
    }
}
