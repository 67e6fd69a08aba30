//! Error handling for building configured messages.
//!
//! Each layer has its own error type (`ViewError`, `MailError`,
//! `TransportError`, `ConfigError`), and rendering reports through
//! `MessageError`. This module holds the `Error` returned while wiring a
//! message together from configuration, together with a `Result` alias.

use thiserror::Error;

use crate::mail::{MailError, TransportError};

/// Result type for templated-mail operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for templated-mail operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configured address
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    /// Transport setup error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Context package is not registered
    #[error("Unknown package: {0}")]
    UnknownPackage(String),
}

impl Error {
    /// Create a new unknown package error
    pub fn unknown_package<S: Into<String>>(key: S) -> Self {
        Self::UnknownPackage(key.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_unknown_package_creation() {
        let error = Error::unknown_package("shop");
        assert!(matches!(error, Error::UnknownPackage(_)));
        assert_eq!(error.to_string(), "Unknown package: shop");
    }

    #[test]
    fn test_error_from_mail_error() {
        let error: Error = MailError::MissingRecipient.into();
        assert!(matches!(error, Error::Mail(MailError::MissingRecipient)));
        assert!(error.to_string().contains("no recipient"));
    }

    #[test]
    fn test_error_debug_display() {
        let error = Error::unknown_package("debug");
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("UnknownPackage"));
        assert!(debug_str.contains("debug"));
    }
}
