//! Error types for the mail layer

use thiserror::Error;

/// Errors that can occur while building or delivering a message
#[derive(Error, Debug)]
pub enum MailError {
    #[error("Message has no sender address")]
    MissingSender,

    #[error("Message has no recipient")]
    MissingRecipient,

    #[error("Invalid email address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Errors raised by a configured transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("File transport error: {0}")]
    File(#[from] lettre::transport::file::Error),

    #[error("Stub transport error: {0}")]
    Stub(#[from] lettre::transport::stub::Error),
}
