//! templated-mail
//!
//! Renders an email body from a template and sends it through a mail transport.
//! A template identifier is resolved against configured template roots (and an
//! optional package context) to a template file; if no file matches, the
//! identifier itself is used as template source.
#![deny(unsafe_code)]

pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod mail;
pub mod message;
pub mod templates;

pub use context::MailContext;
pub use error::{Error, Result};
pub use message::{MessageError, TemplatedMailMessage};
