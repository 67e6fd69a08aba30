//! Mail delivery.
//!
//! `MailSender` is the seam a templated message hands its rendered body to.
//! `LettreMailer` implements it on top of any lettre transport, and
//! `ConfiguredTransport` picks SMTP, file or stub delivery from configuration.

pub mod errors;
pub mod sender;
pub mod transport;

pub use errors::{MailError, TransportError};
pub use sender::{BodyFormat, LettreMailer, MailSender};
pub use transport::ConfiguredTransport;
