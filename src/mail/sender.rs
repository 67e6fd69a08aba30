//! Mail sender abstraction and its lettre-based implementation

use lettre::Transport;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use serde::Deserialize;
use tracing::{error, info};

use super::errors::MailError;

/// Delivery side of a templated mail message
pub trait MailSender {
    /// What a successful delivery returns
    type Response;
    type Error: std::error::Error + Send + Sync + 'static;

    fn set_body(&mut self, body: String);

    fn send(&mut self) -> Result<Self::Response, Self::Error>;
}

/// Content type of the message body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    #[default]
    Html,
    Plain,
}

impl BodyFormat {
    fn content_type(self) -> ContentType {
        match self {
            BodyFormat::Html => ContentType::TEXT_HTML,
            BodyFormat::Plain => ContentType::TEXT_PLAIN,
        }
    }
}

/// A message with standard fields that is delivered through a lettre transport
pub struct LettreMailer<T: Transport> {
    transport: T,
    from: Option<Mailbox>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    reply_to: Option<Mailbox>,
    subject: String,
    format: BodyFormat,
    body: Option<String>,
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })
}

impl<T: Transport> LettreMailer<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: None,
            subject: String::new(),
            format: BodyFormat::default(),
            body: None,
        }
    }

    pub fn set_from(&mut self, address: &str) -> Result<&mut Self, MailError> {
        self.from = Some(parse_mailbox(address)?);
        Ok(self)
    }

    pub fn add_to(&mut self, address: &str) -> Result<&mut Self, MailError> {
        self.to.push(parse_mailbox(address)?);
        Ok(self)
    }

    pub fn add_cc(&mut self, address: &str) -> Result<&mut Self, MailError> {
        self.cc.push(parse_mailbox(address)?);
        Ok(self)
    }

    pub fn add_bcc(&mut self, address: &str) -> Result<&mut Self, MailError> {
        self.bcc.push(parse_mailbox(address)?);
        Ok(self)
    }

    pub fn set_reply_to(&mut self, address: &str) -> Result<&mut Self, MailError> {
        self.reply_to = Some(parse_mailbox(address)?);
        Ok(self)
    }

    pub fn set_subject<S: Into<String>>(&mut self, subject: S) -> &mut Self {
        self.subject = subject.into();
        self
    }

    pub fn set_format(&mut self, format: BodyFormat) -> &mut Self {
        self.format = format;
        self
    }

    pub fn from_address(&self) -> Option<&Mailbox> {
        self.from.as_ref()
    }

    pub fn to(&self) -> &[Mailbox] {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the lettre message from the current fields
    pub fn build_message(&self) -> Result<Message, MailError> {
        let from = self.from.clone().ok_or(MailError::MissingSender)?;
        if self.to.is_empty() {
            return Err(MailError::MissingRecipient);
        }

        let mut builder = Message::builder()
            .from(from)
            .subject(self.subject.as_str())
            .header(self.format.content_type());
        for mailbox in &self.to {
            builder = builder.to(mailbox.clone());
        }
        for mailbox in &self.cc {
            builder = builder.cc(mailbox.clone());
        }
        for mailbox in &self.bcc {
            builder = builder.bcc(mailbox.clone());
        }
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.clone());
        }

        Ok(builder.body(self.body.clone().unwrap_or_default())?)
    }
}

impl<T> MailSender for LettreMailer<T>
where
    T: Transport,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    type Response = T::Ok;
    type Error = MailError;

    fn set_body(&mut self, body: String) {
        self.body = Some(body);
    }

    fn send(&mut self) -> Result<T::Ok, MailError> {
        let message = self.build_message()?;
        let response = self.transport.send(&message).map_err(|e| {
            error!("Failed to deliver message '{}': {}", self.subject, e);
            MailError::Transport(Box::new(e))
        })?;
        info!(
            "Delivered message '{}' to {} recipient(s)",
            self.subject,
            self.to.len() + self.cc.len() + self.bcc.len()
        );
        Ok(response)
    }
}
