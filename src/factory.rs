//! Builds templated messages from configuration

use lettre::Transport;
use tracing::debug;

use crate::config::MailConfig;
use crate::context::MailContext;
use crate::error::{Error, Result};
use crate::mail::{BodyFormat, ConfiguredTransport, LettreMailer};
use crate::message::TemplatedMailMessage;
use crate::templates::TeraView;

/// Message type produced from a configuration file
pub type ConfiguredMessage<T = ConfiguredTransport> =
    TemplatedMailMessage<LettreMailer<T>, TeraView>;

/// Build a message using the transport named in `config`
pub fn message_from_config(config: &MailConfig) -> Result<ConfiguredMessage> {
    let transport = ConfiguredTransport::from_config(&config.transport)?;
    message_with_transport(config, transport)
}

/// Build a message from `config` that delivers through `transport`
pub fn message_with_transport<T>(
    config: &MailConfig,
    transport: T,
) -> Result<ConfiguredMessage<T>>
where
    T: Transport,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    let mut mailer = LettreMailer::new(transport);
    if let Some(from) = &config.mail.from {
        mailer.set_from(from)?;
    }
    if let Some(reply_to) = &config.mail.reply_to {
        mailer.set_reply_to(reply_to)?;
    }
    if let Some(subject) = &config.mail.subject {
        mailer.set_subject(subject.as_str());
    }
    mailer.set_format(config.mail.content_type);

    let mut view = TeraView::new();
    view.set_escape_html(config.mail.content_type == BodyFormat::Html);
    view.set_partial_root_paths(config.partial_root_paths.iter());

    let mut message = TemplatedMailMessage::new(mailer, view).with_locator(config.package_map());
    message.set_template_root_paths(config.template_root_paths.iter().cloned());
    debug!(
        "Message configured with {} template root(s)",
        config.template_root_paths.len()
    );
    Ok(message)
}

/// Context for a package registered in `config`
pub fn package_context(config: &MailConfig, key: &str) -> Result<MailContext> {
    let locator = config.package_map();
    MailContext::from_locator(key, &locator).ok_or_else(|| Error::unknown_package(key))
}
