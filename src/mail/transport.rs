//! Transport selected from configuration

use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::stub::StubTransport;
use lettre::{FileTransport, SmtpTransport, Transport};
use tracing::{debug, info};

use super::errors::TransportError;
use crate::config::{SmtpTls, TransportConfig};

/// One of the lettre transports the configuration can name
pub enum ConfiguredTransport {
    Smtp(SmtpTransport),
    File(FileTransport),
    Stub(StubTransport),
}

impl ConfiguredTransport {
    pub fn from_config(config: &TransportConfig) -> Result<Self, TransportError> {
        match config {
            TransportConfig::File { dir } => {
                info!("Writing outgoing mail to {}", dir.display());
                Ok(Self::File(FileTransport::new(dir)))
            }
            TransportConfig::Stub => Ok(Self::Stub(StubTransport::new_ok())),
            TransportConfig::Smtp {
                host,
                port,
                username,
                password,
                tls,
            } => {
                let mut builder = match tls {
                    SmtpTls::Starttls => SmtpTransport::starttls_relay(host)?,
                    SmtpTls::Tls => SmtpTransport::relay(host)?,
                    SmtpTls::None => SmtpTransport::builder_dangerous(host),
                };
                if let Some(port) = port {
                    builder = builder.port(*port);
                }
                if let (Some(username), Some(password)) = (username, password) {
                    builder = builder.credentials(Credentials::new(
                        username.clone(),
                        password.clone(),
                    ));
                }
                debug!("SMTP transport for {} ({:?})", host, tls);
                Ok(Self::Smtp(builder.build()))
            }
        }
    }
}

impl Transport for ConfiguredTransport {
    type Ok = ();
    type Error = TransportError;

    fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<(), TransportError> {
        match self {
            Self::Smtp(transport) => transport.send_raw(envelope, email).map(|_| ())?,
            Self::File(transport) => transport.send_raw(envelope, email).map(|_| ())?,
            Self::Stub(transport) => transport.send_raw(envelope, email)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::{LettreMailer, MailSender};
    use tempfile::TempDir;

    #[test]
    fn test_file_transport_writes_eml() {
        let temp_dir = TempDir::new().unwrap();
        let transport = ConfiguredTransport::from_config(&TransportConfig::File {
            dir: temp_dir.path().to_path_buf(),
        })
        .unwrap();

        let mut mailer = LettreMailer::new(transport);
        mailer
            .set_from("shop@example.com")
            .unwrap()
            .add_to("alice@example.com")
            .unwrap();
        mailer.set_body("Hello from the outbox".to_string());
        mailer.send().unwrap();

        let files: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        let written = std::fs::read_to_string(&files[0]).unwrap();
        assert!(written.contains("Hello from the outbox"));
    }

    #[test]
    fn test_smtp_transport_from_config() {
        let transport = ConfiguredTransport::from_config(&TransportConfig::Smtp {
            host: "localhost".to_string(),
            port: Some(2525),
            username: Some("user".to_string()),
            password: Some("secret".to_string()),
            tls: SmtpTls::None,
        })
        .unwrap();
        assert!(matches!(transport, ConfiguredTransport::Smtp(_)));
    }

    #[test]
    fn test_stub_transport_from_config() {
        let transport = ConfiguredTransport::from_config(&TransportConfig::Stub).unwrap();
        assert!(matches!(transport, ConfiguredTransport::Stub(_)));
    }
}
