//! Certificate delivery by email.
//!
//! [`Notifier`] is the seam the pipeline calls; [`SmtpNotifier`] is the real
//! implementation over a blocking `lettre` SMTP transport. The transport is
//! built once from an explicit [`SmtpConfig`] and reused for every record.

use std::path::{Path, PathBuf};

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::error::NotifyError;

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// One outgoing certificate email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// The merged certificate, attached as `application/pdf`.
    pub attachment: PathBuf,
}

/// Delivers a [`Notification`].
pub trait Notifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        (**self).send(notification)
    }
}

// ---------------------------------------------------------------------------
// SmtpConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Sender credentials and relay.
#[derive(Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    /// Sender address; also the SMTP login.
    pub address: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SmtpConfig {
    /// Read settings from the process environment.
    ///
    /// | Variable         | Required | Default |
    /// |------------------|----------|---------|
    /// | `EMAIL_ADDRESS`  | yes      |         |
    /// | `EMAIL_PASSWORD` | yes      |         |
    /// | `SMTP_SERVER`    | yes      |         |
    /// | `SMTP_PORT`      | no       | `587`   |
    pub fn from_env() -> Result<Self, NotifyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SmtpConfig::from_env`] over an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NotifyError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| NotifyError::Config(format!("{key} is not set")))
        };
        let port = match lookup("SMTP_PORT") {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .map_err(|_| NotifyError::Config(format!("SMTP_PORT is not a port number: {raw}")))?,
            _ => DEFAULT_SMTP_PORT,
        };
        Ok(Self {
            server: required("SMTP_SERVER")?,
            port,
            address: required("EMAIL_ADDRESS")?,
            password: required("EMAIL_PASSWORD")?,
        })
    }
}

// ---------------------------------------------------------------------------
// SmtpNotifier
// ---------------------------------------------------------------------------

/// Sends certificates through an authenticated STARTTLS relay.
pub struct SmtpNotifier {
    from: Mailbox,
    transport: SmtpTransport,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config.address.parse()?;
        let transport = SmtpTransport::starttls_relay(&config.server)?
            .port(config.port)
            .credentials(Credentials::new(
                config.address.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self { from, transport })
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = build_message(self.from.clone(), notification)?;
        self.transport.send(&email)?;
        tracing::info!(to = %notification.to, "certificate emailed");
        Ok(())
    }
}

/// Assemble the multipart message: plain-text body plus the PDF attachment.
pub fn build_message(from: Mailbox, notification: &Notification) -> Result<Message, NotifyError> {
    let path = &notification.attachment;
    let bytes = std::fs::read(path).map_err(|source| NotifyError::Io {
        path: path.clone(),
        source,
    })?;
    let pdf = ContentType::parse("application/pdf").map_err(|e| NotifyError::Build(e.to_string()))?;

    Message::builder()
        .from(from)
        .to(notification.to.parse()?)
        .subject(notification.subject.clone())
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(notification.body.clone()))
                .singlepart(Attachment::new(attachment_name(path)).body(bytes, pdf)),
        )
        .map_err(|e| NotifyError::Build(e.to_string()))
}

fn attachment_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "certificate.pdf".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_reads_all_variables() {
        let config = SmtpConfig::from_lookup(lookup(&[
            ("EMAIL_ADDRESS", "academy@example.org"),
            ("EMAIL_PASSWORD", "hunter2"),
            ("SMTP_SERVER", "smtp.example.org"),
            ("SMTP_PORT", "2525"),
        ]))
        .expect("config");
        assert_eq!(config.port, 2525);
        assert_eq!(config.server, "smtp.example.org");
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn config_defaults_port_and_requires_credentials() {
        let config = SmtpConfig::from_lookup(lookup(&[
            ("EMAIL_ADDRESS", "a@example.org"),
            ("EMAIL_PASSWORD", "pw"),
            ("SMTP_SERVER", "smtp.example.org"),
        ]))
        .unwrap();
        assert_eq!(config.port, DEFAULT_SMTP_PORT);

        let err = SmtpConfig::from_lookup(lookup(&[("SMTP_SERVER", "smtp.example.org")])).unwrap_err();
        assert!(err.to_string().contains("EMAIL_ADDRESS"), "got: {err}");
    }

    #[test]
    fn config_rejects_bad_port() {
        let err = SmtpConfig::from_lookup(lookup(&[
            ("EMAIL_ADDRESS", "a@example.org"),
            ("EMAIL_PASSWORD", "pw"),
            ("SMTP_SERVER", "smtp.example.org"),
            ("SMTP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, NotifyError::Config(_)));
    }

    #[test]
    fn message_carries_pdf_attachment() {
        let dir = tempfile::TempDir::new().unwrap();
        let pdf = dir.path().join("Bioinformatics_Jane_Doe.pdf");
        std::fs::write(&pdf, b"%PDF-1.5\n%%EOF").unwrap();
        let notification = Notification {
            to: "jane@example.com".into(),
            subject: "Your certificate".into(),
            body: "Dear Jane Doe,".into(),
            attachment: pdf,
        };
        let from: Mailbox = "academy@example.org".parse().unwrap();
        let message = build_message(from, &notification).expect("message");
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        assert!(raw.contains("Subject: Your certificate"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("Bioinformatics_Jane_Doe.pdf"));
    }

    #[test]
    fn bad_recipient_is_address_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let pdf = dir.path().join("c.pdf");
        std::fs::write(&pdf, b"%PDF").unwrap();
        let notification = Notification {
            to: "not an address".into(),
            subject: "s".into(),
            body: "b".into(),
            attachment: pdf,
        };
        let from: Mailbox = "academy@example.org".parse().unwrap();
        let err = build_message(from, &notification).unwrap_err();
        assert!(matches!(err, NotifyError::Address(_)), "got: {err}");
    }

    #[test]
    fn missing_attachment_is_io_error() {
        let notification = Notification {
            to: "jane@example.com".into(),
            subject: "s".into(),
            body: "b".into(),
            attachment: PathBuf::from("/definitely/not/here.pdf"),
        };
        let from: Mailbox = "academy@example.org".parse().unwrap();
        assert!(matches!(
            build_message(from, &notification).unwrap_err(),
            NotifyError::Io { .. }
        ));
    }
}
