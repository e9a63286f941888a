//! # Email channel
//!
//! SMTP delivery via lettre, behind the [`EmailSender`] trait so the
//! dispatcher and pipeline can be exercised without a live relay.

use std::sync::RwLock;
use std::time::Duration;

use super::errors::{NotifyError, NotifyResult};
use super::message::Notice;

/// Email channel configuration.
///
/// All transport fields are required; a partially configured channel is
/// treated as absent by the configuration layer. The recipient may instead
/// be carried on the subject itself (`applicant_email`), so it is optional
/// here.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server host
    pub host: String,
    /// SMTP server port (STARTTLS)
    pub port: u16,
    /// SMTP username, also used as the From address
    pub username: String,
    /// SMTP password
    pub password: String,
    /// Default recipient; overridden by the subject's `applicant_email`
    pub recipient: Option<String>,
    /// Connect/send timeout
    pub timeout: Duration,
}

/// Email sender abstraction.
pub trait EmailSender: Send + Sync {
    /// Send a notice to the given address. A single attempt; errors are
    /// final for this dispatch.
    fn send(&self, to: &str, notice: &Notice) -> NotifyResult<()>;
}

/// Live SMTP sender (STARTTLS relay with credentials).
pub struct SmtpEmailSender {
    config: EmailConfig,
}

impl SmtpEmailSender {
    /// Create a sender from a complete email configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

impl EmailSender for SmtpEmailSender {
    fn send(&self, to: &str, notice: &Notice) -> NotifyResult<()> {
        use lettre::{
            message::header::ContentType,
            transport::smtp::authentication::Credentials,
            Message, SmtpTransport, Transport,
        };

        let email = Message::builder()
            .from(self.config.username.parse().map_err(|e| {
                NotifyError::InvalidAddress {
                    kind: "from",
                    detail: format!("{}", e),
                }
            })?)
            .to(to.parse().map_err(|e| NotifyError::InvalidAddress {
                kind: "to",
                detail: format!("{}", e),
            })?)
            .subject(notice.subject_line.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notice.body.clone())
            .map_err(|e| NotifyError::Smtp(format!("failed to build message: {}", e)))?;

        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = SmtpTransport::starttls_relay(&self.config.host)
            .map_err(|e| NotifyError::Smtp(format!("relay setup failed: {}", e)))?
            .credentials(creds)
            .port(self.config.port)
            .timeout(Some(self.config.timeout))
            .build();

        mailer
            .send(&email)
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        Ok(())
    }
}

/// Recording sender for tests: captures `(to, subject_line)` pairs, or
/// fails every send with a configured error.
#[derive(Debug, Default)]
pub struct MockEmailSender {
    sent: RwLock<Vec<(String, String)>>,
    fail_with: Option<String>,
}

impl MockEmailSender {
    /// A mock that accepts every send.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that rejects every send with the given SMTP error.
    pub fn failing(error: impl Into<String>) -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            fail_with: Some(error.into()),
        }
    }

    /// Number of accepted sends.
    pub fn sent_count(&self) -> usize {
        self.sent.read().unwrap().len()
    }

    /// Accepted sends as `(to, subject_line)` pairs.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.read().unwrap().clone()
    }
}

impl EmailSender for MockEmailSender {
    fn send(&self, to: &str, notice: &Notice) -> NotifyResult<()> {
        if let Some(error) = &self.fail_with {
            return Err(NotifyError::Smtp(error.clone()));
        }
        self.sent
            .write()
            .unwrap()
            .push((to.to_string(), notice.subject_line.clone()));
        Ok(())
    }
}
