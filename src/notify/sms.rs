//! # SMS channel
//!
//! Text-message delivery through the Twilio Messages API, behind the
//! [`SmsSender`] trait. Compiled only with the `sms` feature: a build
//! without it models a process where the provider client is not present,
//! and the channel is permanently skipped.

use std::sync::RwLock;
use std::time::Duration;

use super::errors::{NotifyError, NotifyResult};

/// SMS channel configuration. All fields required; a partial set means the
/// channel is absent.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    /// Provider account SID
    pub account_sid: String,
    /// Provider auth token
    pub auth_token: String,
    /// Sender number (E.164)
    pub from_number: String,
    /// Recipient number (E.164)
    pub to_number: String,
    /// Request timeout
    pub timeout: Duration,
}

/// SMS sender abstraction. Returns the provider message id on success.
pub trait SmsSender: Send + Sync {
    /// Send a text body to the given number. Single attempt.
    fn send(&self, to: &str, body: &str) -> NotifyResult<String>;
}

/// Live Twilio sender over HTTP basic auth.
pub struct TwilioSmsSender {
    config: SmsConfig,
    agent: ureq::Agent,
}

impl TwilioSmsSender {
    /// Create a sender with a bounded-timeout HTTP agent.
    pub fn new(config: SmsConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { config, agent }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        )
    }
}

impl SmsSender for TwilioSmsSender {
    fn send(&self, to: &str, body: &str) -> NotifyResult<String> {
        use base64::Engine as _;

        let auth = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.config.account_sid, self.config.auth_token
        ));

        let response = self
            .agent
            .post(&self.endpoint())
            .set("Authorization", &format!("Basic {}", auth))
            .send_form(&[
                ("From", self.config.from_number.as_str()),
                ("To", to),
                ("Body", body),
            ])
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        let payload: serde_json::Value = response
            .into_json()
            .map_err(|e| NotifyError::Http(format!("invalid provider response: {}", e)))?;

        Ok(payload
            .get("sid")
            .and_then(|sid| sid.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

/// Recording sender for tests: captures `(to, body)` pairs, or fails every
/// send with a configured error.
#[derive(Debug, Default)]
pub struct MockSmsSender {
    sent: RwLock<Vec<(String, String)>>,
    fail_with: Option<String>,
}

impl MockSmsSender {
    /// A mock that accepts every send.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that rejects every send with the given provider error.
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

    /// Accepted sends as `(to, body)` pairs.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.read().unwrap().clone()
    }
}

impl SmsSender for MockSmsSender {
    fn send(&self, to: &str, body: &str) -> NotifyResult<String> {
        if let Some(error) = &self.fail_with {
            return Err(NotifyError::Http(error.clone()));
        }
        self.sent
            .write()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(format!("MOCK_SID_{}", self.sent_count()))
    }
}
