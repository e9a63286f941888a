//! # Configuration
//!
//! Environment-driven configuration. Channel credentials come from the env
//! vars the deployment already exports; a channel missing any required
//! variable is simply absent, never an error.

use std::env;
use std::path::PathBuf;

use crate::notify::{EmailConfig, SEND_TIMEOUT};
#[cfg(feature = "sms")]
use crate::notify::SmsConfig;
use crate::observability::Logger;

/// Data directory used when `RISKGATE_DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "./riskgate_data";

/// Default SMTP submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root for the audit store and the dry-run log
    pub data_dir: PathBuf,
    /// Email channel, if fully configured
    pub email: Option<EmailConfig>,
    /// SMS channel, if fully configured
    #[cfg(feature = "sms")]
    pub sms: Option<SmsConfig>,
    /// Skip live delivery, log would-be notices instead
    pub dry_run: bool,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// - `RISKGATE_DATA_DIR` (default `./riskgate_data`)
    /// - `EMAIL_HOST`, `EMAIL_PORT`, `EMAIL_USER`, `EMAIL_PASS`,
    ///   `NOTIFY_EMAIL` for the email channel
    /// - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_FROM`,
    ///   `NOTIFY_PHONE` for the SMS channel
    /// - `NOTIFY_DRY_RUN` (truthy: `1`, `true`, `yes`, `on`)
    pub fn from_env() -> Self {
        Self {
            data_dir: nonempty("RISKGATE_DATA_DIR")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
            email: email_from_env(),
            #[cfg(feature = "sms")]
            sms: sms_from_env(),
            dry_run: truthy(nonempty("NOTIFY_DRY_RUN").as_deref()),
        }
    }
}

fn nonempty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn email_from_env() -> Option<EmailConfig> {
    let host = nonempty("EMAIL_HOST")?;
    let username = nonempty("EMAIL_USER")?;
    let password = nonempty("EMAIL_PASS")?;
    let port = match nonempty("EMAIL_PORT") {
        None => DEFAULT_SMTP_PORT,
        Some(raw) => match raw.parse() {
            Ok(port) => port,
            Err(_) => {
                Logger::warn("config.invalid_smtp_port", &[("value", &raw)]);
                return None;
            }
        },
    };
    Some(EmailConfig {
        host,
        port,
        username,
        password,
        recipient: nonempty("NOTIFY_EMAIL"),
        timeout: SEND_TIMEOUT,
    })
}

#[cfg(feature = "sms")]
fn sms_from_env() -> Option<SmsConfig> {
    Some(SmsConfig {
        account_sid: nonempty("TWILIO_ACCOUNT_SID")?,
        auth_token: nonempty("TWILIO_AUTH_TOKEN")?,
        from_number: nonempty("TWILIO_FROM")?,
        to_number: nonempty("NOTIFY_PHONE")?,
        timeout: SEND_TIMEOUT,
    })
}

fn truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
