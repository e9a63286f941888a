//! # Notification dispatcher
//!
//! Runs the prioritized channel cascade for one notice and reports every
//! attempt. Dispatch never fails: channel errors are folded into the
//! per-channel attempt records and the caller reads delivery state off the
//! report.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::observability::Logger;
use crate::subject::Subject;

use super::email::{EmailSender, SmtpEmailSender};
use super::errors::{NotifyError, NotifyResult};
use super::message::Notice;
#[cfg(feature = "sms")]
use super::sms::{SmsSender, TwilioSmsSender};

/// Warning emitted when neither email nor SMS has a usable destination.
pub const NO_DESTINATION_WARNING: &str = "no destination configured";

/// File name of the dry-run notification log inside the data directory.
pub const DRY_RUN_LOG_FILE: &str = "notifications_dryrun.log";

/// A notification delivery mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// SMTP email
    Email,
    /// SMS text message
    Sms,
    /// Local console/log fallback
    Console,
    /// Dry-run append-only log (test mode)
    DryRunLog,
}

impl Channel {
    /// String form used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Console => "console",
            Channel::DryRunLog => "dry_run_log",
        }
    }
}

/// Outcome of one channel within one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAttempt {
    /// Which channel
    pub channel: Channel,
    /// Whether a delivery was actually tried
    pub attempted: bool,
    /// Whether the attempt succeeded
    pub succeeded: bool,
    /// Failure cause, if any
    pub error: Option<String>,
}

impl ChannelAttempt {
    /// A successful attempt.
    pub fn success(channel: Channel) -> Self {
        Self {
            channel,
            attempted: true,
            succeeded: true,
            error: None,
        }
    }

    /// A failed attempt with its cause.
    pub fn failure(channel: Channel, error: impl Into<String>) -> Self {
        Self {
            channel,
            attempted: true,
            succeeded: false,
            error: Some(error.into()),
        }
    }

    /// A channel that was present but not fired (bookkeeping entry).
    pub fn skipped(channel: Channel) -> Self {
        Self {
            channel,
            attempted: false,
            succeeded: false,
            error: None,
        }
    }
}

/// Result of one dispatch across the cascade.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Per-channel attempts in cascade order (console entry always last)
    pub attempts: Vec<ChannelAttempt>,
    /// True iff a live channel (email/SMS) succeeded, or the dry-run log
    /// was written in dry-run mode. The console fallback never counts.
    pub delivered: bool,
    /// True iff this dispatch ran in dry-run mode
    pub dry_run: bool,
    /// Dispatcher-level warnings (e.g. no destination configured)
    pub warnings: Vec<String>,
}

impl DispatchReport {
    /// Look up the attempt entry for a channel.
    pub fn attempt(&self, channel: Channel) -> Option<&ChannelAttempt> {
        self.attempts.iter().find(|a| a.channel == channel)
    }
}

/// Append-only log receiving would-be notices in dry-run mode.
#[derive(Debug, Clone)]
pub struct DryRunLog {
    path: PathBuf,
}

impl DryRunLog {
    /// Create a log handle; the file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one notice block.
    pub fn append(&self, display: &str, to: &str, notice: &Notice) -> NotifyResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| NotifyError::DryRunLog(e.to_string()))?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| NotifyError::DryRunLog(e.to_string()))?;

        let banner = "=".repeat(70);
        let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        write!(
            file,
            "{banner}\nDRY-RUN NOTIFICATION - {stamp}\nTO: {to}\nRE: {display}\nSUBJECT: {subject}\n\n{body}\n{banner}\n\n",
            subject = notice.subject_line,
            body = notice.body,
        )
        .map_err(|e| NotifyError::DryRunLog(e.to_string()))?;
        Ok(())
    }
}

struct EmailRoute {
    sender: Arc<dyn EmailSender>,
    recipient: Option<String>,
}

#[cfg(feature = "sms")]
struct SmsRoute {
    sender: Arc<dyn SmsSender>,
    to_number: String,
}

/// The notification dispatcher: holds the configured channels for the
/// process lifetime and runs the cascade per decision.
pub struct Dispatcher {
    email: Option<EmailRoute>,
    #[cfg(feature = "sms")]
    sms: Option<SmsRoute>,
    dry_run: Option<DryRunLog>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// A dispatcher with no channels; every dispatch degrades to the
    /// console fallback.
    pub fn new() -> Self {
        Self {
            email: None,
            #[cfg(feature = "sms")]
            sms: None,
            dry_run: None,
        }
    }

    /// Build the live dispatcher from the application configuration.
    ///
    /// In dry-run mode no transports are constructed at all; the only
    /// destination is the local log.
    pub fn from_config(config: &AppConfig) -> Self {
        if config.dry_run {
            return Self::new()
                .with_dry_run(DryRunLog::new(config.data_dir.join(DRY_RUN_LOG_FILE)));
        }

        let mut dispatcher = Self::new();
        if let Some(email) = &config.email {
            let recipient = email.recipient.clone();
            dispatcher =
                dispatcher.with_email(Arc::new(SmtpEmailSender::new(email.clone())), recipient);
        }
        #[cfg(feature = "sms")]
        if let Some(sms) = &config.sms {
            let to_number = sms.to_number.clone();
            dispatcher =
                dispatcher.with_sms(Arc::new(TwilioSmsSender::new(sms.clone())), to_number);
        }
        dispatcher
    }

    /// Attach an email channel.
    pub fn with_email(mut self, sender: Arc<dyn EmailSender>, recipient: Option<String>) -> Self {
        self.email = Some(EmailRoute { sender, recipient });
        self
    }

    /// Attach an SMS channel.
    #[cfg(feature = "sms")]
    pub fn with_sms(mut self, sender: Arc<dyn SmsSender>, to_number: String) -> Self {
        self.sms = Some(SmsRoute { sender, to_number });
        self
    }

    /// Force dry-run mode: skip real delivery, log the would-be notice.
    pub fn with_dry_run(mut self, log: DryRunLog) -> Self {
        self.dry_run = Some(log);
        self
    }

    /// Run the cascade for one notice.
    ///
    /// Every configured channel is attempted regardless of earlier success
    /// (preserved source behavior, kept for audit completeness). The console
    /// fallback fires iff nothing succeeded.
    pub fn dispatch(&self, subject: &Subject, display: &str, notice: &Notice) -> DispatchReport {
        if let Some(log) = &self.dry_run {
            return Self::dispatch_dry_run(log, subject, display, notice);
        }

        let mut attempts = Vec::new();
        let mut warnings = Vec::new();
        let mut delivered = false;
        let mut destinations = 0usize;

        if let Some(route) = &self.email {
            if let Some(to) = Self::email_recipient(route, subject) {
                destinations += 1;
                match route.sender.send(&to, notice) {
                    Ok(()) => {
                        delivered = true;
                        Logger::info("notify.email.sent", &[("to", &to)]);
                        attempts.push(ChannelAttempt::success(Channel::Email));
                    }
                    Err(e) => {
                        let cause = e.to_string();
                        Logger::warn("notify.email.failed", &[("error", &cause), ("to", &to)]);
                        attempts.push(ChannelAttempt::failure(Channel::Email, cause));
                    }
                }
            }
        }

        #[cfg(feature = "sms")]
        if let Some(route) = &self.sms {
            destinations += 1;
            match route.sender.send(&route.to_number, &notice.body) {
                Ok(sid) => {
                    delivered = true;
                    Logger::info("notify.sms.sent", &[("sid", &sid), ("to", &route.to_number)]);
                    attempts.push(ChannelAttempt::success(Channel::Sms));
                }
                Err(e) => {
                    let cause = e.to_string();
                    Logger::warn(
                        "notify.sms.failed",
                        &[("error", &cause), ("to", &route.to_number)],
                    );
                    attempts.push(ChannelAttempt::failure(Channel::Sms, cause));
                }
            }
        }

        if destinations == 0 {
            warnings.push(NO_DESTINATION_WARNING.to_string());
        }

        if delivered {
            attempts.push(ChannelAttempt::skipped(Channel::Console));
        } else {
            // Terminal fallback: always available, never counts as delivery.
            Logger::warn(
                "notify.console",
                &[
                    ("body", notice.body.as_str()),
                    ("display", display),
                    ("subject", notice.subject_line.as_str()),
                ],
            );
            attempts.push(ChannelAttempt::success(Channel::Console));
        }

        DispatchReport {
            attempts,
            delivered,
            dry_run: false,
            warnings,
        }
    }

    fn dispatch_dry_run(
        log: &DryRunLog,
        subject: &Subject,
        display: &str,
        notice: &Notice,
    ) -> DispatchReport {
        let to = match subject.text("applicant_email") {
            "" => "-".to_string(),
            addr => addr.to_string(),
        };

        let mut attempts = Vec::new();
        let delivered = match log.append(display, &to, notice) {
            Ok(()) => {
                Logger::info(
                    "notify.dry_run.logged",
                    &[("path", &log.path().display().to_string()), ("to", &to)],
                );
                attempts.push(ChannelAttempt::success(Channel::DryRunLog));
                true
            }
            Err(e) => {
                let cause = e.to_string();
                Logger::warn("notify.dry_run.failed", &[("error", &cause)]);
                attempts.push(ChannelAttempt::failure(Channel::DryRunLog, cause));
                false
            }
        };

        DispatchReport {
            attempts,
            delivered,
            dry_run: true,
            warnings: Vec::new(),
        }
    }

    /// Effective email recipient: configured address first, then the
    /// subject's own `applicant_email` field.
    fn email_recipient(route: &EmailRoute, subject: &Subject) -> Option<String> {
        route
            .recipient
            .clone()
            .filter(|r| !r.is_empty())
            .or_else(|| match subject.text("applicant_email") {
                "" => None,
                addr => Some(addr.to_string()),
            })
    }
}
