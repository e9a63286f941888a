//! # Notification subsystem
//!
//! Best-effort delivery of adverse-decision notices across a prioritized
//! channel cascade: email (SMTP), SMS (HTTP provider), console fallback.
//!
//! Design rules:
//! - A channel with incomplete configuration is skipped, not failed.
//! - A delivery failure is recorded per channel and never propagated.
//! - Every configured channel is attempted regardless of earlier success;
//!   downstream consumers treat any live success as "notified".
//! - The console fallback fires only when no configured channel succeeded,
//!   and its own success never counts as delivery.
//! - Single attempt per channel per dispatch; no retry, no backoff.

use std::time::Duration;

mod dispatcher;
mod email;
mod errors;
mod message;
#[cfg(feature = "sms")]
mod sms;

pub use dispatcher::{
    Channel, ChannelAttempt, DispatchReport, Dispatcher, DryRunLog, DRY_RUN_LOG_FILE,
    NO_DESTINATION_WARNING,
};
pub use email::{EmailConfig, EmailSender, MockEmailSender, SmtpEmailSender};
pub use errors::{NotifyError, NotifyResult};
pub use message::{display_name, render_notice, Notice};
#[cfg(feature = "sms")]
pub use sms::{MockSmsSender, SmsConfig, SmsSender, TwilioSmsSender};

/// Bounded connect/send timeout applied to every live transport, so a hung
/// channel cannot stall the pipeline. Timeout is a channel failure, not a
/// pipeline error.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(5);
