//! # Audit records
//!
//! The persisted shape of one adverse decision, plus the builder the
//! pipeline uses to stage a record before the store assigns its identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::ChannelAttempt;
use crate::subject::Subject;

/// One persisted adverse decision.
///
/// `id` and `timestamp` are assigned by the store on append; everything
/// else is supplied by the pipeline via [`NewAuditEntry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Store-assigned identifier, strictly increasing, never reused
    pub id: u64,
    /// Store-assigned append time (UTC)
    pub timestamp: DateTime<Utc>,
    /// The decision subject as received
    pub subject: Subject,
    /// Model probability, if one accompanied the decision
    pub probability: Option<f64>,
    /// Computed debt-to-income ratio (percent)
    pub debt_to_income_ratio: f64,
    /// Rendered reason text ("; "-joined)
    pub reason: String,
    /// Whether any live channel delivered the notice
    pub notified: bool,
    /// Whether this decision ran in dry-run mode
    pub dry_run: bool,
    /// Per-channel dispatch outcomes
    pub channel_results: Vec<ChannelAttempt>,
}

/// Staged audit data awaiting an id and timestamp.
#[derive(Debug, Clone, Default)]
pub struct NewAuditEntry {
    pub subject: Subject,
    pub probability: Option<f64>,
    pub debt_to_income_ratio: f64,
    pub reason: String,
    pub notified: bool,
    pub dry_run: bool,
    pub channel_results: Vec<ChannelAttempt>,
}

impl NewAuditEntry {
    /// Stage an entry for the given subject and reason text.
    pub fn new(subject: Subject, reason: impl Into<String>) -> Self {
        Self {
            subject,
            reason: reason.into(),
            ..Self::default()
        }
    }

    pub fn with_probability(mut self, probability: Option<f64>) -> Self {
        self.probability = probability;
        self
    }

    pub fn with_debt_to_income(mut self, ratio: f64) -> Self {
        self.debt_to_income_ratio = ratio;
        self
    }

    pub fn with_notified(mut self, notified: bool) -> Self {
        self.notified = notified;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_channel_results(mut self, results: Vec<ChannelAttempt>) -> Self {
        self.channel_results = results;
        self
    }

    pub(crate) fn into_record(self, id: u64, timestamp: DateTime<Utc>) -> AuditRecord {
        AuditRecord {
            id,
            timestamp,
            subject: self.subject,
            probability: self.probability,
            debt_to_income_ratio: self.debt_to_income_ratio,
            reason: self.reason,
            notified: self.notified,
            dry_run: self.dry_run,
            channel_results: self.channel_results,
        }
    }
}

/// Aggregate view over the audit log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    /// Number of records
    pub total: u64,
    /// Records where a live channel delivered
    pub notified_count: u64,
    /// Mean probability over records that carry one; `None` if none do
    pub avg_probability: Option<f64>,
    /// Mean debt-to-income ratio; `None` when the log is empty
    pub avg_debt_to_income: Option<f64>,
}

impl Stats {
    /// Stats of an empty log.
    pub fn empty() -> Self {
        Self {
            total: 0,
            notified_count: 0,
            avg_probability: None,
            avg_debt_to_income: None,
        }
    }

    /// Fold a set of records into aggregates.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AuditRecord>) -> Self {
        let mut total = 0u64;
        let mut notified_count = 0u64;
        let mut probability_sum = 0.0;
        let mut probability_n = 0u64;
        let mut dti_sum = 0.0;

        for record in records {
            total += 1;
            if record.notified {
                notified_count += 1;
            }
            if let Some(p) = record.probability {
                probability_sum += p;
                probability_n += 1;
            }
            dti_sum += record.debt_to_income_ratio;
        }

        Self {
            total,
            notified_count,
            avg_probability: (probability_n > 0).then(|| probability_sum / probability_n as f64),
            avg_debt_to_income: (total > 0).then(|| dti_sum / total as f64),
        }
    }
}
