//! # Decision pipeline
//!
//! Orchestrates the response to one scored decision: derive reasons, render
//! and dispatch the notice, persist the audit record. `handle` never fails;
//! degraded steps surface as warnings on the [`Outcome`] so a flaky SMTP
//! relay or a full disk cannot take the scoring path down.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audit::{AuditStore, NewAuditEntry};
use crate::notify::{self, Channel, Dispatcher};
use crate::observability::Logger;
use crate::reason;
use crate::subject::Subject;

/// What kind of decision is being handled. Selects the notice wording and
/// the subject fields that matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum DecisionKind {
    /// A payment flagged as fraudulent and blocked
    Transaction,
    /// A loan application scored for rejection
    LoanApplication,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Transaction => "transaction",
            DecisionKind::LoanApplication => "loan_application",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of handling one decision.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// Whether the decision was adverse (the pipeline only acts on these)
    pub adverse: bool,
    /// Model probability, echoed through
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    /// Derived reasons, adverse decisions only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasons: Option<Vec<String>>,
    /// Whether a live channel delivered; `None` for non-adverse decisions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notified: Option<bool>,
    /// Whether dispatch ran in dry-run mode
    pub dry_run: bool,
    /// Id of the persisted audit record, if persistence succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_id: Option<u64>,
    /// Degraded-step notes (failed channels, audit persistence failure)
    pub warnings: Vec<String>,
}

/// The decision-response pipeline. One instance per decision kind; shares
/// the dispatcher and store across calls.
pub struct DecisionPipeline {
    kind: DecisionKind,
    dispatcher: Dispatcher,
    store: Arc<dyn AuditStore>,
}

impl DecisionPipeline {
    pub fn new(kind: DecisionKind, dispatcher: Dispatcher, store: Arc<dyn AuditStore>) -> Self {
        Self {
            kind,
            dispatcher,
            store,
        }
    }

    /// Respond to one scored decision.
    ///
    /// Non-adverse decisions pass straight through. Adverse decisions get
    /// reasons, a dispatched notice and an audit record; every degradation
    /// along the way becomes a warning, never an error.
    pub fn handle(&self, subject: &Subject, adverse: bool, probability: Option<f64>) -> Outcome {
        if !adverse {
            Logger::info("pipeline.pass", &[("kind", self.kind.as_str())]);
            return Outcome {
                adverse: false,
                probability,
                reasons: None,
                notified: None,
                dry_run: false,
                audit_id: None,
                warnings: Vec::new(),
            };
        }

        let reasons = reason::reasons(subject);
        let reason_text = reason::render_reasons(&reasons);
        let dti = reason::debt_to_income(subject);

        let display = notify::display_name(self.kind, subject);
        let notice = notify::render_notice(self.kind, subject, &reasons, probability);
        let report = self.dispatcher.dispatch(subject, &display, &notice);

        let mut warnings = report.warnings.clone();
        for attempt in &report.attempts {
            if attempt.attempted && !attempt.succeeded && attempt.channel != Channel::Console {
                let cause = attempt.error.as_deref().unwrap_or("unknown error");
                warnings.push(format!(
                    "{} delivery failed: {}",
                    attempt.channel.as_str(),
                    cause
                ));
            }
        }

        let entry = NewAuditEntry::new(subject.clone(), &reason_text)
            .with_probability(probability)
            .with_debt_to_income(dti)
            .with_notified(report.delivered)
            .with_dry_run(report.dry_run)
            .with_channel_results(report.attempts.clone());

        let audit_id = match self.store.append(entry) {
            Ok(record) => Some(record.id),
            Err(e) => {
                let cause = e.to_string();
                Logger::error("pipeline.audit_failed", &[("error", &cause)]);
                warnings.push(format!("audit persistence failed: {}", cause));
                None
            }
        };

        Logger::info(
            "pipeline.adverse",
            &[
                (
                    "audit_id",
                    audit_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string())
                        .as_str(),
                ),
                ("kind", self.kind.as_str()),
                ("notified", if report.delivered { "true" } else { "false" }),
                ("reason", reason_text.as_str()),
            ],
        );

        Outcome {
            adverse: true,
            probability,
            reasons: Some(reasons),
            notified: Some(report.delivered),
            dry_run: report.dry_run,
            audit_id,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditError, AuditRecord, AuditResult, MemoryAuditStore, Stats};
    use crate::notify::{DryRunLog, MockEmailSender};

    fn loan_subject() -> Subject {
        Subject::new()
            .with("applicant_name", "A. Borrower")
            .with("applicant_email", "applicant@example.com")
            .with("cibil_score", 450.0)
            .with("income_annum", 500_000.0)
            .with("loan_amount", 400_000.0)
    }

    fn pipeline_with(dispatcher: Dispatcher, store: Arc<dyn AuditStore>) -> DecisionPipeline {
        DecisionPipeline::new(DecisionKind::LoanApplication, dispatcher, store)
    }

    #[test]
    fn test_non_adverse_passes_through() {
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = pipeline_with(Dispatcher::new(), store.clone());

        let outcome = pipeline.handle(&loan_subject(), false, Some(0.1));

        assert!(!outcome.adverse);
        assert_eq!(outcome.probability, Some(0.1));
        assert!(outcome.reasons.is_none());
        assert!(outcome.notified.is_none());
        assert!(outcome.audit_id.is_none());
        assert_eq!(store.stats().unwrap().total, 0);
    }

    #[test]
    fn test_adverse_notifies_and_audits() {
        let email = Arc::new(MockEmailSender::new());
        let store = Arc::new(MemoryAuditStore::new());
        let dispatcher = Dispatcher::new().with_email(email.clone(), None);
        let pipeline = pipeline_with(dispatcher, store.clone());

        let outcome = pipeline.handle(&loan_subject(), true, Some(0.9));

        assert!(outcome.adverse);
        assert_eq!(outcome.notified, Some(true));
        assert_eq!(outcome.audit_id, Some(1));
        assert!(outcome.warnings.is_empty());
        assert!(outcome
            .reasons
            .as_ref()
            .unwrap()
            .iter()
            .any(|r| r == "Low credit score"));
        assert_eq!(email.sent()[0].0, "applicant@example.com");

        let records = store.list(10, 0).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].notified);
        assert!(records[0].reason.contains("Low credit score"));
        assert!(records[0]
            .channel_results
            .iter()
            .any(|a| a.channel == Channel::Email && a.succeeded));
    }

    #[test]
    fn test_no_channels_falls_back_to_console() {
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = pipeline_with(Dispatcher::new(), store.clone());

        let outcome = pipeline.handle(&loan_subject(), true, None);

        assert_eq!(outcome.notified, Some(false));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w == "no destination configured"));

        let records = store.list(10, 0).unwrap();
        assert!(!records[0].notified);
        assert!(records[0]
            .channel_results
            .iter()
            .any(|a| a.channel == Channel::Console && a.succeeded));
    }

    #[test]
    fn test_failed_channel_becomes_warning() {
        let email = Arc::new(MockEmailSender::failing("connection refused"));
        let store = Arc::new(MemoryAuditStore::new());
        let dispatcher = Dispatcher::new().with_email(email, None);
        let pipeline = pipeline_with(dispatcher, store);

        let outcome = pipeline.handle(&loan_subject(), true, None);

        assert_eq!(outcome.notified, Some(false));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.starts_with("email delivery failed:")));
    }

    #[test]
    fn test_dry_run_flagged_on_outcome_and_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryAuditStore::new());
        let dispatcher = Dispatcher::new()
            .with_dry_run(DryRunLog::new(dir.path().join("notifications_dryrun.log")));
        let pipeline = pipeline_with(dispatcher, store.clone());

        let outcome = pipeline.handle(&loan_subject(), true, Some(0.8));

        assert!(outcome.dry_run);
        assert_eq!(outcome.notified, Some(true));
        let records = store.list(1, 0).unwrap();
        assert!(records[0].dry_run);
        assert!(records[0]
            .channel_results
            .iter()
            .any(|a| a.channel == Channel::DryRunLog && a.succeeded));
    }

    struct FailingStore;

    impl AuditStore for FailingStore {
        fn init_schema(&self) -> AuditResult<()> {
            Ok(())
        }
        fn append(&self, _entry: NewAuditEntry) -> AuditResult<AuditRecord> {
            Err(AuditError::Io {
                context: "appending record",
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        }
        fn list(&self, _limit: usize, _offset: usize) -> AuditResult<Vec<AuditRecord>> {
            Ok(Vec::new())
        }
        fn stats(&self) -> AuditResult<Stats> {
            Ok(Stats::empty())
        }
        fn purge(&self) -> AuditResult<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_audit_failure_is_a_warning_not_an_error() {
        let email = Arc::new(MockEmailSender::new());
        let dispatcher = Dispatcher::new().with_email(email, None);
        let pipeline = pipeline_with(dispatcher, Arc::new(FailingStore));

        let outcome = pipeline.handle(&loan_subject(), true, None);

        assert_eq!(outcome.notified, Some(true));
        assert!(outcome.audit_id.is_none());
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.starts_with("audit persistence failed:")));
    }
}
