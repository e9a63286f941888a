//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::pipeline::DecisionKind;

#[derive(Parser)]
#[command(
    name = "riskgate",
    version,
    about = "Decision-response pipeline: reasons, notifications, audit trail"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Handle one scored decision read from a JSON subject file
    Decide {
        /// Path to the subject file (flat JSON object)
        input: PathBuf,

        /// Kind of decision
        #[arg(long, value_enum, default_value_t = DecisionKind::LoanApplication)]
        kind: DecisionKind,

        /// Mark the decision adverse (reasons, notice, audit record)
        #[arg(long)]
        adverse: bool,

        /// Model probability in [0, 1]
        #[arg(long)]
        probability: Option<f64>,
    },

    /// Inspect or maintain the audit log
    Audit {
        #[command(subcommand)]
        command: AuditCommand,
    },
}

#[derive(Subcommand)]
pub enum AuditCommand {
    /// List records, newest first
    List {
        /// Maximum records to print
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Records to skip before printing
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Print aggregate statistics
    Stats,

    /// Delete all records (record ids are never reused)
    Purge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        Args::try_parse_from(["riskgate", "decide", "subject.json", "--adverse"]).unwrap();
        Args::try_parse_from([
            "riskgate",
            "decide",
            "subject.json",
            "--kind",
            "transaction",
            "--probability",
            "0.93",
        ])
        .unwrap();
        Args::try_parse_from(["riskgate", "audit", "list", "--limit", "5", "--offset", "10"])
            .unwrap();
        Args::try_parse_from(["riskgate", "audit", "stats"]).unwrap();
        Args::try_parse_from(["riskgate", "audit", "purge"]).unwrap();
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(
            Args::try_parse_from(["riskgate", "decide", "s.json", "--kind", "mortgage"]).is_err()
        );
    }
}
