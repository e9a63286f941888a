//! Command execution.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use crate::audit::{AuditStore, FileAuditStore};
use crate::config::AppConfig;
use crate::notify::Dispatcher;
use crate::pipeline::{DecisionKind, DecisionPipeline};
use crate::subject::Subject;

use super::args::{Args, AuditCommand, Command};

/// Subdirectory of the data dir holding the audit store.
const AUDIT_DIR: &str = "audit";

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Parse arguments and run the selected command.
pub fn run() -> CliResult {
    let args = Args::parse();
    let config = AppConfig::from_env();

    match args.command {
        Command::Decide {
            input,
            kind,
            adverse,
            probability,
        } => decide(&config, &input, kind, adverse, probability),
        Command::Audit { command } => audit(&config, command),
    }
}

fn open_store(config: &AppConfig) -> Result<FileAuditStore, Box<dyn std::error::Error>> {
    Ok(FileAuditStore::open(config.data_dir.join(AUDIT_DIR))?)
}

fn decide(
    config: &AppConfig,
    input: &Path,
    kind: DecisionKind,
    adverse: bool,
    probability: Option<f64>,
) -> CliResult {
    let raw = fs::read_to_string(input)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let subject = Subject::from_json(&value)
        .ok_or_else(|| format!("{}: subject file must be a flat JSON object", input.display()))?;

    let store = Arc::new(open_store(config)?);
    let dispatcher = Dispatcher::from_config(config);
    let pipeline = DecisionPipeline::new(kind, dispatcher, store);

    let outcome = pipeline.handle(&subject, adverse, probability);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn audit(config: &AppConfig, command: AuditCommand) -> CliResult {
    let store = open_store(config)?;
    match command {
        AuditCommand::List { limit, offset } => {
            let records = store.list(limit, offset)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        AuditCommand::Stats => {
            let stats = store.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        AuditCommand::Purge => {
            let purged = store.purge()?;
            println!("{}", serde_json::json!({ "purged": purged }));
        }
    }
    Ok(())
}
