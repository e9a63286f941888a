//! # Command-line interface

mod args;
mod commands;

pub use args::{Args, AuditCommand, Command};
pub use commands::{run, CliResult};
