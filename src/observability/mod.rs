//! Observability for riskgate
//!
//! Structured logging only; metrics and tracing layers are out of scope.

mod logger;

pub use logger::{Logger, Severity};
