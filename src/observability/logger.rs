//! Structured JSON logger
//!
//! One log line = one event. Lines are JSON objects with deterministic key
//! ordering (event and severity first, remaining fields alphabetical), written
//! synchronously so log order matches event order. INFO goes to stdout,
//! WARN and ERROR to stderr.

use std::fmt;
use std::io::{self, Write};

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Normal operations
    Info,
    /// Recoverable issues (degraded channels, skipped records)
    Warn,
    /// Operation failures
    Error,
}

impl Severity {
    /// String representation used in log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Synchronous structured logger.
pub struct Logger;

impl Logger {
    /// Log at INFO level.
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::write_line(Severity::Info, event, fields, &mut io::stdout());
    }

    /// Log at WARN level.
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::write_line(Severity::Warn, event, fields, &mut io::stderr());
    }

    /// Log at ERROR level.
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::write_line(Severity::Error, event, fields, &mut io::stderr());
    }

    fn write_line<W: Write>(severity: Severity, event: &str, fields: &[(&str, &str)], out: &mut W) {
        let mut line = String::with_capacity(128);
        line.push_str("{\"event\":\"");
        escape_into(&mut line, event);
        line.push_str("\",\"severity\":\"");
        line.push_str(severity.as_str());
        line.push('"');

        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);
        for (key, value) in sorted {
            line.push_str(",\"");
            escape_into(&mut line, key);
            line.push_str("\":\"");
            escape_into(&mut line, value);
            line.push('"');
        }

        line.push_str("}\n");

        // One write_all per event keeps lines intact under concurrency.
        let _ = out.write_all(line.as_bytes());
        let _ = out.flush();
    }
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut buf = Vec::new();
        Logger::write_line(severity, event, fields, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_event_and_severity_lead() {
        let line = render(Severity::Info, "decision.adverse", &[]);
        assert!(line.starts_with("{\"event\":\"decision.adverse\",\"severity\":\"INFO\""));
        assert!(line.ends_with("}\n"));
    }

    #[test]
    fn test_fields_sorted_alphabetically() {
        let line = render(
            Severity::Warn,
            "test",
            &[("zeta", "1"), ("alpha", "2"), ("mid", "3")],
        );
        let alpha = line.find("alpha").unwrap();
        let mid = line.find("mid").unwrap();
        let zeta = line.find("zeta").unwrap();
        assert!(alpha < mid && mid < zeta);
    }

    #[test]
    fn test_output_is_valid_json() {
        let line = render(
            Severity::Error,
            "channel.failed",
            &[("error", "quote \" and\nnewline"), ("channel", "email")],
        );
        let parsed: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed["severity"], "ERROR");
        assert_eq!(parsed["error"], "quote \" and\nnewline");
    }
}
