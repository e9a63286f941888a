//! # Audit subsystem
//!
//! Append-only record of every adverse decision: what was decided, why, and
//! which notification channels were tried. Durable by default (fsync per
//! append) with an in-memory twin for tests.

mod errors;
mod record;
mod store;

pub use errors::{AuditError, AuditResult};
pub use record::{AuditRecord, NewAuditEntry, Stats};
pub use store::{AuditStore, FileAuditStore, MemoryAuditStore};
