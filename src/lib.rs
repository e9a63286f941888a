//! # riskgate
//!
//! Decision-response pipeline for financial risk models. Given one scored
//! decision (a blocked transaction or a rejected loan application), the
//! pipeline derives human-readable reasons, dispatches a notice across a
//! best-effort channel cascade (email, SMS, console fallback) and appends a
//! durable audit record.
//!
//! The scoring model itself is out of scope; this crate starts where the
//! model's verdict ends.

pub mod audit;
pub mod cli;
pub mod config;
pub mod notify;
pub mod observability;
pub mod pipeline;
pub mod reason;
pub mod subject;
