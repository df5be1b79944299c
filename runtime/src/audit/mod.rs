//! Append-only audit trail of scrape operations.

pub mod logger;

pub use logger::{AuditEvent, AuditLogger};
