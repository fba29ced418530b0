//! Warden Ledger - the tamper-evident audit trail.
//!
//! Append is the only mutation. Each entry's hash covers a fixed field
//! subset plus the previous entry's hash, so silent deletion, edits, or
//! reordering are detectable by replaying the chain. Verification is the
//! sole tamper-detection mechanism; no external timestamping service is
//! involved.

#![deny(unsafe_code)]

pub mod entry;
pub mod error;
pub mod ledger;
pub mod sink;

pub use entry::{AuditDraft, AuditEntry, AuditEventKind, PolicyProvenance};
pub use error::LedgerError;
pub use ledger::{AuditLedger, ChainFault, ChainVerification};
pub use sink::{AuditSink, FileAuditSink, MemoryAuditSink};
