//! The in-memory append-only ledger and chain verification.

use crate::entry::{AuditDraft, AuditEntry};
use crate::error::LedgerError;
use std::sync::RwLock;
use warden_canonical::GENESIS_HASH;
use warden_types::EventId;

/// Append-only, hash-chained audit ledger.
///
/// All appends pass through one write lock, so chain order matches the
/// order in which decisions were made.
pub struct AuditLedger {
    inner: RwLock<LedgerState>,
}

struct LedgerState {
    entries: Vec<AuditEntry>,
    head: String,
}

impl AuditLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerState {
                entries: Vec::new(),
                head: GENESIS_HASH.to_string(),
            }),
        }
    }

    /// Append one entry. The only mutation the ledger supports.
    pub fn append(&self, draft: AuditDraft) -> Result<AuditEntry, LedgerError> {
        let mut state = self.inner.write().map_err(|_| LedgerError::Lock)?;
        let entry = draft.finalize(state.head.clone())?;
        if entry.security_relevant {
            tracing::warn!(
                event_id = %entry.event_id,
                kind = ?entry.kind,
                "security-relevant audit entry appended"
            );
        } else {
            tracing::debug!(event_id = %entry.event_id, kind = ?entry.kind, "audit entry appended");
        }
        state.head = entry.hash.clone();
        state.entries.push(entry.clone());
        Ok(entry)
    }

    pub fn entries(&self) -> Result<Vec<AuditEntry>, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::Lock)?;
        Ok(state.entries.clone())
    }

    pub fn len(&self) -> Result<usize, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::Lock)?;
        Ok(state.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    pub fn head_hash(&self) -> Result<String, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::Lock)?;
        Ok(state.head.clone())
    }

    /// Serialize the ledger as newline-delimited JSON.
    pub fn export(&self) -> Result<String, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::Lock)?;
        let mut out = String::new();
        for entry in &state.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Replay a chain: recompute each entry's hash and check linkage.
    /// Every discrepancy is reported with the offending entry id.
    pub fn verify(entries: &[AuditEntry]) -> ChainVerification {
        let mut faults = Vec::new();
        let mut expected_prev = GENESIS_HASH.to_string();

        for (index, entry) in entries.iter().enumerate() {
            if entry.previous_hash != expected_prev {
                faults.push(ChainFault {
                    entry_id: entry.event_id.clone(),
                    index,
                    reason: format!(
                        "previous_hash mismatch: expected {expected_prev}, found {}",
                        entry.previous_hash
                    ),
                });
            }

            match entry.compute_hash() {
                Ok(computed) if computed == entry.hash => {}
                Ok(computed) => faults.push(ChainFault {
                    entry_id: entry.event_id.clone(),
                    index,
                    reason: format!("entry hash mismatch: recomputed {computed}"),
                }),
                Err(err) => faults.push(ChainFault {
                    entry_id: entry.event_id.clone(),
                    index,
                    reason: format!("entry not hashable: {err}"),
                }),
            }

            expected_prev = entry.hash.clone();
        }

        ChainVerification {
            valid: faults.is_empty(),
            checked: entries.len(),
            faults,
        }
    }

    /// Verify the current in-memory chain.
    pub fn verify_self(&self) -> Result<ChainVerification, LedgerError> {
        Ok(Self::verify(&self.entries()?))
    }

    /// Parse a JSONL export and verify it. Unparseable lines are chain
    /// faults in their own right, named by line, never hard errors.
    pub fn verify_export(jsonl: &str) -> ChainVerification {
        let mut entries = Vec::new();
        let mut parse_faults = Vec::new();
        for (line_no, line) in jsonl.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(err) => parse_faults.push(ChainFault {
                    entry_id: EventId::new(format!("export-line-{}", line_no + 1)),
                    index: line_no,
                    reason: format!("unparseable entry: {err}"),
                }),
            }
        }
        let mut verification = Self::verify(&entries);
        verification.checked += parse_faults.len();
        verification.faults.extend(parse_faults);
        verification.valid = verification.faults.is_empty();
        verification
    }
}

impl Default for AuditLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of replaying a chain.
#[derive(Clone, Debug)]
pub struct ChainVerification {
    pub valid: bool,
    pub checked: usize,
    pub faults: Vec<ChainFault>,
}

impl ChainVerification {
    /// Escalate an invalid chain into the error that must reach an
    /// operator.
    pub fn into_result(self) -> Result<(), LedgerError> {
        match self.faults.into_iter().next() {
            None => Ok(()),
            Some(fault) => Err(LedgerError::ChainIntegrityViolation {
                entry_id: fault.entry_id.to_string(),
                reason: fault.reason,
            }),
        }
    }
}

/// One verification discrepancy, naming the offending entry.
#[derive(Clone, Debug)]
pub struct ChainFault {
    pub entry_id: EventId,
    pub index: usize,
    pub reason: String,
}
