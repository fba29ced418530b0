//! Audit entry types and the draft -> finalized flow.
//!
//! A draft carries everything except the chain fields. Finalizing against
//! the chain head fills `previous_hash` and computes `hash` over the fixed
//! field subset in [`AuditEntry::hash_fields`]. That subset is a frozen
//! contract: extending the entry struct does not change existing hashes,
//! and changing the subset requires a canonical-version bump.

use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_types::{EventId, GateId, SignalSummary, WorkstationId};

/// What happened. Subtypes refine a kind without widening this enum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    GateCreated,
    SignalSubmitted,
    HumanApproved,
    GateApproved,
    GateDenied,
    GateTimeout,
    GateReset,
    GateInvalidated,
    DriftDetected,
    DriftReturned,
    DriftApproved,
    DriftTerminated,
}

impl AuditEventKind {
    /// Timeout, denial, and policy invalidation are always flagged for
    /// security review.
    pub fn security_relevant(&self) -> bool {
        matches!(
            self,
            AuditEventKind::GateTimeout
                | AuditEventKind::GateDenied
                | AuditEventKind::GateInvalidated
        )
    }
}

/// Full policy-hash provenance for one decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyProvenance {
    pub hash_at_creation: String,
    pub current_hash: String,
    pub mismatch: bool,
}

impl PolicyProvenance {
    pub fn matching(hash: impl Into<String>) -> Self {
        let hash = hash.into();
        Self {
            hash_at_creation: hash.clone(),
            current_hash: hash,
            mismatch: false,
        }
    }

    pub fn diverged(at_creation: impl Into<String>, current: impl Into<String>) -> Self {
        Self {
            hash_at_creation: at_creation.into(),
            current_hash: current.into(),
            mismatch: true,
        }
    }
}

/// One immutable ledger record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub event_id: EventId,
    pub kind: AuditEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub security_relevant: bool,
    pub timestamp: DateTime<Utc>,
    pub policy: PolicyProvenance,
    pub workstation: WorkstationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Redacted signal snapshots: booleans and counts only.
    pub signals: Vec<SignalSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate_id: Option<GateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate_duration_ms: Option<u64>,
    /// Hash of the prior entry, or the 64-zero genesis sentinel.
    pub previous_hash: String,
    pub hash: String,
}

impl AuditEntry {
    /// The exact fields covered by the entry hash. Frozen: changing this
    /// set is a ledger format version bump.
    pub fn hash_fields(&self) -> Result<serde_json::Value, LedgerError> {
        Ok(serde_json::json!({
            "event_id": self.event_id,
            "kind": self.kind,
            "subtype": self.subtype,
            "security_relevant": self.security_relevant,
            "timestamp": self.timestamp.to_rfc3339(),
            "policy": self.policy,
            "workstation": self.workstation,
            "actor": self.actor,
            "signals": self.signals,
            "gate_id": self.gate_id,
            "gate_duration_ms": self.gate_duration_ms,
            "previous_hash": self.previous_hash,
        }))
    }

    pub fn compute_hash(&self) -> Result<String, LedgerError> {
        Ok(warden_canonical::canonical_hash(&self.hash_fields()?)?)
    }
}

/// An audit entry before it joins the chain.
#[derive(Clone, Debug)]
pub struct AuditDraft {
    pub kind: AuditEventKind,
    pub subtype: Option<String>,
    pub security_relevant: bool,
    pub policy: PolicyProvenance,
    pub workstation: WorkstationId,
    pub actor: Option<String>,
    pub signals: Vec<SignalSummary>,
    pub gate_id: Option<GateId>,
    pub gate_duration_ms: Option<u64>,
}

impl AuditDraft {
    pub fn new(kind: AuditEventKind, workstation: WorkstationId, policy: PolicyProvenance) -> Self {
        let security_relevant = kind.security_relevant();
        Self {
            kind,
            subtype: None,
            security_relevant,
            policy,
            workstation,
            actor: None,
            signals: Vec::new(),
            gate_id: None,
            gate_duration_ms: None,
        }
    }

    pub fn subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn signals(mut self, signals: Vec<SignalSummary>) -> Self {
        self.signals = signals;
        self
    }

    pub fn gate(mut self, gate_id: GateId, duration_ms: u64) -> Self {
        self.gate_id = Some(gate_id);
        self.gate_duration_ms = Some(duration_ms);
        self
    }

    /// Attach chain position and compute the entry hash.
    pub fn finalize(self, previous_hash: String) -> Result<AuditEntry, LedgerError> {
        let mut entry = AuditEntry {
            event_id: EventId::generate(),
            kind: self.kind,
            subtype: self.subtype,
            security_relevant: self.security_relevant,
            timestamp: Utc::now(),
            policy: self.policy,
            workstation: self.workstation,
            actor: self.actor,
            signals: self.signals,
            gate_id: self.gate_id,
            gate_duration_ms: self.gate_duration_ms,
            previous_hash,
            hash: String::new(),
        };
        entry.hash = entry.compute_hash()?;
        Ok(entry)
    }
}
