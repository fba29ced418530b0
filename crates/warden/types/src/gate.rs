//! Gates and their two keys.

use crate::ids::{AgentId, GateId, TabGroupId, WorkstationId};
use crate::policy::PolicyBinding;
use crate::signal::ValidatedSignal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Category of the sensitive action a gate protects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Authentication,
    Payment,
    Submission,
    Deletion,
}

/// Gate lifecycle states. Status is a pure function of the two keys, the
/// timeout window, and the policy binding - it is never set independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Pending,
    KeyAApproved,
    KeyBApproved,
    Approved,
    Denied,
    Timeout,
    Reset,
    Invalidated,
}

impl GateStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GateStatus::Approved
                | GateStatus::Denied
                | GateStatus::Timeout
                | GateStatus::Reset
                | GateStatus::Invalidated
        )
    }
}

/// How the human half of the approval was delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMethod {
    Console,
    Hardware,
    Verbal,
    Delegated,
}

/// A human actor. An operator id or local-account identity - never a
/// credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorIdentity {
    pub operator_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ActorIdentity {
    pub fn new(operator_id: impl Into<String>) -> Self {
        Self {
            operator_id: operator_id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Key A: explicit human confirmation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HumanKey {
    pub approved: bool,
    pub approver: Option<ActorIdentity>,
    pub approved_at: Option<DateTime<Utc>>,
    pub method: Option<ApprovalMethod>,
}

impl HumanKey {
    pub fn approve(&mut self, approver: ActorIdentity, method: ApprovalMethod) {
        self.approved = true;
        self.approver = Some(approver);
        self.approved_at = Some(Utc::now());
        self.method = Some(method);
    }
}

/// Key B: multi-signal system consensus. Only signals whose validator
/// passed count toward the threshold.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemKey {
    pub approved: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub signals: Vec<ValidatedSignal>,
    pub threshold: usize,
}

impl SystemKey {
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            approved: false,
            verified_at: None,
            signals: Vec::new(),
            threshold,
        }
    }

    pub fn passing_count(&self) -> usize {
        self.signals.iter().filter(|s| s.passed).count()
    }

    /// Record one validated signal and recompute consensus.
    pub fn record(&mut self, signal: ValidatedSignal) {
        self.signals.push(signal);
        if !self.approved && self.passing_count() >= self.threshold {
            self.approved = true;
            self.verified_at = Some(Utc::now());
        }
    }
}

/// Who configured the timeout window, recorded for audit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutSource {
    Policy,
    SystemDefault,
}

/// The gate's expiry window. A warning instant precedes expiry so callers
/// can prompt the operator before the gate dies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeoutWindow {
    pub duration: Duration,
    pub expires_at: DateTime<Utc>,
    pub warn_at: DateTime<Utc>,
    pub configured_by: TimeoutSource,
}

impl TimeoutWindow {
    pub fn starting(
        created_at: DateTime<Utc>,
        duration: Duration,
        warning_fraction: f64,
        configured_by: TimeoutSource,
    ) -> Self {
        let total_ms = duration.as_millis() as i64;
        let warn_ms = (total_ms as f64 * warning_fraction) as i64;
        Self {
            duration,
            expires_at: created_at + chrono::Duration::milliseconds(total_ms),
            warn_at: created_at + chrono::Duration::milliseconds(warn_ms),
            configured_by,
        }
    }

    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn in_warning(&self, now: DateTime<Utc>) -> bool {
        now >= self.warn_at && !self.expired(now)
    }
}

/// Execution context a gate was opened under.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateContext {
    pub workstation: WorkstationId,
    pub tab_group: TabGroupId,
    pub agent: AgentId,
    pub origin_domain: String,
    pub target_domain: String,
    pub created_at: DateTime<Utc>,
}

/// One pending-or-resolved approval request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Gate {
    pub id: GateId,
    pub category: ActionCategory,
    pub status: GateStatus,
    pub human_key: HumanKey,
    pub system_key: SystemKey,
    pub context: GateContext,
    pub timeout: TimeoutWindow,
    pub binding: PolicyBinding,
}

impl Gate {
    /// Recompute the non-terminal status from the two keys. Terminal
    /// transitions are driven by the manager, not by this derivation.
    pub fn derive_partial_status(&self) -> GateStatus {
        match (self.human_key.approved, self.system_key.approved) {
            (true, true) => GateStatus::Approved,
            (true, false) => GateStatus::KeyAApproved,
            (false, true) => GateStatus::KeyBApproved,
            (false, false) => GateStatus::Pending,
        }
    }

    pub fn duration_ms(&self, now: DateTime<Utc>) -> u64 {
        (now - self.context.created_at).num_milliseconds().max(0) as u64
    }
}
