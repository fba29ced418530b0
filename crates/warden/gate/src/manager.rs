//! The two-key gate manager.
//!
//! One manager instance owns every pending gate, the session bindings
//! minted from approvals, and the drift monitor for the workstations it
//! supervises. All mutating operations take the write lock, so gate
//! transitions are serialized and each terminal transition appends its
//! ledger entry exactly once.

use crate::config::GateConfig;
use crate::error::GateError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use warden_ledger::{AuditDraft, AuditEventKind, AuditLedger, PolicyProvenance};
use warden_signals::{evaluate, DriftCheck, DriftMonitor, Observation, SignalError, WorkstationScope};
use warden_types::{
    ActionCategory, ActorIdentity, ApprovalMethod, DriftEvent, DriftEventId, DriftStatus, Gate,
    GateContext, GateId, GateStatus, HumanKey, PolicyBinding, PolicySnapshot, SessionBinding,
    SessionId, Signal, SystemKey, TimeoutSource, TimeoutWindow, ValidatedSignal, WorkstationId,
};

/// Snapshot of a gate's progress returned from every mutating operation.
#[derive(Clone, Debug, Serialize)]
pub struct GateProgress {
    pub gate_id: GateId,
    pub status: GateStatus,
    pub human_approved: bool,
    pub system_approved: bool,
    pub passing_signals: usize,
    pub threshold: usize,
    pub in_warning: bool,
    /// Set only on the transition to full approval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionId>,
}

impl GateProgress {
    fn of(gate: &Gate, now: DateTime<Utc>) -> Self {
        Self {
            gate_id: gate.id.clone(),
            status: gate.status,
            human_approved: gate.human_key.approved,
            system_approved: gate.system_key.approved,
            passing_signals: gate.system_key.passing_count(),
            threshold: gate.system_key.threshold,
            in_warning: gate.timeout.in_warning(now),
            session: None,
        }
    }
}

#[derive(Default)]
struct ManagerState {
    pending: HashMap<GateId, Gate>,
    sessions: Vec<SessionBinding>,
    /// Policy hash in force when each drift event was opened, kept so the
    /// resolution entries carry the same provenance.
    drift_policy: HashMap<DriftEventId, String>,
}

/// Coordinates gates, sessions, drift tracking, and the audit trail.
pub struct GateManager {
    config: GateConfig,
    ledger: Arc<AuditLedger>,
    drift: DriftMonitor,
    inner: RwLock<ManagerState>,
}

impl GateManager {
    pub fn new(config: GateConfig, ledger: Arc<AuditLedger>) -> Self {
        Self {
            config,
            ledger,
            drift: DriftMonitor::new(),
            inner: RwLock::new(ManagerState::default()),
        }
    }

    pub fn ledger(&self) -> &Arc<AuditLedger> {
        &self.ledger
    }

    /// Open a gate for one sensitive action. The policy content hash is
    /// snapshotted here; every later decision is compared against it.
    pub fn create(
        &self,
        category: ActionCategory,
        context: GateContext,
        policy: &PolicySnapshot,
    ) -> Result<Gate, GateError> {
        let now = Utc::now();
        let mut context = context;
        context.created_at = now;

        let (duration, configured_by) = match policy.timeout_override {
            Some(duration) => (duration, TimeoutSource::Policy),
            None => (self.config.default_timeout, TimeoutSource::SystemDefault),
        };

        let gate = Gate {
            id: GateId::generate(),
            category,
            status: GateStatus::Pending,
            human_key: HumanKey::default(),
            system_key: SystemKey::with_threshold(self.config.signal_threshold),
            timeout: TimeoutWindow::starting(now, duration, self.config.warning_fraction, configured_by),
            binding: PolicyBinding::from_snapshot(policy),
            context,
        };

        let mut state = self.inner.write().map_err(|_| GateError::Lock)?;
        self.ledger.append(self.gate_draft(AuditEventKind::GateCreated, &gate, now))?;
        state.pending.insert(gate.id.clone(), gate.clone());
        tracing::info!(gate_id = %gate.id, category = ?gate.category, "gate created");
        Ok(gate)
    }

    /// Submit one observation toward key B. The validator's verdict is
    /// recorded either way; only passing signals count toward consensus.
    /// An unregistered probe alias is recorded as a failing signal, not
    /// an error.
    pub fn submit_signal(
        &self,
        gate_id: &GateId,
        observation: &Observation,
    ) -> Result<GateProgress, GateError> {
        let now = Utc::now();
        let mut state = self.inner.write().map_err(|_| GateError::Lock)?;
        let mut gate = self.take_live(&mut state, gate_id, now)?;

        let signal = match evaluate(&gate.binding, observation) {
            Ok(signal) => signal,
            Err(SignalError::UnknownProbeAlias(alias)) => {
                tracing::warn!(%alias, gate_id = %gate.id, "probe alias not on the approved registry");
                let observed_status = match observation {
                    Observation::ProbeResponse { status, .. } => *status,
                    _ => 0,
                };
                Signal::AuthenticatedProbe {
                    alias,
                    observed_status,
                    expected_status: 0,
                    read_only: false,
                    non_sensitive: false,
                    in_scope: false,
                }
            }
            // Evaluation has no other failure mode today; if one appears,
            // the gate must survive the failed submission.
            Err(other) => {
                state.pending.insert(gate.id.clone(), gate);
                return Err(other.into());
            }
        };

        let validated = ValidatedSignal::record(signal);
        let summary = validated.signal.summary();
        gate.system_key.record(validated);
        self.ledger.append(
            self.gate_draft(AuditEventKind::SignalSubmitted, &gate, now)
                .subtype(summary.kind.to_string())
                .signals(vec![summary]),
        )?;

        self.settle(&mut state, gate, now)
    }

    /// Record key A: explicit human confirmation of the action.
    pub fn approve_human(
        &self,
        gate_id: &GateId,
        approver: ActorIdentity,
        method: ApprovalMethod,
    ) -> Result<GateProgress, GateError> {
        let now = Utc::now();
        let mut state = self.inner.write().map_err(|_| GateError::Lock)?;
        let mut gate = self.take_live(&mut state, gate_id, now)?;

        gate.human_key.approve(approver, method);
        self.ledger.append(self.gate_draft(AuditEventKind::HumanApproved, &gate, now))?;

        self.settle(&mut state, gate, now)
    }

    /// Compare the policy hash observed now against the hash frozen at
    /// gate creation. Divergence voids the gate no matter how far it had
    /// progressed, and this check runs before any approval settles.
    pub fn check_policy_drift(
        &self,
        gate_id: &GateId,
        current_hash: &str,
    ) -> Result<GateProgress, GateError> {
        let now = Utc::now();
        let mut state = self.inner.write().map_err(|_| GateError::Lock)?;
        let mut gate = self.take_live(&mut state, gate_id, now)?;

        gate.binding.current_hash = current_hash.to_string();
        if !gate.binding.drifted() {
            let progress = GateProgress::of(&gate, now);
            state.pending.insert(gate.id.clone(), gate);
            return Ok(progress);
        }

        gate.status = GateStatus::Invalidated;
        tracing::warn!(gate_id = %gate.id, "policy hash diverged, gate invalidated");
        self.ledger.append(
            AuditDraft::new(
                AuditEventKind::GateInvalidated,
                gate.context.workstation.clone(),
                PolicyProvenance::diverged(gate.binding.hash_at_creation.clone(), current_hash),
            )
            .gate(gate.id.clone(), gate.duration_ms(now)),
        )?;
        Err(GateError::PolicyMismatch(gate.id))
    }

    /// Poll a gate's timeout. Expired gates transition to timeout here;
    /// live gates report their current status.
    pub fn check_timeout(&self, gate_id: &GateId) -> Result<GateStatus, GateError> {
        let now = Utc::now();
        let mut state = self.inner.write().map_err(|_| GateError::Lock)?;
        match self.take_live(&mut state, gate_id, now) {
            Ok(gate) => {
                let status = gate.status;
                state.pending.insert(gate.id.clone(), gate);
                Ok(status)
            }
            Err(GateError::Expired(_)) => Ok(GateStatus::Timeout),
            Err(err) => Err(err),
        }
    }

    /// Human denial. Terminal.
    pub fn deny(&self, gate_id: &GateId, reason: &str) -> Result<GateProgress, GateError> {
        self.close(gate_id, GateStatus::Denied, AuditEventKind::GateDenied, reason)
    }

    /// Administrative reset, for operator error or a retried flow. Terminal
    /// for this gate; the action needs a fresh one.
    pub fn reset(&self, gate_id: &GateId, reason: &str) -> Result<GateProgress, GateError> {
        self.close(gate_id, GateStatus::Reset, AuditEventKind::GateReset, reason)
    }

    pub fn status(&self, gate_id: &GateId) -> Result<GateStatus, GateError> {
        let state = self.inner.read().map_err(|_| GateError::Lock)?;
        state
            .pending
            .get(gate_id)
            .map(|gate| gate.status)
            .ok_or_else(|| GateError::NotFound(gate_id.clone()))
    }

    pub fn pending_count(&self) -> Result<usize, GateError> {
        let state = self.inner.read().map_err(|_| GateError::Lock)?;
        Ok(state.pending.len())
    }

    pub fn sessions(&self) -> Result<Vec<SessionBinding>, GateError> {
        let state = self.inner.read().map_err(|_| GateError::Lock)?;
        Ok(state.sessions.clone())
    }

    /// Check one observed navigation against the policy's domain scope,
    /// opening or auto-closing drift events and auditing both transitions.
    pub fn check_domain(
        &self,
        workstation: &WorkstationId,
        agent: &warden_types::AgentId,
        url: &str,
        policy: &PolicySnapshot,
    ) -> Result<DriftCheck, GateError> {
        let check = self.drift.check(workstation, agent, url, &policy.allowed_domains)?;
        if let Some(event) = &check.event {
            let mut state = self.inner.write().map_err(|_| GateError::Lock)?;
            match event.status {
                DriftStatus::Detected => {
                    let newly_opened = state
                        .drift_policy
                        .insert(event.id.clone(), policy.content_hash.clone())
                        .is_none();
                    if newly_opened {
                        self.ledger.append(self.drift_draft(
                            AuditEventKind::DriftDetected,
                            event,
                            &policy.content_hash,
                        ))?;
                    }
                }
                DriftStatus::ReturnedToScope => {
                    let hash = state
                        .drift_policy
                        .remove(&event.id)
                        .unwrap_or_else(|| policy.content_hash.clone());
                    self.ledger
                        .append(self.drift_draft(AuditEventKind::DriftReturned, event, &hash))?;
                }
                DriftStatus::Approved | DriftStatus::Terminated => {}
            }
        }
        Ok(check)
    }

    /// Human approval of a drift excursion as a documented exception.
    pub fn approve_drift(
        &self,
        event_id: &DriftEventId,
        approver: ActorIdentity,
        notes: &str,
    ) -> Result<DriftEvent, GateError> {
        let actor = approver.operator_id.clone();
        let event = self.drift.approve(event_id, approver, notes)?;
        let mut state = self.inner.write().map_err(|_| GateError::Lock)?;
        let hash = state.drift_policy.remove(event_id).unwrap_or_default();
        self.ledger.append(
            self.drift_draft(AuditEventKind::DriftApproved, &event, &hash)
                .actor(actor),
        )?;
        Ok(event)
    }

    /// Terminate the drifted session instead of excusing it.
    pub fn terminate_drift(&self, event_id: &DriftEventId) -> Result<DriftEvent, GateError> {
        let event = self.drift.terminate(event_id)?;
        let mut state = self.inner.write().map_err(|_| GateError::Lock)?;
        let hash = state.drift_policy.remove(event_id).unwrap_or_default();
        self.ledger
            .append(self.drift_draft(AuditEventKind::DriftTerminated, &event, &hash))?;
        Ok(event)
    }

    pub fn workstation_scope(
        &self,
        workstation: &WorkstationId,
    ) -> Result<Option<WorkstationScope>, GateError> {
        Ok(self.drift.workstation_status(workstation)?)
    }

    pub fn drift_events(&self) -> Result<Vec<DriftEvent>, GateError> {
        Ok(self.drift.events()?)
    }

    /// Pull a gate out of pending, expiring it on the way if its window
    /// has elapsed. Every mutating operation starts here, so no decision
    /// is ever made on an expired gate.
    fn take_live(
        &self,
        state: &mut ManagerState,
        gate_id: &GateId,
        now: DateTime<Utc>,
    ) -> Result<Gate, GateError> {
        let mut gate = state
            .pending
            .remove(gate_id)
            .ok_or_else(|| GateError::NotFound(gate_id.clone()))?;
        if gate.timeout.expired(now) {
            gate.status = GateStatus::Timeout;
            tracing::warn!(gate_id = %gate.id, "gate timed out");
            self.ledger.append(self.gate_draft(AuditEventKind::GateTimeout, &gate, now))?;
            return Err(GateError::Expired(gate.id));
        }
        Ok(gate)
    }

    /// Recompute the derived status and, on full approval, mint the
    /// session binding. Unresolved gates go back into pending.
    fn settle(
        &self,
        state: &mut ManagerState,
        mut gate: Gate,
        now: DateTime<Utc>,
    ) -> Result<GateProgress, GateError> {
        gate.status = gate.derive_partial_status();
        if gate.status != GateStatus::Approved {
            let progress = GateProgress::of(&gate, now);
            state.pending.insert(gate.id.clone(), gate);
            return Ok(progress);
        }

        let summaries: Vec<_> = gate
            .system_key
            .signals
            .iter()
            .filter(|s| s.passed)
            .map(|s| s.signal.summary())
            .collect();
        let actor = gate
            .human_key
            .approver
            .clone()
            .unwrap_or_else(|| ActorIdentity::new("unknown"));

        let session = SessionBinding {
            id: SessionId::generate(),
            actor,
            verified_signals: summaries.clone(),
            gate_id: gate.id.clone(),
            policy_hash: gate.binding.hash_at_creation.clone(),
            valid_from: now,
            valid_until: now + chrono::Duration::milliseconds(self.config.session_validity.as_millis() as i64),
        };
        // One entry for the terminal transition; the bound session rides
        // on it as the subtype.
        self.ledger.append(
            self.gate_draft(AuditEventKind::GateApproved, &gate, now)
                .subtype(session.id.to_string())
                .signals(summaries),
        )?;
        tracing::info!(gate_id = %gate.id, session_id = %session.id, "gate approved, session bound");

        let mut progress = GateProgress::of(&gate, now);
        progress.session = Some(session.id.clone());
        state.sessions.push(session);
        Ok(progress)
    }

    fn close(
        &self,
        gate_id: &GateId,
        status: GateStatus,
        kind: AuditEventKind,
        reason: &str,
    ) -> Result<GateProgress, GateError> {
        let now = Utc::now();
        let mut state = self.inner.write().map_err(|_| GateError::Lock)?;
        let mut gate = self.take_live(&mut state, gate_id, now)?;

        gate.status = status;
        tracing::info!(gate_id = %gate.id, status = ?status, %reason, "gate closed");
        self.ledger
            .append(self.gate_draft(kind, &gate, now).subtype(reason))?;
        Ok(GateProgress::of(&gate, now))
    }

    fn gate_draft(&self, kind: AuditEventKind, gate: &Gate, now: DateTime<Utc>) -> AuditDraft {
        let mut draft = AuditDraft::new(
            kind,
            gate.context.workstation.clone(),
            PolicyProvenance::matching(gate.binding.hash_at_creation.clone()),
        )
        .gate(gate.id.clone(), gate.duration_ms(now));
        if let Some(approver) = &gate.human_key.approver {
            draft = draft.actor(approver.operator_id.clone());
        }
        draft
    }

    fn drift_draft(&self, kind: AuditEventKind, event: &DriftEvent, policy_hash: &str) -> AuditDraft {
        AuditDraft::new(
            kind,
            event.workstation.clone(),
            PolicyProvenance::matching(policy_hash),
        )
        .subtype(event.id.to_string())
    }
}
