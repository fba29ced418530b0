//! Domain drift monitor.
//!
//! Every navigation the supervised agent makes is checked against the
//! workstation's allowed-domain list. An out-of-scope observation opens a
//! drift event; the next in-scope observation for the same workstation
//! closes it automatically. Only a human can mark a drift event approved.

use crate::domain::{domain_in_scope, extract_domain};
use crate::SignalError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use warden_types::{
    ActorIdentity, AgentId, DriftEvent, DriftEventId, DriftResolution, DriftStatus, WorkstationId,
};

/// Whether a workstation is currently inside its declared domain scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkstationScope {
    InScope,
    Drift,
}

/// Result of one navigation check: the scope verdict plus the drift event
/// that was opened or closed by it, if any.
#[derive(Clone, Debug)]
pub struct DriftCheck {
    pub in_scope: bool,
    pub event: Option<DriftEvent>,
}

#[derive(Default)]
struct DriftState {
    events: Vec<DriftEvent>,
    open_by_workstation: HashMap<WorkstationId, DriftEventId>,
    status: HashMap<WorkstationId, WorkstationScope>,
}

/// Tracks drift events and per-workstation scope status.
#[derive(Default)]
pub struct DriftMonitor {
    inner: RwLock<DriftState>,
}

impl DriftMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check one observed navigation against the allowed-domain list.
    ///
    /// Out of scope with no open event: a new event is opened in
    /// `Detected`. Back in scope with an open event: that event moves to
    /// `ReturnedToScope` and closes. Repeated out-of-scope observations
    /// reuse the already-open event rather than opening a second one.
    pub fn check(
        &self,
        workstation: &WorkstationId,
        agent: &AgentId,
        url: &str,
        allowed_domains: &[String],
    ) -> Result<DriftCheck, SignalError> {
        let domain = extract_domain(url);
        let in_scope = domain_in_scope(&domain, allowed_domains);
        let mut state = self.inner.write().map_err(|_| SignalError::Lock)?;

        if in_scope {
            state.status.insert(workstation.clone(), WorkstationScope::InScope);
            let closed = match state.open_by_workstation.remove(workstation) {
                Some(open_id) => {
                    let event = state
                        .events
                        .iter_mut()
                        .find(|e| e.id == open_id)
                        .ok_or_else(|| SignalError::DriftEventNotFound(open_id.clone()))?;
                    event.status = DriftStatus::ReturnedToScope;
                    tracing::info!(
                        event_id = %event.id,
                        workstation = %workstation,
                        "workstation returned to scope"
                    );
                    Some(event.clone())
                }
                None => None,
            };
            return Ok(DriftCheck {
                in_scope: true,
                event: closed,
            });
        }

        state.status.insert(workstation.clone(), WorkstationScope::Drift);
        if let Some(open_id) = state.open_by_workstation.get(workstation).cloned() {
            let event = state
                .events
                .iter()
                .find(|e| e.id == open_id)
                .ok_or_else(|| SignalError::DriftEventNotFound(open_id))?
                .clone();
            return Ok(DriftCheck {
                in_scope: false,
                event: Some(event),
            });
        }

        let event = DriftEvent {
            id: DriftEventId::generate(),
            detected_at: Utc::now(),
            workstation: workstation.clone(),
            agent: agent.clone(),
            expected_domains: allowed_domains.to_vec(),
            actual_url: url.to_string(),
            actual_domain: domain,
            status: DriftStatus::Detected,
            resolution: None,
        };
        tracing::warn!(
            event_id = %event.id,
            workstation = %workstation,
            domain = %event.actual_domain,
            "domain drift detected"
        );
        state
            .open_by_workstation
            .insert(workstation.clone(), event.id.clone());
        state.events.push(event.clone());
        Ok(DriftCheck {
            in_scope: false,
            event: Some(event),
        })
    }

    /// Human approval of a drift event as an allowed exception. The
    /// workstation stays marked as drifted until it is next observed in
    /// scope; approval documents, it does not relocate.
    pub fn approve(
        &self,
        event_id: &DriftEventId,
        approver: ActorIdentity,
        notes: impl Into<String>,
    ) -> Result<DriftEvent, SignalError> {
        self.resolve(event_id, DriftStatus::Approved, Some((approver, notes.into())))
    }

    /// Operator decision to terminate the drifted session instead of
    /// approving the excursion.
    pub fn terminate(&self, event_id: &DriftEventId) -> Result<DriftEvent, SignalError> {
        self.resolve(event_id, DriftStatus::Terminated, None)
    }

    fn resolve(
        &self,
        event_id: &DriftEventId,
        status: DriftStatus,
        resolution: Option<(ActorIdentity, String)>,
    ) -> Result<DriftEvent, SignalError> {
        let mut state = self.inner.write().map_err(|_| SignalError::Lock)?;
        let event = state
            .events
            .iter_mut()
            .find(|e| e.id == *event_id)
            .ok_or_else(|| SignalError::DriftEventNotFound(event_id.clone()))?;
        event.status = status;
        if let Some((approver, notes)) = resolution {
            event.resolution = Some(DriftResolution {
                approver,
                notes,
                resolved_at: Utc::now(),
            });
        }
        let event = event.clone();
        if state
            .open_by_workstation
            .get(&event.workstation)
            .is_some_and(|open| *open == event.id)
        {
            state.open_by_workstation.remove(&event.workstation);
        }
        tracing::info!(event_id = %event.id, status = ?event.status, "drift event resolved");
        Ok(event)
    }

    /// Current scope status of a workstation, if it has ever been observed.
    pub fn workstation_status(
        &self,
        workstation: &WorkstationId,
    ) -> Result<Option<WorkstationScope>, SignalError> {
        let state = self.inner.read().map_err(|_| SignalError::Lock)?;
        Ok(state.status.get(workstation).copied())
    }

    /// All drift events recorded so far, oldest first.
    pub fn events(&self) -> Result<Vec<DriftEvent>, SignalError> {
        let state = self.inner.read().map_err(|_| SignalError::Lock)?;
        Ok(state.events.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workstation() -> WorkstationId {
        WorkstationId::new("ws-7")
    }

    fn agent() -> AgentId {
        AgentId::new("agent-1")
    }

    fn allowed() -> Vec<String> {
        vec!["sam.gov".to_string()]
    }

    #[test]
    fn out_of_scope_navigation_opens_event() {
        let monitor = DriftMonitor::new();
        let check = monitor
            .check(&workstation(), &agent(), "https://google.com/search", &allowed())
            .unwrap();
        assert!(!check.in_scope);
        let event = check.event.unwrap();
        assert_eq!(event.status, DriftStatus::Detected);
        assert_eq!(event.actual_domain, "google.com");
        assert_eq!(
            monitor.workstation_status(&workstation()).unwrap(),
            Some(WorkstationScope::Drift)
        );
    }

    #[test]
    fn return_to_scope_closes_event_automatically() {
        let monitor = DriftMonitor::new();
        monitor
            .check(&workstation(), &agent(), "https://google.com/search", &allowed())
            .unwrap();
        let check = monitor
            .check(&workstation(), &agent(), "https://sam.gov/x", &allowed())
            .unwrap();
        assert!(check.in_scope);
        assert_eq!(check.event.unwrap().status, DriftStatus::ReturnedToScope);
        assert_eq!(
            monitor.workstation_status(&workstation()).unwrap(),
            Some(WorkstationScope::InScope)
        );
    }

    #[test]
    fn repeated_drift_reuses_open_event() {
        let monitor = DriftMonitor::new();
        let first = monitor
            .check(&workstation(), &agent(), "https://google.com/a", &allowed())
            .unwrap();
        let second = monitor
            .check(&workstation(), &agent(), "https://evil.example/b", &allowed())
            .unwrap();
        assert_eq!(first.event.unwrap().id, second.event.unwrap().id);
        assert_eq!(monitor.events().unwrap().len(), 1);
    }

    #[test]
    fn approval_requires_existing_event() {
        let monitor = DriftMonitor::new();
        let approver = ActorIdentity::new("op-1").with_display_name("Operator One");
        let err = monitor
            .approve(&DriftEventId::new("drift-missing"), approver, "n/a")
            .unwrap_err();
        assert!(matches!(err, SignalError::DriftEventNotFound(_)));
    }

    #[test]
    fn human_approval_records_resolution() {
        let monitor = DriftMonitor::new();
        let event = monitor
            .check(&workstation(), &agent(), "https://partner.example/x", &allowed())
            .unwrap()
            .event
            .unwrap();
        let approver = ActorIdentity::new("op-1").with_display_name("Operator One");
        let resolved = monitor
            .approve(&event.id, approver, "vetted partner portal")
            .unwrap();
        assert_eq!(resolved.status, DriftStatus::Approved);
        assert!(resolved.resolution.is_some());
        assert!(!resolved.is_open());
    }

    #[test]
    fn termination_closes_event_without_resolution_note() {
        let monitor = DriftMonitor::new();
        let event = monitor
            .check(&workstation(), &agent(), "https://evil.example/x", &allowed())
            .unwrap()
            .event
            .unwrap();
        let resolved = monitor.terminate(&event.id).unwrap();
        assert_eq!(resolved.status, DriftStatus::Terminated);
        assert!(resolved.resolution.is_none());
    }

    #[test]
    fn workstations_are_tracked_independently() {
        let monitor = DriftMonitor::new();
        let other = WorkstationId::new("ws-8");
        monitor
            .check(&workstation(), &agent(), "https://google.com/a", &allowed())
            .unwrap();
        monitor
            .check(&other, &agent(), "https://sam.gov/a", &allowed())
            .unwrap();
        assert_eq!(
            monitor.workstation_status(&workstation()).unwrap(),
            Some(WorkstationScope::Drift)
        );
        assert_eq!(
            monitor.workstation_status(&other).unwrap(),
            Some(WorkstationScope::InScope)
        );
    }
}
