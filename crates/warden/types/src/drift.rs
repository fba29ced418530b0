//! Domain drift events.

use crate::gate::ActorIdentity;
use crate::ids::{AgentId, DriftEventId, WorkstationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftStatus {
    Detected,
    ReturnedToScope,
    Approved,
    Terminated,
}

/// Who approved a drift exception, and why. Approval documents the
/// exception; it never retroactively authorizes unseen actions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriftResolution {
    pub approver: ActorIdentity,
    pub notes: String,
    pub resolved_at: DateTime<Utc>,
}

/// Created whenever a domain check fails; closed automatically on the next
/// in-scope observation for the same workstation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriftEvent {
    pub id: DriftEventId,
    pub detected_at: DateTime<Utc>,
    pub workstation: WorkstationId,
    pub agent: AgentId,
    pub expected_domains: Vec<String>,
    pub actual_url: String,
    pub actual_domain: String,
    pub status: DriftStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<DriftResolution>,
}

impl DriftEvent {
    pub fn is_open(&self) -> bool {
        self.status == DriftStatus::Detected
    }
}
