//! Session bindings - the durable record of a fully approved gate.

use crate::gate::ActorIdentity;
use crate::ids::{GateId, SessionId};
use crate::signal::SignalSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Created exactly once, at the moment a gate reaches APPROVED.
/// Immutable after creation; 1:1 with the APPROVED ledger entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionBinding {
    pub id: SessionId,
    /// Operator or local-account identity. Never a credential.
    pub actor: ActorIdentity,
    /// Redacted summaries of the signals that satisfied key B.
    pub verified_signals: Vec<SignalSummary>,
    pub gate_id: GateId,
    /// The policy content hash in force when approval was granted.
    pub policy_hash: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl SessionBinding {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.valid_from && now <= self.valid_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_window_is_inclusive() {
        let now = Utc::now();
        let binding = SessionBinding {
            id: SessionId::generate(),
            actor: ActorIdentity::new("op-7"),
            verified_signals: vec![],
            gate_id: GateId::generate(),
            policy_hash: "abc".into(),
            valid_from: now,
            valid_until: now + chrono::Duration::minutes(15),
        };
        assert!(binding.is_valid_at(now));
        assert!(binding.is_valid_at(binding.valid_until));
        assert!(!binding.is_valid_at(binding.valid_until + chrono::Duration::seconds(1)));
    }
}
