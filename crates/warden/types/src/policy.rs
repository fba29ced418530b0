//! Policy snapshots and the binding that ties a gate to the policy version
//! in force when it was created.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One pre-approved authenticated probe. Probes are referenced by alias,
/// never by raw URL, and carry the read-only/sensitivity/scope flags the
/// validator checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRegistration {
    pub alias: String,
    pub expected_status: u16,
    pub read_only: bool,
    pub sensitive: bool,
    pub in_scope: bool,
}

/// The view of a policy/pack document this core consumes from its
/// collaborators. The content hash is computed by the policy owner; Warden
/// only snapshots and compares it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub policy_id: String,
    pub version: String,
    pub content_hash: String,
    pub allowed_domains: Vec<String>,
    pub approved_probes: Vec<ProbeRegistration>,
    pub approved_selectors: Vec<String>,
    /// Overrides the system default gate timeout when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_override: Option<Duration>,
}

impl PolicySnapshot {
    pub fn probe(&self, alias: &str) -> Option<&ProbeRegistration> {
        self.approved_probes.iter().find(|p| p.alias == alias)
    }
}

/// Snapshot of the controlling policy captured at gate creation.
///
/// `hash_at_creation` is frozen for the life of the gate; `current_hash`
/// is updated by drift checks. A divergence voids the gate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyBinding {
    pub policy_id: String,
    pub policy_version: String,
    pub hash_at_creation: String,
    pub current_hash: String,
    pub allowed_domains: Vec<String>,
    pub approved_probes: Vec<ProbeRegistration>,
    pub approved_selectors: Vec<String>,
}

impl PolicyBinding {
    pub fn from_snapshot(snapshot: &PolicySnapshot) -> Self {
        Self {
            policy_id: snapshot.policy_id.clone(),
            policy_version: snapshot.version.clone(),
            hash_at_creation: snapshot.content_hash.clone(),
            current_hash: snapshot.content_hash.clone(),
            allowed_domains: snapshot.allowed_domains.clone(),
            approved_probes: snapshot.approved_probes.clone(),
            approved_selectors: snapshot.approved_selectors.clone(),
        }
    }

    /// True once the observed policy hash has diverged from the hash
    /// captured at creation.
    pub fn drifted(&self) -> bool {
        self.hash_at_creation != self.current_hash
    }

    pub fn probe(&self, alias: &str) -> Option<&ProbeRegistration> {
        self.approved_probes.iter().find(|p| p.alias == alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> PolicySnapshot {
        PolicySnapshot {
            policy_id: "pack-001".into(),
            version: "1.2.0".into(),
            content_hash: "abc123".into(),
            allowed_domains: vec!["sam.gov".into()],
            approved_probes: vec![ProbeRegistration {
                alias: "dashboard-status".into(),
                expected_status: 200,
                read_only: true,
                sensitive: false,
                in_scope: true,
            }],
            approved_selectors: vec!["[data-test=avatar]".into()],
            timeout_override: None,
        }
    }

    #[test]
    fn binding_freezes_the_creation_hash() {
        let mut binding = PolicyBinding::from_snapshot(&snapshot());
        assert!(!binding.drifted());

        binding.current_hash = "def456".into();
        assert!(binding.drifted());
        assert_eq!(binding.hash_at_creation, "abc123");
    }

    #[test]
    fn probe_lookup_is_by_alias() {
        let snapshot = snapshot();
        assert!(snapshot.probe("dashboard-status").is_some());
        assert!(snapshot.probe("https://sam.gov/api").is_none());
    }
}
