//! Identifier newtypes.

use serde::{Deserialize, Serialize};

macro_rules! generated_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, uuid::Uuid::new_v4()))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

generated_id!(
    /// Identifier of one pending-or-resolved approval gate.
    GateId,
    "gate"
);
generated_id!(
    /// Identifier of a session binding derived from an approved gate.
    SessionId,
    "session"
);
generated_id!(
    /// Identifier of a domain drift event.
    DriftEventId,
    "drift"
);
generated_id!(
    /// Identifier of one audit ledger entry.
    EventId,
    "event"
);

macro_rules! external_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

external_id!(
    /// Workstation running the supervised agent.
    WorkstationId
);
external_id!(
    /// Logical browser tab group the agent drives.
    TabGroupId
);
external_id!(
    /// The autonomous agent itself.
    AgentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_their_prefix() {
        assert!(GateId::generate().0.starts_with("gate-"));
        assert!(SessionId::generate().0.starts_with("session-"));
        assert!(DriftEventId::generate().0.starts_with("drift-"));
        assert!(EventId::generate().0.starts_with("event-"));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(GateId::generate(), GateId::generate());
    }
}
