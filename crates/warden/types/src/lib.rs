//! Warden Types - the closed data model for the approval-and-audit core.
//!
//! Everything that crosses a component boundary lives here: gates and their
//! two keys, the signal union, policy bindings, session bindings, and drift
//! events. The signal union is deliberately closed - which fields are
//! meaningful for each signal kind is a compile-time fact, and no variant
//! has room for response bodies, headers, or cookies.

#![deny(unsafe_code)]

pub mod drift;
pub mod gate;
pub mod ids;
pub mod policy;
pub mod session;
pub mod signal;

pub use drift::{DriftEvent, DriftResolution, DriftStatus};
pub use gate::{
    ActionCategory, ActorIdentity, ApprovalMethod, Gate, GateContext, GateStatus, HumanKey,
    SystemKey, TimeoutSource, TimeoutWindow,
};
pub use ids::{AgentId, DriftEventId, EventId, GateId, SessionId, TabGroupId, WorkstationId};
pub use policy::{PolicyBinding, PolicySnapshot, ProbeRegistration};
pub use session::SessionBinding;
pub use signal::{Signal, SignalKind, SignalSummary, UiElementKind, ValidatedSignal};
