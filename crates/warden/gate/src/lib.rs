//! Warden Gate - the two-key approval core.
//!
//! A gate opens when the supervised agent wants to perform a sensitive
//! action and closes only one way: human confirmation (key A) plus
//! multi-signal system consensus (key B), inside the timeout window,
//! under the policy version the gate was created with. Every transition
//! is appended to the audit ledger; terminal states are never resumed.
//!
//! There are no blocking waits anywhere. Pending is a state the caller
//! polls, not a call that parks a thread.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod manager;

pub use config::GateConfig;
pub use error::GateError;
pub use manager::{GateManager, GateProgress};
