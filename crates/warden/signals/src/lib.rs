//! Warden Signals - pure validators for completion signals, plus the
//! domain drift monitor.
//!
//! The validators are side-effect-free predicate functions: given the
//! policy lists in force and a raw observation, they produce a fully
//! evaluated [`warden_types::Signal`] whose check booleans say exactly why
//! it passed or failed. The drift monitor reuses the same domain matching
//! to track whether a workstation is still inside its declared scope.

#![deny(unsafe_code)]

pub mod domain;
pub mod drift;
pub mod validate;

pub use domain::{domain_in_scope, extract_domain, extract_path};
pub use drift::{DriftCheck, DriftMonitor, WorkstationScope};
pub use validate::{
    evaluate, evaluate_probe, evaluate_redirect, evaluate_ui_element, Observation,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    /// The observation referenced a probe alias that is not on the
    /// pre-approved registry. Callers record this as a failing validation,
    /// not a crash.
    #[error("probe alias not on the approved registry: {0}")]
    UnknownProbeAlias(String),

    #[error("drift event not found: {0}")]
    DriftEventNotFound(warden_types::DriftEventId),

    #[error("drift monitor lock poisoned")]
    Lock,
}
