//! Gate manager errors.

use thiserror::Error;
use warden_ledger::LedgerError;
use warden_signals::SignalError;
use warden_types::GateId;

#[derive(Debug, Error)]
pub enum GateError {
    /// The gate does not exist or has already been resolved. Resolved
    /// gates leave the pending set, so a stale id looks the same as one
    /// that never existed.
    #[error("gate not found: {0}")]
    NotFound(GateId),

    /// The gate's timeout window has elapsed. Raising this error also
    /// drives the gate to its timeout state; an expired gate can never
    /// be resumed.
    #[error("gate expired: {0}")]
    Expired(GateId),

    /// The controlling policy changed underneath the gate. The gate is
    /// invalidated before this error is returned.
    #[error("policy hash diverged for gate {0}")]
    PolicyMismatch(GateId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("gate state lock poisoned")]
    Lock,
}
