use thiserror::Error;
use warden_canonical::CanonicalError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Canonical(#[from] CanonicalError),

    /// The chain failed verification. Must always be surfaced to an
    /// operator; the ledger itself may be compromised.
    #[error("chain integrity violation at entry {entry_id}: {reason}")]
    ChainIntegrityViolation { entry_id: String, reason: String },

    #[error("ledger lock poisoned")]
    Lock,

    #[error("audit sink I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for LedgerError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}
