//! Warden Evidence - sealed, independently verifiable evidence bundles.
//!
//! An evidence bundle is a directory of artifacts (ledger exports,
//! screenshots, probe transcripts) plus a manifest listing each artifact's
//! SHA-256 content hash. Sealing computes the hashes; verification
//! recomputes them from the files alone, so a reviewer needs nothing but
//! the directory and the manifest to check integrity.

#![deny(unsafe_code)]

mod manifest;

pub use manifest::{
    seal, verify, ArtifactCheck, EvidenceManifest, EvidenceVerification, SealStatus,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvidenceError {
    /// A path named at seal time does not exist under the bundle root.
    /// Sealing an incomplete bundle is refused; verifying one is not.
    #[error("required artifact missing: {0}")]
    MissingArtifact(String),

    #[error("artifact path escapes the bundle root: {0}")]
    PathEscapes(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Canonical(#[from] warden_canonical::CanonicalError),

    #[error("manifest serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
