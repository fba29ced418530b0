//! Manifest sealing and verification.

use crate::EvidenceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use warden_canonical::{canonical_hash, hash_bytes};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SealStatus {
    Sealed,
    Unsealed,
}

/// The manifest of one evidence bundle.
///
/// `manifest_hash` covers the bundle id, the artifact map, and the seal
/// timestamp, so renaming, adding, or dropping an artifact entry is as
/// detectable as editing an artifact file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvidenceManifest {
    pub bundle_id: String,
    /// Relative artifact path to SHA-256 content hash, sorted by path.
    pub artifacts: BTreeMap<String, String>,
    pub manifest_hash: String,
    pub seal_status: SealStatus,
    pub sealed_at: DateTime<Utc>,
}

impl EvidenceManifest {
    fn hash_fields(&self) -> serde_json::Value {
        serde_json::json!({
            "bundle_id": self.bundle_id,
            "artifacts": self.artifacts,
            "sealed_at": self.sealed_at.to_rfc3339(),
        })
    }

    pub fn compute_hash(&self) -> Result<String, EvidenceError> {
        Ok(canonical_hash(&self.hash_fields())?)
    }

    /// The external contract: manifests travel as JSON.
    pub fn to_json(&self) -> Result<String, EvidenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, EvidenceError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Verdict for one artifact during verification.
#[derive(Clone, Debug, Serialize)]
pub struct ArtifactCheck {
    pub path: String,
    pub expected: String,
    /// Recomputed hash, absent when the file is unreadable or gone.
    pub actual: Option<String>,
    pub ok: bool,
}

/// Full verification verdict. `all_ok` is the only field a gate on
/// bundle acceptance needs to consult.
#[derive(Clone, Debug, Serialize)]
pub struct EvidenceVerification {
    pub sealed: bool,
    pub manifest_hash_ok: bool,
    pub artifacts: Vec<ArtifactCheck>,
    pub all_ok: bool,
}

fn checked_relative(path: &str) -> Result<&Path, EvidenceError> {
    let relative = Path::new(path);
    if relative.is_absolute()
        || relative
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(EvidenceError::PathEscapes(path.to_string()));
    }
    Ok(relative)
}

/// Seal a bundle: hash every required artifact under `root` and produce
/// the manifest. Any missing artifact refuses the seal.
pub fn seal(root: &Path, required_paths: &[&str]) -> Result<EvidenceManifest, EvidenceError> {
    let mut artifacts = BTreeMap::new();
    for path in required_paths {
        let file = root.join(checked_relative(path)?);
        if !file.is_file() {
            return Err(EvidenceError::MissingArtifact(path.to_string()));
        }
        let bytes = fs::read(&file)?;
        artifacts.insert(path.to_string(), hash_bytes(&bytes));
    }

    let mut manifest = EvidenceManifest {
        bundle_id: format!("bundle-{}", uuid::Uuid::new_v4()),
        artifacts,
        manifest_hash: String::new(),
        seal_status: SealStatus::Sealed,
        sealed_at: Utc::now(),
    };
    manifest.manifest_hash = manifest.compute_hash()?;
    tracing::info!(
        bundle_id = %manifest.bundle_id,
        artifacts = manifest.artifacts.len(),
        "evidence bundle sealed"
    );
    Ok(manifest)
}

/// Verify a bundle against its manifest by independent recomputation.
/// Missing or altered artifacts are failing checks, never errors; the
/// reviewer gets the complete picture in one pass.
pub fn verify(root: &Path, manifest: &EvidenceManifest) -> Result<EvidenceVerification, EvidenceError> {
    let sealed = manifest.seal_status == SealStatus::Sealed;
    let manifest_hash_ok = manifest.compute_hash()? == manifest.manifest_hash;

    let mut artifacts = Vec::with_capacity(manifest.artifacts.len());
    for (path, expected) in &manifest.artifacts {
        let actual = checked_relative(path)
            .ok()
            .map(|rel| root.join(rel))
            .filter(|file| file.is_file())
            .and_then(|file| fs::read(file).ok())
            .map(|bytes| hash_bytes(&bytes));
        let ok = actual.as_deref() == Some(expected.as_str());
        artifacts.push(ArtifactCheck {
            path: path.clone(),
            expected: expected.clone(),
            actual,
            ok,
        });
    }

    let all_ok = sealed && manifest_hash_ok && artifacts.iter().all(|a| a.ok);
    if !all_ok {
        tracing::warn!(bundle_id = %manifest.bundle_id, "evidence bundle failed verification");
    }
    Ok(EvidenceVerification {
        sealed,
        manifest_hash_ok,
        artifacts,
        all_ok,
    })
}
