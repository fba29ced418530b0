//! Audit sinks - where finalized entries are persisted.
//!
//! The in-memory ledger is the source of truth for the approval core; the
//! file sink gives the same chain append-only durability as JSONL on disk,
//! reloading the chain head when reopened.

use crate::entry::{AuditDraft, AuditEntry};
use crate::error::LedgerError;
use crate::ledger::{AuditLedger, ChainVerification};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use warden_canonical::GENESIS_HASH;

/// Destination for audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Finalize a draft against this sink's chain and persist it.
    async fn write(&self, draft: AuditDraft) -> Result<AuditEntry, LedgerError>;

    /// Number of entries persisted so far.
    async fn entry_count(&self) -> Result<u64, LedgerError>;
}

/// In-memory sink backed by [`AuditLedger`]. Used in tests and embedded
/// deployments.
pub struct MemoryAuditSink {
    ledger: AuditLedger,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self {
            ledger: AuditLedger::new(),
        }
    }

    pub fn ledger(&self) -> &AuditLedger {
        &self.ledger
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn write(&self, draft: AuditDraft) -> Result<AuditEntry, LedgerError> {
        self.ledger.append(draft)
    }

    async fn entry_count(&self) -> Result<u64, LedgerError> {
        Ok(self.ledger.len()? as u64)
    }
}

struct FileChainState {
    head: String,
    count: u64,
}

/// Append-only JSONL sink on disk.
pub struct FileAuditSink {
    path: PathBuf,
    state: Mutex<FileChainState>,
}

impl FileAuditSink {
    /// Open (or create) the sink, resuming the chain from the last line of
    /// an existing file.
    pub async fn open(path: PathBuf) -> Result<Self, LedgerError> {
        let state = if path.exists() {
            Self::load_chain_state(&path).await?
        } else {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            FileChainState {
                head: GENESIS_HASH.to_string(),
                count: 0,
            }
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    async fn load_chain_state(path: &PathBuf) -> Result<FileChainState, LedgerError> {
        let file = tokio::fs::File::open(path).await?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let mut head = GENESIS_HASH.to_string();
        let mut count = 0u64;
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let entry: AuditEntry = serde_json::from_str(&line)?;
            head = entry.hash;
            count += 1;
        }

        Ok(FileChainState { head, count })
    }

    /// Read the whole file back and replay the chain.
    pub async fn verify_file(&self) -> Result<ChainVerification, LedgerError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        Ok(AuditLedger::verify_export(&contents))
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn write(&self, draft: AuditDraft) -> Result<AuditEntry, LedgerError> {
        let mut state = self.state.lock().await;
        let entry = draft.finalize(state.head.clone())?;

        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        state.head = entry.hash.clone();
        state.count += 1;
        Ok(entry)
    }

    async fn entry_count(&self) -> Result<u64, LedgerError> {
        Ok(self.state.lock().await.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{AuditEventKind, PolicyProvenance};
    use warden_types::WorkstationId;

    fn draft() -> AuditDraft {
        AuditDraft::new(
            AuditEventKind::GateCreated,
            WorkstationId::new("ws-1"),
            PolicyProvenance::matching("h"),
        )
    }

    #[tokio::test]
    async fn memory_sink_chains_entries() {
        let sink = MemoryAuditSink::new();
        let first = sink.write(draft()).await.unwrap();
        let second = sink.write(draft()).await.unwrap();
        assert_eq!(second.previous_hash, first.hash);
        assert_eq!(sink.entry_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn file_sink_persists_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let sink = FileAuditSink::open(path.clone()).await.unwrap();
        sink.write(draft()).await.unwrap();
        sink.write(draft()).await.unwrap();

        let verification = sink.verify_file().await.unwrap();
        assert!(verification.valid);
        assert_eq!(verification.checked, 2);
    }

    #[tokio::test]
    async fn file_sink_resumes_chain_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let first_hash = {
            let sink = FileAuditSink::open(path.clone()).await.unwrap();
            sink.write(draft()).await.unwrap().hash
        };

        let sink = FileAuditSink::open(path.clone()).await.unwrap();
        assert_eq!(sink.entry_count().await.unwrap(), 1);
        let second = sink.write(draft()).await.unwrap();
        assert_eq!(second.previous_hash, first_hash);

        let verification = sink.verify_file().await.unwrap();
        assert!(verification.valid);
        assert_eq!(verification.checked, 2);
    }
}
