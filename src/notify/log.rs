use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::output::append_record;

/// One successful delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchEntry {
    pub token: String,
    pub recipient: String,
    pub number: String,
    pub chunks: usize,
    pub sent_at: DateTime<Utc>,
}

/// Append-only record of delivered messages, keyed by idempotency token.
///
/// Checked before sending and written after a successful send, so a repeated
/// dispatch skips recipients that already got their message. Without a path
/// the log only lives in memory.
#[derive(Debug, Default)]
pub struct DispatchLog {
    path: Option<PathBuf>,
    sent: HashSet<String>,
}

impl DispatchLog {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the log at `path`, reading tokens already recorded there.
    pub fn open(path: &Path) -> Result<Self> {
        let mut sent = HashSet::new();
        if path.exists() {
            let mut reader = csv::Reader::from_path(path)?;
            for entry in reader.deserialize::<DispatchEntry>() {
                sent.insert(entry?.token);
            }
        }
        debug!(path = %path.display(), entries = sent.len(), "Dispatch log opened");
        Ok(Self {
            path: Some(path.to_path_buf()),
            sent,
        })
    }

    pub fn contains(&self, token: &str) -> bool {
        self.sent.contains(token)
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    pub fn record(&mut self, entry: &DispatchEntry) -> Result<()> {
        if let Some(path) = &self.path {
            append_record(path, entry)?;
        }
        self.sent.insert(entry.token.clone());
        Ok(())
    }
}
