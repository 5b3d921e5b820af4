//! Session transcript storage for the chat shell.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in a session transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only transcript storage, scoped to one session key for the
/// process lifetime.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Append an entry to the session transcript.
    async fn append(&self, session: &str, entry: TranscriptEntry) -> Result<()>;

    /// Retrieve transcript entries, optionally limited to the most recent.
    async fn transcript(&self, session: &str, limit: Option<usize>)
        -> Result<Vec<TranscriptEntry>>;

    /// Drop a session's transcript.
    async fn clear(&self, session: &str) -> Result<()>;

    /// The name of this session store implementation.
    fn name(&self) -> &str;
}
