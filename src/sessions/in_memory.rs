//! In-memory session store implementation.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::traits::{SessionStore, TranscriptEntry};

/// An in-memory session store backed by a mutex-protected hash map.
pub struct InMemorySessionStore {
    transcripts: Mutex<HashMap<String, Vec<TranscriptEntry>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            transcripts: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn append(&self, session: &str, entry: TranscriptEntry) -> Result<()> {
        let mut transcripts = self.transcripts.lock();
        transcripts.entry(session.to_string()).or_default().push(entry);
        Ok(())
    }

    async fn transcript(
        &self,
        session: &str,
        limit: Option<usize>,
    ) -> Result<Vec<TranscriptEntry>> {
        let transcripts = self.transcripts.lock();
        let entries = match transcripts.get(session) {
            Some(entries) => entries.clone(),
            None => return Ok(Vec::new()),
        };

        match limit {
            Some(n) => {
                let start = entries.len().saturating_sub(n);
                Ok(entries[start..].to_vec())
            }
            None => Ok(entries),
        }
    }

    async fn clear(&self, session: &str) -> Result<()> {
        let mut transcripts = self.transcripts.lock();
        transcripts.remove(session);
        Ok(())
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}
