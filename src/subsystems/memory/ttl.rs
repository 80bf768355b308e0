//! Time-bound, opt-in memory. Every write states its reason and expires.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::core::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryEntry {
    pub content: String,
    pub reason: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct TtlMemory {
    entries: Vec<MemoryEntry>,
}

impl TtlMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, content: impl Into<String>, reason: &str, ttl: Duration) -> Result<(), AppError> {
        self.write_at(content, reason, ttl, Utc::now())
    }

    pub fn write_at(
        &mut self,
        content: impl Into<String>,
        reason: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if reason.trim().is_empty() {
            return Err(AppError::Usage("memory writes require an explicit reason".into()));
        }
        self.entries.push(MemoryEntry {
            content: content.into(),
            reason: reason.to_string(),
            expires_at: now + ttl,
        });
        Ok(())
    }

    /// Unexpired entries. Expired ones are dropped for good.
    pub fn read(&mut self) -> Vec<MemoryEntry> {
        self.read_at(Utc::now())
    }

    pub fn read_at(&mut self, now: DateTime<Utc>) -> Vec<MemoryEntry> {
        self.purge_at(now);
        self.entries.clone()
    }

    /// Drop entries expired at `now`.
    pub fn purge_at(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|m| m.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
