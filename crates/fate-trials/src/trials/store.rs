use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::profile::PersonalityProfile;
use super::session::{TrialOutcome, UserId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("trial store unavailable: {0}")]
    Unavailable(String),
}

/// Durable record of one completed trial, written after the outcome is
/// final. The engine treats the write as best-effort; the outcome has
/// already been handed to the player by the time this lands.
#[derive(Debug, Clone, Serialize)]
pub struct TrialRecord {
    pub user_id: UserId,
    pub package: &'static str,
    pub profile: PersonalityProfile,
    pub outcome: TrialOutcome,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[async_trait]
pub trait TrialStore: Send + Sync {
    async fn record(&self, record: TrialRecord) -> Result<(), StoreError>;
    async fn recent(&self, limit: usize) -> Result<Vec<TrialRecord>, StoreError>;
}

/// Store backed by process memory, newest record last.
#[derive(Debug, Default)]
pub struct InMemoryTrialStore {
    records: Mutex<Vec<TrialRecord>>,
}

impl InMemoryTrialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrialStore for InMemoryTrialStore {
    async fn record(&self, record: TrialRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .push(record);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<TrialRecord>, StoreError> {
        let records = self.records.lock().expect("store mutex poisoned");
        let skip = records.len().saturating_sub(limit);
        Ok(records.iter().skip(skip).cloned().collect())
    }
}
