use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use super::domain::Attribute;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("population ledger unavailable: {0}")]
    Unavailable(String),
}

/// Point-in-time view of the attribute population: how many players each
/// attribute was ever sealed to, and how many still hold it. Balancing
/// works on lifetime allocations, so later gameplay that strips or rerolls
/// an attribute moves the held count without distorting the draw.
#[derive(Debug, Clone, Default)]
pub struct PopulationSnapshot {
    allocated: HashMap<String, u64>,
    held: HashMap<String, u64>,
    total: u64,
}

impl PopulationSnapshot {
    /// Snapshot where every allocated attribute is still held, the state of
    /// a population no outside system has touched.
    pub fn from_counts(allocated: HashMap<String, u64>) -> Self {
        let held = allocated.clone();
        Self::with_held(allocated, held)
    }

    pub fn with_held(allocated: HashMap<String, u64>, held: HashMap<String, u64>) -> Self {
        let total = allocated.values().sum();
        Self {
            allocated,
            held,
            total,
        }
    }

    pub fn allocated(&self, attribute: &str) -> u64 {
        self.allocated.get(attribute).copied().unwrap_or(0)
    }

    /// Players currently carrying the attribute.
    pub fn held(&self, attribute: &str) -> u64 {
        self.held.get(attribute).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Fraction of all allocations that went to `attribute`; zero when
    /// nothing has been allocated yet.
    pub fn share(&self, attribute: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.allocated(attribute) as f64 / self.total as f64
    }
}

/// Persistence port for population counts. The draw path reads one
/// snapshot per allocation and appends one record; releases come from the
/// surrounding game systems when an attribute is stripped or rerolled.
#[async_trait]
pub trait PopulationLedger: Send + Sync {
    async fn snapshot(&self) -> Result<PopulationSnapshot, LedgerError>;
    /// Seals the attribute onto one more player: bumps both the lifetime
    /// allocation count and the held count.
    async fn record_allocation(&self, attribute: &Attribute) -> Result<(), LedgerError>;
    /// One player lost the attribute; held drops, lifetime count stays.
    async fn record_release(&self, attribute: &str) -> Result<(), LedgerError>;
}

/// Ledger backed by process memory, the default for single-node deploys
/// and tests.
#[derive(Debug, Default)]
pub struct InMemoryPopulationLedger {
    counts: Mutex<Counts>,
}

#[derive(Debug, Default)]
struct Counts {
    allocated: HashMap<String, u64>,
    held: HashMap<String, u64>,
}

impl InMemoryPopulationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the ledger with existing counts, for rebuilding state at boot.
    pub fn with_counts(allocated: HashMap<String, u64>, held: HashMap<String, u64>) -> Self {
        Self {
            counts: Mutex::new(Counts { allocated, held }),
        }
    }
}

#[async_trait]
impl PopulationLedger for InMemoryPopulationLedger {
    async fn snapshot(&self) -> Result<PopulationSnapshot, LedgerError> {
        let counts = self.counts.lock().expect("ledger mutex poisoned");
        Ok(PopulationSnapshot::with_held(
            counts.allocated.clone(),
            counts.held.clone(),
        ))
    }

    async fn record_allocation(&self, attribute: &Attribute) -> Result<(), LedgerError> {
        let mut counts = self.counts.lock().expect("ledger mutex poisoned");
        *counts.allocated.entry(attribute.name.to_string()).or_insert(0) += 1;
        *counts.held.entry(attribute.name.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn record_release(&self, attribute: &str) -> Result<(), LedgerError> {
        let mut counts = self.counts.lock().expect("ledger mutex poisoned");
        if let Some(held) = counts.held.get_mut(attribute) {
            *held = held.saturating_sub(1);
        }
        Ok(())
    }
}
