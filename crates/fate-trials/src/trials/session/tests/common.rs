use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use crate::trials::allocation::{
    standard_table, AllocationConfig, FateAllocator, InMemoryPopulationLedger, SeededRandom,
};
use crate::trials::catalog::{TrialCatalog, UserState};
use crate::trials::scoring::{EvaluatorError, PersonalityScorer, ScoringConfig, TextEvaluator};
use crate::trials::session::{Clock, SessionConfig, TrialSessionManager};
use crate::trials::store::InMemoryTrialStore;

pub(super) type TestManager = TrialSessionManager<InMemoryTrialStore, InMemoryPopulationLedger>;

/// Clock the tests wind forward by hand instead of waiting out timers.
pub(super) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(super) fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()),
        })
    }

    pub(super) fn advance_seconds(&self, seconds: i64) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += Duration::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

/// Evaluator that parks inside `evaluate` until the test releases it, so a
/// completion can be held in flight deliberately.
pub(super) struct GatedEvaluator {
    pub(super) entered: Arc<Notify>,
    pub(super) release: Arc<Notify>,
}

#[async_trait]
impl TextEvaluator for GatedEvaluator {
    async fn evaluate(&self, _prompt: &str) -> Result<String, EvaluatorError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok("{\"determination\": 2.0}".to_string())
    }
}

pub(super) struct Harness {
    pub(super) manager: Arc<TestManager>,
    pub(super) clock: Arc<ManualClock>,
    pub(super) store: Arc<InMemoryTrialStore>,
    pub(super) ledger: Arc<InMemoryPopulationLedger>,
}

impl Harness {
    pub(super) fn new() -> Self {
        Self::with_scorer(PersonalityScorer::heuristic(ScoringConfig::default()))
    }

    pub(super) fn with_scorer(scorer: PersonalityScorer) -> Self {
        Self::with_scorer_and_config(scorer, SessionConfig::default())
    }

    pub(super) fn with_scorer_and_config(scorer: PersonalityScorer, config: SessionConfig) -> Self {
        let catalog = Arc::new(TrialCatalog::standard().expect("builtin catalog loads"));
        let random = Arc::new(SeededRandom::seeded(7));
        let ledger = Arc::new(InMemoryPopulationLedger::new());
        let allocator = Arc::new(FateAllocator::new(
            standard_table().expect("shipped table is valid"),
            AllocationConfig::default(),
            Arc::clone(&ledger),
            random.clone(),
        ));
        let store = Arc::new(InMemoryTrialStore::new());
        let clock = ManualClock::new();
        let manager = Arc::new(TrialSessionManager::new(
            catalog,
            Arc::new(scorer),
            allocator,
            Arc::clone(&store),
            clock.clone(),
            random,
            config,
        ));
        Self {
            manager,
            clock,
            store,
            ledger,
        }
    }
}

pub(super) fn newcomer() -> UserState {
    UserState::default()
}

pub(super) fn veteran(rank: u32) -> UserState {
    UserState {
        rank,
        attribute: Some("Earth".to_string()),
    }
}
