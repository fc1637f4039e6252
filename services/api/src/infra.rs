use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use fate_trials::config::TrialRuntimeConfig;
use fate_trials::error::AppError;
use fate_trials::trials::allocation::{
    standard_table, AllocationConfig, FateAllocator, InMemoryPopulationLedger, SeededRandom,
};
use fate_trials::trials::catalog::TrialCatalog;
use fate_trials::trials::scoring::{PersonalityScorer, ScoringConfig};
use fate_trials::trials::session::{SessionConfig, SystemClock, TrialSessionManager};
use fate_trials::trials::store::InMemoryTrialStore;

/// The single-node engine wiring: process-memory store and ledger behind
/// the engine's ports.
pub(crate) type EngineManager =
    TrialSessionManager<InMemoryTrialStore, InMemoryPopulationLedger>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) sessions: Arc<EngineManager>,
}

pub(crate) fn session_config(trials: &TrialRuntimeConfig) -> SessionConfig {
    SessionConfig {
        answer_timeout: chrono::Duration::seconds(trials.answer_timeout_secs as i64),
        sweep_interval: std::time::Duration::from_secs(trials.sweep_interval_secs),
        ..SessionConfig::default()
    }
}

/// Assembles the trial engine. `seed` pins the allocation RNG for demos;
/// the server passes `None` and draws from entropy.
pub(crate) fn build_engine(
    config: SessionConfig,
    seed: Option<u64>,
) -> Result<Arc<EngineManager>, AppError> {
    let catalog = Arc::new(TrialCatalog::standard()?);
    let random = match seed {
        Some(seed) => Arc::new(SeededRandom::seeded(seed)),
        None => Arc::new(SeededRandom::from_entropy()),
    };
    let ledger = Arc::new(InMemoryPopulationLedger::new());
    let allocator = Arc::new(FateAllocator::new(
        standard_table()?,
        AllocationConfig::default(),
        ledger,
        random.clone(),
    ));
    let manager = TrialSessionManager::new(
        catalog,
        Arc::new(PersonalityScorer::heuristic(ScoringConfig::default())),
        allocator,
        Arc::new(InMemoryTrialStore::new()),
        Arc::new(SystemClock),
        random,
        config,
    );
    Ok(Arc::new(manager))
}
