//! End-to-end specifications for the trial engine, driven through the
//! public facade and the HTTP router only.

mod common {
    use std::sync::Arc;

    use fate_trials::trials::allocation::{
        standard_table, AllocationConfig, FateAllocator, InMemoryPopulationLedger, SeededRandom,
    };
    use fate_trials::trials::catalog::TrialCatalog;
    use fate_trials::trials::scoring::{PersonalityScorer, ScoringConfig};
    use fate_trials::trials::session::{SessionConfig, SystemClock, TrialSessionManager};
    use fate_trials::trials::store::InMemoryTrialStore;

    pub(super) type Manager = TrialSessionManager<InMemoryTrialStore, InMemoryPopulationLedger>;

    pub(super) fn engine(seed: u64) -> (Arc<Manager>, Arc<InMemoryPopulationLedger>) {
        let catalog = Arc::new(TrialCatalog::standard().expect("builtin catalog loads"));
        let random = Arc::new(SeededRandom::seeded(seed));
        let ledger = Arc::new(InMemoryPopulationLedger::new());
        let allocator = Arc::new(FateAllocator::new(
            standard_table().expect("shipped table is valid"),
            AllocationConfig::default(),
            Arc::clone(&ledger),
            random.clone(),
        ));
        let manager = Arc::new(TrialSessionManager::new(
            catalog,
            Arc::new(PersonalityScorer::heuristic(ScoringConfig::default())),
            allocator,
            Arc::new(InMemoryTrialStore::new()),
            Arc::new(SystemClock),
            random,
            SessionConfig::default(),
        ));
        (manager, ledger)
    }
}

use common::engine;
use fate_trials::trials::allocation::PopulationLedger;
use fate_trials::trials::catalog::{UserState, INDUCTION_KEY};
use fate_trials::trials::session::{SubmitOutcome, TrialOutcome, UserId};

#[tokio::test]
async fn a_cohort_of_inductions_populates_the_ledger() {
    let (manager, ledger) = engine(11);

    for i in 0..25 {
        let player = UserId(format!("player-{i}"));
        manager
            .start(player.clone(), INDUCTION_KEY, &UserState::default())
            .expect("induction starts");
        manager.submit_answer(&player, "B").await.expect("step 1");
        manager.submit_answer(&player, "A").await.expect("step 2");
        let outcome = manager
            .submit_answer(&player, "我想找到自己的道")
            .await
            .expect("trial completes");
        let SubmitOutcome::Completed { result } = outcome else {
            panic!("expected completion");
        };
        assert!(matches!(result.outcome, TrialOutcome::Fate { .. }));
    }

    let snapshot = ledger.snapshot().await.expect("ledger snapshot");
    assert_eq!(snapshot.total(), 25);
    assert_eq!(manager.active_sessions(), 0);
}

#[tokio::test]
async fn induction_then_challenge_for_the_same_player() {
    let (manager, _) = engine(3);
    let player = UserId("wanderer".to_string());

    manager
        .start(player.clone(), INDUCTION_KEY, &UserState::default())
        .expect("induction starts");
    manager.submit_answer(&player, "A").await.unwrap();
    manager.submit_answer(&player, "A").await.unwrap();
    let outcome = manager
        .submit_answer(&player, "我愿守护苍生")
        .await
        .expect("induction completes");
    let SubmitOutcome::Completed { result } = outcome else {
        panic!("expected completion");
    };
    let TrialOutcome::Fate { attribute } = result.outcome else {
        panic!("induction allocates an attribute");
    };

    // The player now carries an attribute, so challenges open up.
    let state = UserState {
        rank: 5,
        attribute: Some(attribute.name.to_string()),
    };
    manager
        .start(player.clone(), "trial_of_fortune", &state)
        .expect("challenge starts");
    manager.submit_answer(&player, "A").await.unwrap();
    manager.submit_answer(&player, "A").await.unwrap();
    let outcome = manager
        .submit_answer(&player, "先还清旧账，再帮衬乡里")
        .await
        .expect("challenge completes");
    let SubmitOutcome::Completed { result } = outcome else {
        panic!("expected completion");
    };
    assert!(matches!(result.outcome, TrialOutcome::Reward { .. }));
}

#[tokio::test]
async fn population_report_tracks_the_cohort() {
    let (manager, _) = engine(29);

    for i in 0..10 {
        let player = UserId(format!("p{i}"));
        manager
            .start(player.clone(), INDUCTION_KEY, &UserState::default())
            .unwrap();
        manager.submit_answer(&player, "C").await.unwrap();
        manager.submit_answer(&player, "B").await.unwrap();
        manager.submit_answer(&player, "只求安稳度日").await.unwrap();
    }

    let report = manager.population_report().await.expect("report builds");
    assert_eq!(report.total_allocations, 10);
    let observed: f64 = report.entries.iter().map(|e| e.observed_share).sum();
    assert!((observed - 1.0).abs() < 1e-9);
    let targets: f64 = report.entries.iter().map(|e| e.target_share).sum();
    assert!((targets - 1.0).abs() < 1e-9);
}
