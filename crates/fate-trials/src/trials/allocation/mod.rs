//! Fate allocation: turning a sealed personality profile into a rarity
//! tiered attribute.
//!
//! Every draw walks the same pipeline in a fixed order: tier expansion,
//! personality weighting, population balancing, normalization, then the
//! weighted draw. Personality may tilt the odds but never dictate the
//! outcome, and balancing only engages once enough players exist for
//! shares to mean anything.

mod affinity;
mod domain;
mod population;
mod report;
mod rng;
mod tiers;

pub use affinity::{AffinityRule, AFFINITY_SCORE_MAX, AFFINITY_SCORE_MIN};
pub use domain::{Attribute, AttributeSpec, Tier, TierSpec, TierTable, TierTableError};
pub use population::{
    InMemoryPopulationLedger, LedgerError, PopulationLedger, PopulationSnapshot,
};
pub use report::{population_report, AttributeShare, PopulationReport};
pub use rng::{RandomSource, SeededRandom};
pub use tiers::standard_table;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::trials::profile::PersonalityProfile;

#[derive(Debug, Clone, Copy)]
pub struct AllocationConfig {
    /// Largest upward shift personality affinity may apply to one
    /// attribute, as a fraction of the whole probability mass.
    pub personality_boost_cap: f64,
    /// Largest downward shift, likewise a fraction of the whole mass.
    pub personality_penalty_cap: f64,
    /// Population balancing stays inert until this many allocations exist.
    pub balancing_threshold: u64,
    /// Fraction of a share deviation corrected per draw.
    pub balancing_damping: f64,
    /// Hard limit on one balancing correction.
    pub balancing_clamp: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            personality_boost_cap: 0.08,
            personality_penalty_cap: 0.10,
            balancing_threshold: 100,
            balancing_damping: 0.5,
            balancing_clamp: 0.05,
        }
    }
}

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("attribute weights collapsed to zero mass")]
    DistributionCollapsed,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Draws one attribute per completed induction and records it on the
/// population ledger.
pub struct FateAllocator<L> {
    table: TierTable,
    config: AllocationConfig,
    ledger: Arc<L>,
    random: Arc<dyn RandomSource>,
}

struct Candidate {
    attribute: Attribute,
    affinity: AffinityRule,
    base: f64,
    weight: f64,
}

impl<L: PopulationLedger> FateAllocator<L> {
    pub fn new(
        table: TierTable,
        config: AllocationConfig,
        ledger: Arc<L>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            table,
            config,
            ledger,
            random,
        }
    }

    pub fn table(&self) -> &TierTable {
        &self.table
    }

    /// Current allocation drift against the table's targets.
    pub async fn population_report(&self) -> Result<PopulationReport, AllocationError> {
        let snapshot = self.ledger.snapshot().await?;
        Ok(population_report(&self.table, &snapshot))
    }

    pub async fn allocate(
        &self,
        profile: &PersonalityProfile,
    ) -> Result<Attribute, AllocationError> {
        let snapshot = self.ledger.snapshot().await?;
        let attribute = self.select(profile, &snapshot)?;
        self.ledger.record_allocation(&attribute).await?;
        debug!(
            attribute = attribute.name,
            tier = attribute.tier.label(),
            population = snapshot.total() + 1,
            "fate attribute allocated"
        );
        Ok(attribute)
    }

    fn select(
        &self,
        profile: &PersonalityProfile,
        snapshot: &PopulationSnapshot,
    ) -> Result<Attribute, AllocationError> {
        let weights = self.weigh(profile, snapshot)?;
        let roll = self.random.next_unit();
        let mut cumulative = 0.0;
        for (attribute, weight) in &weights {
            cumulative += weight;
            if roll < cumulative {
                return Ok(*attribute);
            }
        }
        // Rounding can leave the cumulative walk a hair short of the roll.
        let fallback = self.table.fallback_attribute();
        warn!(roll, attribute = fallback.name, "draw exhausted weights, using fallback");
        Ok(fallback)
    }

    /// Runs the deterministic stages of the pipeline, returning normalized
    /// weights in table order.
    fn weigh(
        &self,
        profile: &PersonalityProfile,
        snapshot: &PopulationSnapshot,
    ) -> Result<Vec<(Attribute, f64)>, AllocationError> {
        // Tier expansion: each tier's mass splits evenly between members.
        let mut candidates: Vec<Candidate> = self
            .table
            .enabled_attributes()
            .map(|(tier_spec, member)| {
                let base = tier_spec.base_chance / tier_spec.members.len() as f64;
                Candidate {
                    attribute: Attribute {
                        name: member.name,
                        tier: tier_spec.tier,
                    },
                    affinity: member.affinity,
                    base,
                    weight: base,
                }
            })
            .collect();
        let mass: f64 = candidates.iter().map(|c| c.base).sum();
        if mass <= f64::EPSILON {
            return Err(AllocationError::DistributionCollapsed);
        }

        // Personality weighting, capped so affinity tilts but never rules.
        for candidate in &mut candidates {
            let score = candidate.affinity.match_score(profile);
            let cap = if score >= 0.0 {
                self.config.personality_boost_cap
            } else {
                self.config.personality_penalty_cap
            };
            let adjustment = score / AFFINITY_SCORE_MAX * cap * mass;
            candidate.weight = (candidate.weight + adjustment).max(0.0);
        }

        // Population balancing, once enough players exist for shares to
        // carry signal.
        if snapshot.total() >= self.config.balancing_threshold {
            for candidate in &mut candidates {
                let target = candidate.base / mass;
                let deviation = snapshot.share(candidate.attribute.name) - target;
                let nudge = (-deviation * self.config.balancing_damping)
                    .clamp(-self.config.balancing_clamp, self.config.balancing_clamp);
                candidate.weight = (candidate.weight + nudge * mass).max(0.0);
            }
        }

        let sum: f64 = candidates.iter().map(|c| c.weight).sum();
        if sum <= f64::EPSILON {
            return Err(AllocationError::DistributionCollapsed);
        }
        Ok(candidates
            .into_iter()
            .map(|c| (c.attribute, c.weight / sum))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trials::profile::Dimension;
    use std::collections::HashMap;

    struct FixedRandom(f64);

    impl RandomSource for FixedRandom {
        fn next_unit(&self) -> f64 {
            self.0
        }
    }

    fn plain_member(name: &'static str) -> AttributeSpec {
        AttributeSpec {
            name,
            aliases: &[],
            affinity: AffinityRule::none(),
        }
    }

    fn two_tier_table() -> TierTable {
        TierTable::new(vec![
            TierSpec {
                tier: Tier::Common,
                base_chance: 0.6,
                enabled: true,
                members: vec![plain_member("A"), plain_member("B")],
            },
            TierSpec {
                tier: Tier::Rare,
                base_chance: 0.4,
                enabled: true,
                members: vec![plain_member("C")],
            },
        ])
        .unwrap()
    }

    fn allocator_with(table: TierTable, roll: f64) -> FateAllocator<InMemoryPopulationLedger> {
        FateAllocator::new(
            table,
            AllocationConfig::default(),
            Arc::new(InMemoryPopulationLedger::new()),
            Arc::new(FixedRandom(roll)),
        )
    }

    fn weight_of(weights: &[(Attribute, f64)], name: &str) -> f64 {
        weights
            .iter()
            .find(|(attribute, _)| attribute.name == name)
            .map(|(_, weight)| *weight)
            .expect("attribute present")
    }

    #[test]
    fn tier_mass_splits_evenly_between_members() {
        let allocator = allocator_with(two_tier_table(), 0.0);
        let weights = allocator
            .weigh(&PersonalityProfile::zero(), &PopulationSnapshot::default())
            .unwrap();
        assert!((weight_of(&weights, "A") - 0.3).abs() < 1e-9);
        assert!((weight_of(&weights, "B") - 0.3).abs() < 1e-9);
        assert!((weight_of(&weights, "C") - 0.4).abs() < 1e-9);
    }

    #[test]
    fn disabled_tier_mass_renormalizes_over_the_rest() {
        let table = TierTable::new(vec![
            TierSpec {
                tier: Tier::Common,
                base_chance: 0.6,
                enabled: true,
                members: vec![plain_member("A"), plain_member("B")],
            },
            TierSpec {
                tier: Tier::Rare,
                base_chance: 0.4,
                enabled: false,
                members: vec![plain_member("C")],
            },
        ])
        .unwrap();
        let allocator = allocator_with(table, 0.0);
        let weights = allocator
            .weigh(&PersonalityProfile::zero(), &PopulationSnapshot::default())
            .unwrap();
        assert_eq!(weights.len(), 2);
        assert!((weight_of(&weights, "A") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn personality_boost_is_capped() {
        let table = TierTable::new(vec![
            TierSpec {
                tier: Tier::Common,
                base_chance: 0.5,
                enabled: true,
                members: vec![AttributeSpec {
                    name: "Bold",
                    aliases: &[],
                    affinity: AffinityRule::new(&[(Dimension::Courage, 1.0)]),
                }],
            },
            TierSpec {
                tier: Tier::Rare,
                base_chance: 0.5,
                enabled: true,
                members: vec![plain_member("Plain")],
            },
        ])
        .unwrap();
        let allocator = allocator_with(table, 0.0);
        let daring = PersonalityProfile {
            courage: 10.0,
            ..PersonalityProfile::zero()
        };
        let weights = allocator
            .weigh(&daring, &PopulationSnapshot::default())
            .unwrap();
        // Full affinity adds exactly the boost cap before normalization.
        let expected = 0.58 / 1.08;
        assert!((weight_of(&weights, "Bold") - expected).abs() < 1e-9);
    }

    #[test]
    fn personality_penalty_floors_at_zero() {
        let table = TierTable::new(vec![
            TierSpec {
                tier: Tier::Common,
                base_chance: 0.05,
                enabled: true,
                members: vec![AttributeSpec {
                    name: "Shunned",
                    aliases: &[],
                    affinity: AffinityRule::new(&[(Dimension::Greed, -1.0)]),
                }],
            },
            TierSpec {
                tier: Tier::Rare,
                base_chance: 0.95,
                enabled: true,
                members: vec![plain_member("Plain")],
            },
        ])
        .unwrap();
        let allocator = allocator_with(table, 0.0);
        let greedy = PersonalityProfile {
            greed: 10.0,
            ..PersonalityProfile::zero()
        };
        let weights = allocator
            .weigh(&greedy, &PopulationSnapshot::default())
            .unwrap();
        assert_eq!(weight_of(&weights, "Shunned"), 0.0);
        assert!((weight_of(&weights, "Plain") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn collapse_to_zero_mass_is_fatal() {
        let members: Vec<AttributeSpec> = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"]
            .into_iter()
            .map(|name| AttributeSpec {
                name,
                aliases: &[],
                affinity: AffinityRule::new(&[(Dimension::Greed, -1.0)]),
            })
            .collect();
        let table = TierTable::new(vec![TierSpec {
            tier: Tier::Common,
            base_chance: 1.0,
            enabled: true,
            members,
        }])
        .unwrap();
        let allocator = allocator_with(table, 0.0);
        let greedy = PersonalityProfile {
            greed: 10.0,
            ..PersonalityProfile::zero()
        };
        let err = allocator
            .weigh(&greedy, &PopulationSnapshot::default())
            .unwrap_err();
        assert!(matches!(err, AllocationError::DistributionCollapsed));
    }

    #[test]
    fn balancing_stays_inert_below_threshold() {
        let allocator = allocator_with(two_tier_table(), 0.0);
        let skewed = PopulationSnapshot::from_counts(HashMap::from([
            ("A".to_string(), 99u64),
        ]));
        let weights = allocator
            .weigh(&PersonalityProfile::zero(), &skewed)
            .unwrap();
        assert!((weight_of(&weights, "A") - 0.3).abs() < 1e-9);
    }

    #[test]
    fn balancing_pushes_overdrawn_attributes_down() {
        let allocator = allocator_with(two_tier_table(), 0.0);
        // 200 allocations, A holding far above its 30% target.
        let skewed = PopulationSnapshot::from_counts(HashMap::from([
            ("A".to_string(), 160u64),
            ("B".to_string(), 20u64),
            ("C".to_string(), 20u64),
        ]));
        let weights = allocator
            .weigh(&PersonalityProfile::zero(), &skewed)
            .unwrap();
        // Deviation 0.5 damped to 0.25 then clamped to 0.05 points, so the
        // raw weights become 0.25 / 0.35 / 0.45 before normalization.
        let expected_a = 0.25 / 1.05;
        assert!((weight_of(&weights, "A") - expected_a).abs() < 1e-9);
        assert!(weight_of(&weights, "B") > weight_of(&weights, "A"));
    }

    #[test]
    fn draw_walks_weights_in_table_order() {
        let first = allocator_with(two_tier_table(), 0.0);
        let weights = first
            .weigh(&PersonalityProfile::zero(), &PopulationSnapshot::default())
            .unwrap();
        let picked = first
            .select(&PersonalityProfile::zero(), &PopulationSnapshot::default())
            .unwrap();
        assert_eq!(picked.name, weights[0].0.name);

        let last = allocator_with(two_tier_table(), 0.999_999);
        let picked = last
            .select(&PersonalityProfile::zero(), &PopulationSnapshot::default())
            .unwrap();
        assert_eq!(picked.name, "C");
    }

    #[test]
    fn hostile_random_source_falls_back_to_common() {
        let allocator = allocator_with(two_tier_table(), 1.0);
        let picked = allocator
            .select(&PersonalityProfile::zero(), &PopulationSnapshot::default())
            .unwrap();
        assert_eq!(picked.name, "A");
        assert_eq!(picked.tier, Tier::Common);
    }

    #[tokio::test]
    async fn allocate_records_on_the_ledger() {
        let ledger = Arc::new(InMemoryPopulationLedger::new());
        let allocator = FateAllocator::new(
            two_tier_table(),
            AllocationConfig::default(),
            Arc::clone(&ledger),
            Arc::new(SeededRandom::seeded(3)),
        );
        allocator
            .allocate(&PersonalityProfile::zero())
            .await
            .unwrap();
        allocator
            .allocate(&PersonalityProfile::zero())
            .await
            .unwrap();
        let snapshot = ledger.snapshot().await.unwrap();
        assert_eq!(snapshot.total(), 2);
    }

    #[test]
    fn draw_frequencies_converge_on_base_chances() {
        let table = TierTable::new(vec![
            TierSpec {
                tier: Tier::Common,
                base_chance: 0.55,
                enabled: true,
                members: vec![plain_member("A")],
            },
            TierSpec {
                tier: Tier::Rare,
                base_chance: 0.30,
                enabled: true,
                members: vec![plain_member("B")],
            },
            TierSpec {
                tier: Tier::Epic,
                base_chance: 0.12,
                enabled: true,
                members: vec![plain_member("C")],
            },
            TierSpec {
                tier: Tier::Legendary,
                base_chance: 0.03,
                enabled: true,
                members: vec![plain_member("D")],
            },
        ])
        .unwrap();
        let random = Arc::new(SeededRandom::seeded(42));
        let allocator = FateAllocator::new(
            table,
            AllocationConfig::default(),
            Arc::new(InMemoryPopulationLedger::new()),
            random,
        );

        let mut counts: HashMap<&str, u32> = HashMap::new();
        let snapshot = PopulationSnapshot::default();
        for _ in 0..10_000 {
            let attribute = allocator
                .select(&PersonalityProfile::zero(), &snapshot)
                .unwrap();
            *counts.entry(attribute.name).or_insert(0) += 1;
        }
        for (name, expected) in [("A", 0.55), ("B", 0.30), ("C", 0.12), ("D", 0.03)] {
            let observed = f64::from(counts[name]) / 10_000.0;
            assert!(
                (observed - expected).abs() < 0.02,
                "{name}: observed {observed}, expected {expected}"
            );
        }
    }
}
