use serde::Serialize;

use super::domain::{Tier, TierTable};
use super::population::PopulationSnapshot;

/// One attribute's standing in the population, observed share against the
/// share the tier table aims for.
#[derive(Debug, Clone, Serialize)]
pub struct AttributeShare {
    pub attribute: &'static str,
    pub tier: Tier,
    pub allocated: u64,
    pub held: u64,
    pub target_share: f64,
    pub observed_share: f64,
}

impl AttributeShare {
    /// Positive when the attribute has been handed out more often than the
    /// table intends; the balancing stage pushes against this.
    pub fn deviation(&self) -> f64 {
        self.observed_share - self.target_share
    }
}

/// Snapshot view of allocation drift, in table (draw) order.
#[derive(Debug, Clone, Serialize)]
pub struct PopulationReport {
    pub total_allocations: u64,
    pub entries: Vec<AttributeShare>,
}

/// Derives the share table the balancing stage works against. Targets are
/// the tier-expansion result renormalized over enabled tiers.
pub fn population_report(table: &TierTable, snapshot: &PopulationSnapshot) -> PopulationReport {
    let mass: f64 = table
        .enabled_attributes()
        .map(|(spec, _)| spec.base_chance / spec.members.len() as f64)
        .sum();
    let entries = table
        .enabled_attributes()
        .map(|(spec, member)| {
            let base = spec.base_chance / spec.members.len() as f64;
            AttributeShare {
                attribute: member.name,
                tier: spec.tier,
                allocated: snapshot.allocated(member.name),
                held: snapshot.held(member.name),
                target_share: if mass > 0.0 { base / mass } else { 0.0 },
                observed_share: snapshot.share(member.name),
            }
        })
        .collect();
    PopulationReport {
        total_allocations: snapshot.total(),
        entries,
    }
}
