use serde::Serialize;
use thiserror::Error;

use super::affinity::AffinityRule;

/// Tolerance when checking that tier base chances cover the whole
/// probability mass.
const CHANCE_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Tier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

/// One attribute that can be sealed to a player at induction.
#[derive(Debug, Clone, Copy)]
pub struct AttributeSpec {
    pub name: &'static str,
    /// Alternate spellings players use when talking about the attribute,
    /// checked by the abuse screen when an answer demands one by name.
    pub aliases: &'static [&'static str],
    pub affinity: AffinityRule,
}

#[derive(Debug, Clone)]
pub struct TierSpec {
    pub tier: Tier,
    /// Probability mass granted to the tier as a whole, split evenly
    /// between its members before personality weighting.
    pub base_chance: f64,
    pub enabled: bool,
    pub members: Vec<AttributeSpec>,
}

/// An allocated attribute, as stored on the player and reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    pub tier: Tier,
}

#[derive(Debug, Error)]
pub enum TierTableError {
    #[error("tier base chances sum to {sum}, expected 1")]
    ChanceSumMismatch { sum: f64 },
    #[error("tier '{tier}' has a negative base chance {found}")]
    NegativeChance { tier: &'static str, found: f64 },
    #[error("tier '{tier}' has no members")]
    EmptyTier { tier: &'static str },
    #[error("attribute name or alias '{0}' appears more than once")]
    DuplicateName(String),
    #[error("every tier is disabled")]
    NoEnabledTier,
}

/// Validated rarity table. Construction is the only place the invariants
/// are checked; afterwards the allocator trusts the table completely.
#[derive(Debug, Clone)]
pub struct TierTable {
    tiers: Vec<TierSpec>,
}

impl TierTable {
    pub fn new(tiers: Vec<TierSpec>) -> Result<Self, TierTableError> {
        let sum: f64 = tiers.iter().map(|t| t.base_chance).sum();
        if (sum - 1.0).abs() > CHANCE_SUM_TOLERANCE {
            return Err(TierTableError::ChanceSumMismatch { sum });
        }
        if !tiers.iter().any(|t| t.enabled) {
            return Err(TierTableError::NoEnabledTier);
        }

        let mut seen = std::collections::HashSet::new();
        for spec in &tiers {
            if spec.base_chance < 0.0 {
                return Err(TierTableError::NegativeChance {
                    tier: spec.tier.label(),
                    found: spec.base_chance,
                });
            }
            if spec.members.is_empty() {
                return Err(TierTableError::EmptyTier {
                    tier: spec.tier.label(),
                });
            }
            for member in &spec.members {
                if !seen.insert(member.name.to_lowercase()) {
                    return Err(TierTableError::DuplicateName(member.name.to_string()));
                }
                for alias in member.aliases {
                    if !seen.insert(alias.to_lowercase()) {
                        return Err(TierTableError::DuplicateName(alias.to_string()));
                    }
                }
            }
        }
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[TierSpec] {
        &self.tiers
    }

    /// Every attribute of every enabled tier, in table order. Table order
    /// is the draw order, so it must be stable.
    pub fn enabled_attributes(&self) -> impl Iterator<Item = (&TierSpec, &AttributeSpec)> {
        self.tiers
            .iter()
            .filter(|spec| spec.enabled)
            .flat_map(|spec| spec.members.iter().map(move |member| (spec, member)))
    }

    /// Safety net when a draw cannot land: the first member of the most
    /// common enabled tier.
    pub fn fallback_attribute(&self) -> Attribute {
        let spec = self
            .tiers
            .iter()
            .filter(|spec| spec.enabled)
            .max_by(|a, b| a.base_chance.total_cmp(&b.base_chance))
            .expect("tier table always holds an enabled tier");
        Attribute {
            name: spec.members[0].name,
            tier: spec.tier,
        }
    }

    /// Resolves a player-supplied name or alias, case-insensitively.
    pub fn find(&self, needle: &str) -> Option<Attribute> {
        let lowered = needle.to_lowercase();
        for spec in &self.tiers {
            for member in &spec.members {
                let hit = member.name.to_lowercase() == lowered
                    || member.aliases.iter().any(|a| a.to_lowercase() == lowered);
                if hit {
                    return Some(Attribute {
                        name: member.name,
                        tier: spec.tier,
                    });
                }
            }
        }
        None
    }

    /// Name and alias list used by the abuse screen, table order.
    pub fn known_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for spec in &self.tiers {
            for member in &spec.members {
                names.push(member.name);
                names.extend(member.aliases.iter().copied());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &'static str) -> AttributeSpec {
        AttributeSpec {
            name,
            aliases: &[],
            affinity: AffinityRule::none(),
        }
    }

    fn tier(tier: Tier, base_chance: f64, enabled: bool, names: &[&'static str]) -> TierSpec {
        TierSpec {
            tier,
            base_chance,
            enabled,
            members: names.iter().map(|n| spec(n)).collect(),
        }
    }

    #[test]
    fn rejects_chance_sum_off_unity() {
        let err = TierTable::new(vec![
            tier(Tier::Common, 0.6, true, &["A"]),
            tier(Tier::Rare, 0.3, true, &["B"]),
        ])
        .unwrap_err();
        assert!(matches!(err, TierTableError::ChanceSumMismatch { .. }));
    }

    #[test]
    fn rejects_empty_tier() {
        let err = TierTable::new(vec![
            tier(Tier::Common, 1.0, true, &["A"]),
            tier(Tier::Rare, 0.0, true, &[]),
        ])
        .unwrap_err();
        assert!(matches!(err, TierTableError::EmptyTier { tier: "rare" }));
    }

    #[test]
    fn rejects_duplicate_names_case_insensitively() {
        let err = TierTable::new(vec![
            tier(Tier::Common, 0.5, true, &["Ember"]),
            tier(Tier::Rare, 0.5, true, &["ember"]),
        ])
        .unwrap_err();
        assert!(matches!(err, TierTableError::DuplicateName(_)));
    }

    #[test]
    fn rejects_all_tiers_disabled() {
        let err = TierTable::new(vec![tier(Tier::Common, 1.0, false, &["A"])]).unwrap_err();
        assert!(matches!(err, TierTableError::NoEnabledTier));
    }

    #[test]
    fn fallback_is_first_member_of_most_common_enabled_tier() {
        let table = TierTable::new(vec![
            tier(Tier::Common, 0.7, false, &["A", "B"]),
            tier(Tier::Rare, 0.3, true, &["C", "D"]),
        ])
        .unwrap();
        let fallback = table.fallback_attribute();
        assert_eq!(fallback.name, "C");
        assert_eq!(fallback.tier, Tier::Rare);
    }

    #[test]
    fn find_matches_names_and_aliases() {
        let table = TierTable::new(vec![TierSpec {
            tier: Tier::Common,
            base_chance: 1.0,
            enabled: true,
            members: vec![AttributeSpec {
                name: "Earth",
                aliases: &["土灵根"],
                affinity: AffinityRule::none(),
            }],
        }])
        .unwrap();
        assert_eq!(table.find("earth").unwrap().name, "Earth");
        assert_eq!(table.find("土灵根").unwrap().name, "Earth");
        assert!(table.find("lava").is_none());
    }

    #[test]
    fn enabled_attributes_skip_disabled_tiers() {
        let table = TierTable::new(vec![
            tier(Tier::Common, 0.7, true, &["A"]),
            tier(Tier::Rare, 0.3, false, &["B"]),
        ])
        .unwrap();
        let names: Vec<_> = table.enabled_attributes().map(|(_, m)| m.name).collect();
        assert_eq!(names, vec!["A"]);
    }
}
