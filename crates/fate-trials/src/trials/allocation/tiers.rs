use super::affinity::AffinityRule;
use super::domain::{AttributeSpec, Tier, TierSpec, TierTable, TierTableError};
use crate::trials::profile::Dimension;

/// The shipped rarity table: eight elemental essences across four tiers.
/// Base chances cover the full probability mass before personality
/// weighting and population balancing move it around.
pub fn standard_table() -> Result<TierTable, TierTableError> {
    TierTable::new(vec![
        TierSpec {
            tier: Tier::Common,
            base_chance: 0.55,
            enabled: true,
            members: vec![
                AttributeSpec {
                    name: "Earth",
                    aliases: &["earth essence", "土灵根"],
                    affinity: AffinityRule::new(&[
                        (Dimension::Stability, 0.6),
                        (Dimension::Determination, 0.4),
                        (Dimension::Impatience, -0.3),
                    ]),
                },
                AttributeSpec {
                    name: "Wood",
                    aliases: &["wood essence", "木灵根"],
                    affinity: AffinityRule::new(&[
                        (Dimension::Kindness, 0.7),
                        (Dimension::Honesty, 0.3),
                        (Dimension::Greed, -0.4),
                    ]),
                },
                AttributeSpec {
                    name: "Water",
                    aliases: &["water essence", "水灵根"],
                    affinity: AffinityRule::new(&[
                        (Dimension::Stability, 0.5),
                        (Dimension::Focus, 0.5),
                        (Dimension::Impatience, -0.2),
                    ]),
                },
            ],
        },
        TierSpec {
            tier: Tier::Rare,
            base_chance: 0.30,
            enabled: true,
            members: vec![
                AttributeSpec {
                    name: "Fire",
                    aliases: &["fire essence", "火灵根"],
                    affinity: AffinityRule::new(&[
                        (Dimension::Courage, 0.7),
                        (Dimension::Impatience, 0.3),
                        (Dimension::Stability, -0.2),
                    ]),
                },
                AttributeSpec {
                    name: "Metal",
                    aliases: &["metal essence", "金灵根"],
                    affinity: AffinityRule::new(&[
                        (Dimension::Determination, 0.6),
                        (Dimension::Focus, 0.4),
                        (Dimension::Greed, -0.2),
                    ]),
                },
            ],
        },
        TierSpec {
            tier: Tier::Epic,
            base_chance: 0.12,
            enabled: true,
            members: vec![
                AttributeSpec {
                    name: "Storm",
                    aliases: &["storm essence", "雷灵根"],
                    affinity: AffinityRule::new(&[
                        (Dimension::Courage, 0.5),
                        (Dimension::Impatience, 0.5),
                        (Dimension::Stability, -0.3),
                    ]),
                },
                AttributeSpec {
                    name: "Frost",
                    aliases: &["frost essence", "冰灵根"],
                    affinity: AffinityRule::new(&[
                        (Dimension::Focus, 0.6),
                        (Dimension::Stability, 0.4),
                        (Dimension::Impatience, -0.4),
                    ]),
                },
            ],
        },
        TierSpec {
            tier: Tier::Legendary,
            base_chance: 0.03,
            enabled: true,
            members: vec![AttributeSpec {
                name: "Aether",
                aliases: &["aether essence", "天灵根"],
                affinity: AffinityRule::new(&[
                    (Dimension::Honesty, 0.4),
                    (Dimension::Kindness, 0.4),
                    (Dimension::Focus, 0.4),
                    (Dimension::Manipulation, -0.6),
                    (Dimension::Greed, -0.3),
                ]),
            }],
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_validates() {
        let table = standard_table().expect("shipped table is valid");
        assert_eq!(table.tiers().len(), 4);
        assert_eq!(table.enabled_attributes().count(), 8);
    }

    #[test]
    fn standard_fallback_is_common() {
        let table = standard_table().unwrap();
        let fallback = table.fallback_attribute();
        assert_eq!(fallback.tier, Tier::Common);
        assert_eq!(fallback.name, "Earth");
    }

    #[test]
    fn aether_resolves_from_chinese_alias() {
        let table = standard_table().unwrap();
        let hit = table.find("天灵根").expect("alias resolves");
        assert_eq!(hit.name, "Aether");
        assert_eq!(hit.tier, Tier::Legendary);
    }
}
