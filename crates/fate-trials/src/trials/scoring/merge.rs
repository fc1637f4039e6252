use crate::trials::catalog::MergeWeights;
use crate::trials::profile::{Dimension, PersonalityProfile};

/// Blends choice and free-text scores by the package's weights. Graded
/// trials use this so a strong essay cannot fully paper over contradictory
/// choices, nor the reverse.
pub fn merge_weighted(
    choice: &PersonalityProfile,
    text: &PersonalityProfile,
    weights: MergeWeights,
) -> PersonalityProfile {
    let mut merged = PersonalityProfile::zero();
    for dimension in Dimension::ordered() {
        merged.set(
            dimension,
            choice.get(dimension) * weights.choice + text.get(dimension) * weights.text,
        );
    }
    merged.clamped()
}

/// Sums choice and free-text scores outright. The induction rite uses this
/// so every answer leaves a visible mark on the sealed profile.
pub fn merge_additive(
    choice: &PersonalityProfile,
    text: &PersonalityProfile,
) -> PersonalityProfile {
    let mut merged = *choice;
    merged.accumulate(text);
    merged.clamped()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_merge_blends_by_package_weights() {
        let choice = PersonalityProfile {
            courage: 4.0,
            ..PersonalityProfile::zero()
        };
        let text = PersonalityProfile {
            courage: 8.0,
            ..PersonalityProfile::zero()
        };
        let merged = merge_weighted(&choice, &text, MergeWeights::default());
        assert!((merged.courage - (4.0 * 0.3 + 8.0 * 0.7)).abs() < 1e-9);
    }

    #[test]
    fn additive_merge_sums_and_clamps() {
        let choice = PersonalityProfile {
            kindness: 6.5,
            greed: -1.0,
            ..PersonalityProfile::zero()
        };
        let text = PersonalityProfile {
            kindness: 6.5,
            greed: -1.0,
            ..PersonalityProfile::zero()
        };
        let merged = merge_additive(&choice, &text);
        assert_eq!(merged.kindness, 10.0);
        assert_eq!(merged.greed, 0.0);
    }

    #[test]
    fn weighted_merge_never_leaves_bounds() {
        let hot = PersonalityProfile::splat(10.0);
        let merged = merge_weighted(&hot, &hot, MergeWeights { choice: 1.0, text: 1.0 });
        assert_eq!(merged.determination, 10.0);

        let cold = PersonalityProfile::splat(-5.0);
        let merged = merge_weighted(&cold, &cold, MergeWeights::default());
        assert_eq!(merged.determination, 0.0);
    }
}
