use crate::trials::profile::{Dimension, PersonalityProfile};

pub const AFFINITY_SCORE_MIN: f64 = -10.0;
pub const AFFINITY_SCORE_MAX: f64 = 10.0;

/// Fixed linear combination of profile dimensions describing how strongly a
/// personality pulls toward one attribute. Coefficients are part of the tier
/// table, not tunable at runtime.
#[derive(Debug, Clone, Copy)]
pub struct AffinityRule {
    terms: &'static [(Dimension, f64)],
}

impl AffinityRule {
    pub const fn new(terms: &'static [(Dimension, f64)]) -> Self {
        Self { terms }
    }

    /// A rule that never moves the draw, for purely luck-based attributes.
    pub const fn none() -> Self {
        Self { terms: &[] }
    }

    /// Scores the pull of `profile` toward this attribute, clamped to
    /// [`AFFINITY_SCORE_MIN`, `AFFINITY_SCORE_MAX`].
    pub fn match_score(&self, profile: &PersonalityProfile) -> f64 {
        let raw: f64 = self
            .terms
            .iter()
            .map(|(dimension, coefficient)| profile.get(*dimension) * coefficient)
            .sum();
        raw.clamp(AFFINITY_SCORE_MIN, AFFINITY_SCORE_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_weighted_dimensions() {
        let rule = AffinityRule::new(&[(Dimension::Courage, 0.7), (Dimension::Greed, -0.5)]);
        let profile = PersonalityProfile {
            courage: 10.0,
            greed: 4.0,
            ..PersonalityProfile::zero()
        };
        assert!((rule.match_score(&profile) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn clamps_extreme_pulls() {
        let rule = AffinityRule::new(&[(Dimension::Focus, 3.0)]);
        let eager = PersonalityProfile {
            focus: 10.0,
            ..PersonalityProfile::zero()
        };
        assert_eq!(rule.match_score(&eager), AFFINITY_SCORE_MAX);

        let repelled = AffinityRule::new(&[(Dimension::Greed, -3.0)]);
        let greedy = PersonalityProfile {
            greed: 10.0,
            ..PersonalityProfile::zero()
        };
        assert_eq!(repelled.match_score(&greedy), AFFINITY_SCORE_MIN);
    }

    #[test]
    fn empty_rule_scores_zero() {
        assert_eq!(
            AffinityRule::none().match_score(&PersonalityProfile::splat(10.0)),
            0.0
        );
    }
}
