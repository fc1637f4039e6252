use serde::{Deserialize, Serialize};

use super::profile::PersonalityProfile;

/// Largest possible Euclidean distance between two profiles: sqrt(9 * 10^2).
const MAX_PROFILE_DISTANCE: f64 = 30.0;

/// Reward band selected from a challenge trial's match rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBand {
    Perfect,
    Good,
    Normal,
}

impl MatchBand {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perfect => "perfect",
            Self::Good => "good",
            Self::Normal => "normal",
        }
    }
}

/// Distance-based match rate between a produced profile and a package ideal.
///
/// Zero distance maps to 100.0; the farthest profile possible maps to 0.0.
/// Deterministic and side-effect free so reward handling stays auditable.
pub fn match_rate(profile: &PersonalityProfile, ideal: &PersonalityProfile) -> f64 {
    let distance = profile.distance(ideal);
    let rate = (1.0 - distance / MAX_PROFILE_DISTANCE) * 100.0;
    rate.clamp(0.0, 100.0)
}

pub fn band_for_rate(rate: f64) -> MatchBand {
    if rate >= 90.0 {
        MatchBand::Perfect
    } else if rate >= 60.0 {
        MatchBand::Good
    } else {
        MatchBand::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_profiles_score_a_full_match() {
        let ideal = PersonalityProfile::splat(7.0);
        assert_eq!(match_rate(&ideal, &ideal), 100.0);
        assert_eq!(band_for_rate(match_rate(&ideal, &ideal)), MatchBand::Perfect);
    }

    #[test]
    fn rate_decreases_as_any_dimension_drifts() {
        let ideal = PersonalityProfile::neutral();
        let mut close = ideal;
        close.courage += 1.0;
        let mut farther = ideal;
        farther.courage += 3.0;

        let close_rate = match_rate(&close, &ideal);
        let farther_rate = match_rate(&farther, &ideal);
        assert!(close_rate < 100.0);
        assert!(farther_rate < close_rate);
    }

    #[test]
    fn band_thresholds_follow_the_reward_ladder() {
        assert_eq!(band_for_rate(90.0), MatchBand::Perfect);
        assert_eq!(band_for_rate(89.9), MatchBand::Good);
        assert_eq!(band_for_rate(60.0), MatchBand::Good);
        assert_eq!(band_for_rate(59.9), MatchBand::Normal);
        assert_eq!(band_for_rate(0.0), MatchBand::Normal);
    }

    #[test]
    fn rate_floors_at_zero_for_opposite_extremes() {
        let low = PersonalityProfile::zero();
        let high = PersonalityProfile::splat(10.0);
        assert_eq!(match_rate(&low, &high), 0.0);
    }
}
