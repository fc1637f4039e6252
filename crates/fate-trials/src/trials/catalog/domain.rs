use serde::Serialize;

use crate::trials::profile::PersonalityProfile;

/// Every trial runs exactly this many questions, in package order.
pub const QUESTIONS_PER_TRIAL: usize = 3;

/// One selectable option of a multiple-choice question.
///
/// The `contribution` field is the scoring-rules table: pure data mapping
/// the option to a partial nine-dimension score, consumed by the scorer and
/// never surfaced to players.
#[derive(Debug, Clone)]
pub struct ChoiceOption {
    pub label: char,
    pub text: &'static str,
    pub contribution: PersonalityProfile,
}

/// Closed variants for the two question shapes a package may carry.
#[derive(Debug, Clone)]
pub enum QuestionKind {
    Choice { options: Vec<ChoiceOption> },
    FreeText,
}

#[derive(Debug, Clone)]
pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    pub hint: Option<&'static str>,
    pub kind: QuestionKind,
}

impl Question {
    pub fn is_choice(&self) -> bool {
        matches!(self.kind, QuestionKind::Choice { .. })
    }

    /// Highest valid option label, e.g. `'C'` for a three-option question.
    pub fn last_label(&self) -> Option<char> {
        match &self.kind {
            QuestionKind::Choice { options } => options.last().map(|option| option.label),
            QuestionKind::FreeText => None,
        }
    }
}

/// Reward identifiers handed to the (external) reward bookkeeping subsystem,
/// one per match band.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RewardBands {
    pub perfect: &'static str,
    pub good: &'static str,
    pub normal: &'static str,
}

/// What completing the package means: the induction rite allocates a fate
/// attribute, every other package grades the profile against an ideal.
#[derive(Debug, Clone)]
pub enum PackageKind {
    Induction,
    Challenge {
        ideal: PersonalityProfile,
        rewards: RewardBands,
    },
}

impl PackageKind {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Induction => "induction",
            Self::Challenge { .. } => "challenge",
        }
    }
}

/// Relative weights for the hybrid merge of choice- and text-derived scores.
#[derive(Debug, Clone, Copy)]
pub struct MergeWeights {
    pub choice: f64,
    pub text: f64,
}

impl Default for MergeWeights {
    fn default() -> Self {
        Self {
            choice: 0.3,
            text: 0.7,
        }
    }
}

/// Per-package scoring switches layered over the engine-wide defaults.
#[derive(Debug, Clone, Copy)]
pub struct PackageScoring {
    /// When false the evaluator is never consulted for this package and
    /// free-text answers always go through the keyword heuristics.
    pub ai_enabled: bool,
    pub weights: MergeWeights,
}

impl Default for PackageScoring {
    fn default() -> Self {
        Self {
            ai_enabled: true,
            weights: MergeWeights::default(),
        }
    }
}

/// Caller-supplied snapshot of the player used for trigger matching. The
/// engine never verifies it; upstream command handling owns that lookup.
#[derive(Debug, Clone, Default)]
pub struct UserState {
    pub rank: u32,
    pub attribute: Option<String>,
}

/// Conditions gating when a package may trigger for a given player.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerConditions {
    pub min_rank: Option<u32>,
    pub max_rank: Option<u32>,
    /// `Some(false)` restricts the package to players without an allocated
    /// attribute (the induction rite), `Some(true)` to players with one.
    pub requires_attribute: Option<bool>,
}

impl TriggerConditions {
    pub fn matches(&self, state: &UserState) -> bool {
        if let Some(min_rank) = self.min_rank {
            if state.rank < min_rank {
                return false;
            }
        }
        if let Some(max_rank) = self.max_rank {
            if state.rank > max_rank {
                return false;
            }
        }
        if let Some(required) = self.requires_attribute {
            if state.attribute.is_some() != required {
                return false;
            }
        }
        true
    }
}

/// A themed three-question trial registered once at startup. The body is
/// immutable after registration; only the catalog's enabled flag changes at
/// runtime.
#[derive(Debug, Clone)]
pub struct TrialPackage {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
    /// Relative weight used when a trial is drawn by tag.
    pub trigger_chance: f64,
    pub conditions: TriggerConditions,
    pub questions: Vec<Question>,
    pub kind: PackageKind,
    pub scoring: PackageScoring,
}

impl TrialPackage {
    /// Question for a 1-based session step.
    pub fn question(&self, step: u8) -> Option<&Question> {
        self.questions.get(usize::from(step).checked_sub(1)?)
    }

    pub fn is_induction(&self) -> bool {
        matches!(self.kind, PackageKind::Induction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_conditions_gate_on_rank_window() {
        let conditions = TriggerConditions {
            min_rank: Some(3),
            max_rank: Some(9),
            requires_attribute: None,
        };

        assert!(!conditions.matches(&UserState {
            rank: 2,
            attribute: None
        }));
        assert!(conditions.matches(&UserState {
            rank: 3,
            attribute: None
        }));
        assert!(!conditions.matches(&UserState {
            rank: 10,
            attribute: None
        }));
    }

    #[test]
    fn trigger_conditions_gate_on_attribute_presence() {
        let induction_only = TriggerConditions {
            requires_attribute: Some(false),
            ..TriggerConditions::default()
        };

        assert!(induction_only.matches(&UserState::default()));
        assert!(!induction_only.matches(&UserState {
            rank: 1,
            attribute: Some("Aether".to_string()),
        }));
    }
}
