use super::domain::{
    ChoiceOption, MergeWeights, PackageKind, PackageScoring, Question, QuestionKind, RewardBands,
    TriggerConditions, TrialPackage,
};
use crate::trials::profile::PersonalityProfile;

/// Key of the induction rite; the one package allowed to allocate a fate
/// attribute and the entry point of every new player.
pub const INDUCTION_KEY: &str = "attunement_rite";

pub(super) fn standard_packages() -> Vec<TrialPackage> {
    vec![attunement_rite(), trial_of_resolve(), trial_of_fortune()]
}

fn attunement_rite() -> TrialPackage {
    TrialPackage {
        key: INDUCTION_KEY,
        name: "Rite of Attunement",
        description: "The first reading of a newcomer's temperament, sealing their innate essence.",
        tags: &["induction", "onboarding"],
        trigger_chance: 1.0,
        conditions: TriggerConditions {
            min_rank: None,
            max_rank: None,
            requires_attribute: Some(false),
        },
        questions: vec![
            Question {
                id: "rite_water",
                prompt: "A dying stranger on the mountain road begs for the last of your water. What do you do?",
                hint: None,
                kind: QuestionKind::Choice {
                    options: vec![
                        ChoiceOption {
                            label: 'A',
                            text: "Give it freely and walk on thirsty.",
                            contribution: PersonalityProfile {
                                kindness: 2.0,
                                honesty: 1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'B',
                            text: "Split it evenly and share the road.",
                            contribution: PersonalityProfile {
                                kindness: 1.0,
                                stability: 1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'C',
                            text: "Trade it for something of equal worth.",
                            contribution: PersonalityProfile {
                                greed: 1.0,
                                stability: 0.5,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'D',
                            text: "Keep walking; the mountain spares no one.",
                            contribution: PersonalityProfile {
                                determination: 1.5,
                                impatience: 0.5,
                                kindness: -1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                    ],
                },
            },
            Question {
                id: "rite_chest",
                prompt: "A sealed chest washes up after the flood. It is not yours. What becomes of it?",
                hint: None,
                kind: QuestionKind::Choice {
                    options: vec![
                        ChoiceOption {
                            label: 'A',
                            text: "Seek its owner before anything else.",
                            contribution: PersonalityProfile {
                                honesty: 2.0,
                                kindness: 1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'B',
                            text: "Open it; what it holds may matter more than who owns it.",
                            contribution: PersonalityProfile {
                                focus: 1.0,
                                courage: 0.5,
                                impatience: 0.5,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'C',
                            text: "Leave it where the water put it and tell no one.",
                            contribution: PersonalityProfile {
                                stability: 1.5,
                                courage: -0.5,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'D',
                            text: "Claim it quietly as your own.",
                            contribution: PersonalityProfile {
                                greed: 2.0,
                                manipulation: 1.0,
                                honesty: -1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                    ],
                },
            },
            Question {
                id: "rite_path",
                prompt: "Speak plainly: what do you seek on this path?",
                hint: Some("One or two honest sentences are enough."),
                kind: QuestionKind::FreeText,
            },
        ],
        kind: PackageKind::Induction,
        scoring: PackageScoring::default(),
    }
}

fn trial_of_resolve() -> TrialPackage {
    TrialPackage {
        key: "trial_of_resolve",
        name: "Trial of Resolve",
        description: "A graded test of discipline for attuned players, rewarding steadiness over flash.",
        tags: &["challenge", "discipline"],
        trigger_chance: 0.6,
        conditions: TriggerConditions {
            min_rank: Some(2),
            max_rank: None,
            requires_attribute: Some(true),
        },
        questions: vec![
            Question {
                id: "resolve_ascent",
                prompt: "Halfway up the thousand-step ascent, a storm closes in. What is your move?",
                hint: None,
                kind: QuestionKind::Choice {
                    options: vec![
                        ChoiceOption {
                            label: 'A',
                            text: "Climb on at the same measured pace.",
                            contribution: PersonalityProfile {
                                determination: 2.0,
                                stability: 1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'B',
                            text: "Shelter and wait the storm out.",
                            contribution: PersonalityProfile {
                                stability: 2.0,
                                impatience: -1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'C',
                            text: "Sprint for the summit before it worsens.",
                            contribution: PersonalityProfile {
                                courage: 1.5,
                                impatience: 1.5,
                                stability: -0.5,
                                ..PersonalityProfile::zero()
                            },
                        },
                    ],
                },
            },
            Question {
                id: "resolve_rival",
                prompt: "A rival offers you their notes on the technique you have failed nine times.",
                hint: None,
                kind: QuestionKind::Choice {
                    options: vec![
                        ChoiceOption {
                            label: 'A',
                            text: "Decline; the tenth attempt must be yours alone.",
                            contribution: PersonalityProfile {
                                determination: 2.0,
                                focus: 1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'B',
                            text: "Accept openly and credit them after.",
                            contribution: PersonalityProfile {
                                honesty: 1.5,
                                kindness: 1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'C',
                            text: "Accept, study them in secret, and say nothing.",
                            contribution: PersonalityProfile {
                                manipulation: 1.5,
                                focus: 0.5,
                                honesty: -1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                    ],
                },
            },
            Question {
                id: "resolve_why",
                prompt: "What keeps you climbing when nobody is watching?",
                hint: Some("Answer in your own words."),
                kind: QuestionKind::FreeText,
            },
        ],
        kind: PackageKind::Challenge {
            ideal: PersonalityProfile {
                determination: 9.0,
                courage: 6.0,
                stability: 7.0,
                focus: 8.0,
                honesty: 6.0,
                kindness: 5.0,
                greed: 2.0,
                impatience: 2.0,
                manipulation: 1.0,
            },
            rewards: RewardBands {
                perfect: "resolve_sigil",
                good: "focus_incense",
                normal: "plain_token",
            },
        },
        scoring: PackageScoring::default(),
    }
}

fn trial_of_fortune() -> TrialPackage {
    TrialPackage {
        key: "trial_of_fortune",
        name: "Trial of Fortune",
        description: "A temptation trial dressed as a windfall; the grading favors clean hands.",
        tags: &["challenge", "fortune"],
        trigger_chance: 0.4,
        conditions: TriggerConditions {
            min_rank: Some(1),
            max_rank: None,
            requires_attribute: Some(true),
        },
        questions: vec![
            Question {
                id: "fortune_purse",
                prompt: "A merchant's purse lies in the ditch, heavy and unmarked. Nobody saw you find it.",
                hint: None,
                kind: QuestionKind::Choice {
                    options: vec![
                        ChoiceOption {
                            label: 'A',
                            text: "Hand it to the road warden unopened.",
                            contribution: PersonalityProfile {
                                honesty: 2.0,
                                kindness: 0.5,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'B',
                            text: "Take a finder's share, return the rest.",
                            contribution: PersonalityProfile {
                                greed: 1.0,
                                honesty: 0.5,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'C',
                            text: "Pocket it; fortune favored you today.",
                            contribution: PersonalityProfile {
                                greed: 2.0,
                                honesty: -1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                    ],
                },
            },
            Question {
                id: "fortune_tip",
                prompt: "A stranger whispers tomorrow's auction prices, asking only that you owe a favor.",
                hint: None,
                kind: QuestionKind::Choice {
                    options: vec![
                        ChoiceOption {
                            label: 'A',
                            text: "Refuse; unpriced favors cost the most.",
                            contribution: PersonalityProfile {
                                stability: 1.5,
                                honesty: 1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'B',
                            text: "Agree, and plan never to pay it back.",
                            contribution: PersonalityProfile {
                                manipulation: 2.0,
                                greed: 1.0,
                                honesty: -1.0,
                                ..PersonalityProfile::zero()
                            },
                        },
                        ChoiceOption {
                            label: 'C',
                            text: "Agree openly and honor the debt.",
                            contribution: PersonalityProfile {
                                courage: 1.0,
                                greed: 0.5,
                                honesty: 0.5,
                                ..PersonalityProfile::zero()
                            },
                        },
                    ],
                },
            },
            Question {
                id: "fortune_use",
                prompt: "If the windfall were real, what would you spend it on first?",
                hint: Some("Answer in your own words."),
                kind: QuestionKind::FreeText,
            },
        ],
        kind: PackageKind::Challenge {
            ideal: PersonalityProfile {
                determination: 5.0,
                courage: 5.0,
                stability: 6.0,
                focus: 5.0,
                honesty: 8.0,
                kindness: 7.0,
                greed: 1.0,
                impatience: 3.0,
                manipulation: 0.0,
            },
            rewards: RewardBands {
                perfect: "windfall_charm",
                good: "lucky_bead",
                normal: "copper_coin",
            },
        },
        scoring: PackageScoring {
            ai_enabled: true,
            weights: MergeWeights {
                choice: 0.4,
                text: 0.6,
            },
        },
    }
}
