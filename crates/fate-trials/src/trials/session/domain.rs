use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::trials::allocation::Attribute;
use crate::trials::catalog::{Question, QuestionKind, TrialPackage};
use crate::trials::matching::MatchBand;
use crate::trials::profile::PersonalityProfile;

use super::screening::{ScreeningReason, ScreeningSeverity};

/// Player identity as supplied by the host platform. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Live trial state for one player. Exactly one of these may exist per
/// player at any time.
#[derive(Debug, Clone)]
pub(super) struct Session {
    pub(super) package: Arc<TrialPackage>,
    pub(super) answers: Vec<String>,
    pub(super) started_at: DateTime<Utc>,
    pub(super) last_answer_at: DateTime<Utc>,
    /// Set the instant the final answer is accepted; blocks every other
    /// mutation until completion removes the session.
    pub(super) completing: bool,
}

impl Session {
    pub(super) fn new(package: Arc<TrialPackage>, now: DateTime<Utc>) -> Self {
        Self {
            package,
            answers: Vec::new(),
            started_at: now,
            last_answer_at: now,
            completing: false,
        }
    }

    /// 1-based step of the question currently awaiting an answer.
    pub(super) fn step(&self) -> u8 {
        self.answers.len() as u8 + 1
    }

    pub(super) fn expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_answer_at > timeout
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub label: char,
    pub text: &'static str,
}

/// One question as shown to the player. Option score contributions never
/// leave the engine.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub step: u8,
    pub total: u8,
    pub prompt: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionView>,
    pub expires_in_seconds: i64,
}

impl QuestionView {
    pub(super) fn render(question: &Question, step: u8, total: u8, timeout: Duration) -> Self {
        let options = match &question.kind {
            QuestionKind::Choice { options } => options
                .iter()
                .map(|option| OptionView {
                    label: option.label,
                    text: option.text,
                })
                .collect(),
            QuestionKind::FreeText => Vec::new(),
        };
        Self {
            step,
            total,
            prompt: question.prompt,
            hint: question.hint,
            options,
            expires_in_seconds: timeout.num_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialStarted {
    pub package: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub question: QuestionView,
}

/// Why a free-text answer terminated the trial.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AbuseNotice {
    pub reason: ScreeningReason,
    pub severity: ScreeningSeverity,
}

/// Final payload of a completed trial.
#[derive(Debug, Clone, Serialize)]
pub struct TrialResult {
    pub package: &'static str,
    pub profile: PersonalityProfile,
    pub outcome: TrialOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrialOutcome {
    /// Induction sealed a fate attribute onto the player.
    Fate { attribute: Attribute },
    /// A challenge graded the player against the package ideal.
    Reward {
        band: MatchBand,
        reward: &'static str,
        match_rate: f64,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Answer accepted, the trial continues.
    Next { question: QuestionView },
    /// Third answer accepted and the trial resolved.
    Completed { result: TrialResult },
    /// The abuse screen ended a challenge trial early.
    Terminated { notice: AbuseNotice },
}
