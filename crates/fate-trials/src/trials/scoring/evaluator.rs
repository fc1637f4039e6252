use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trials::profile::{Dimension, PersonalityProfile};

/// Per-dimension limits applied to whatever a text evaluation produces.
/// Model replies are untrusted; a hallucinated `"kindness": 9000` must not
/// be able to swamp the choice scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self { min: -3.0, max: 8.0 }
    }
}

impl ScoreBounds {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn clamp_profile(&self, profile: &PersonalityProfile) -> PersonalityProfile {
        let mut bounded = PersonalityProfile::zero();
        for dimension in Dimension::ordered() {
            bounded.set(dimension, self.clamp(profile.get(dimension)));
        }
        bounded
    }
}

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("text evaluator unavailable: {0}")]
    Unavailable(String),
    #[error("evaluator reply carried no score object")]
    MissingScores,
    #[error("evaluator reply was not valid JSON: {0}")]
    MalformedReply(#[from] serde_json::Error),
}

/// Completion backend for free-text scoring. Implementations receive a
/// fully rendered prompt and return the raw model reply; the engine owns
/// the prompt contract and the reply parsing so backends stay swappable.
#[async_trait]
pub trait TextEvaluator: Send + Sync {
    async fn evaluate(&self, prompt: &str) -> Result<String, EvaluatorError>;
}

/// Renders the scoring prompt for one completed trial's free-text answers.
pub fn build_score_prompt(
    trial_name: &str,
    pairs: &[(&str, &str)],
    bounds: ScoreBounds,
) -> String {
    let mut prompt = String::with_capacity(512);
    prompt.push_str("You grade free-text answers from the trial \"");
    prompt.push_str(trial_name);
    prompt.push_str("\".\n");
    prompt.push_str(
        "Score what each answer reveals about the writer on every dimension below. \
         Answers may be written in any language.\n\nDimensions:\n",
    );
    for dimension in Dimension::ordered() {
        prompt.push_str("- ");
        prompt.push_str(dimension.label());
        prompt.push('\n');
    }
    prompt.push('\n');
    for (question, answer) in pairs {
        prompt.push_str("Question: ");
        prompt.push_str(question);
        prompt.push_str("\nAnswer: ");
        prompt.push_str(answer);
        prompt.push_str("\n\n");
    }
    prompt.push_str(&format!(
        "Reply with a single JSON object mapping each dimension name to a number \
         between {} and {}. Omit a dimension if the answers say nothing about it. \
         No prose outside the JSON object.",
        bounds.min, bounds.max
    ));
    prompt
}

#[derive(Debug, Default, Deserialize)]
struct ReplyScores {
    #[serde(default)]
    determination: f64,
    #[serde(default)]
    courage: f64,
    #[serde(default)]
    stability: f64,
    #[serde(default)]
    focus: f64,
    #[serde(default)]
    honesty: f64,
    #[serde(default)]
    kindness: f64,
    #[serde(default)]
    greed: f64,
    #[serde(default)]
    impatience: f64,
    #[serde(default)]
    manipulation: f64,
}

/// Extracts the score object from a model reply. Tolerates prose around the
/// JSON block since models rarely honor "no prose" perfectly.
pub fn parse_score_reply(reply: &str) -> Result<PersonalityProfile, EvaluatorError> {
    let start = reply.find('{').ok_or(EvaluatorError::MissingScores)?;
    let end = reply.rfind('}').ok_or(EvaluatorError::MissingScores)?;
    if end < start {
        return Err(EvaluatorError::MissingScores);
    }
    let scores: ReplyScores = serde_json::from_str(&reply[start..=end])?;
    Ok(PersonalityProfile {
        determination: scores.determination,
        courage: scores.courage,
        stability: scores.stability,
        focus: scores.focus,
        honesty: scores.honesty,
        kindness: scores.kindness,
        greed: scores.greed,
        impatience: scores.impatience,
        manipulation: scores.manipulation,
    })
}
