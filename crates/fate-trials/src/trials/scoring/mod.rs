//! Personality scoring for completed trials.
//!
//! Choice answers score deterministically from the catalog's option
//! contributions. Free-text answers go through the configured
//! [`TextEvaluator`] when the package allows it, with keyword heuristics as
//! the fallback so a model outage degrades grading instead of blocking
//! trials.

mod evaluator;
mod heuristics;
mod merge;

pub use evaluator::{
    build_score_prompt, parse_score_reply, EvaluatorError, ScoreBounds, TextEvaluator,
};
pub use heuristics::score_free_text;
pub use merge::{merge_additive, merge_weighted};

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::trials::catalog::{PackageKind, QuestionKind, TrialPackage};
use crate::trials::profile::PersonalityProfile;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("expected {expected} answers, received {found}")]
    AnswerCountMismatch { expected: usize, found: usize },
    #[error("question '{question}' has no option labeled '{label}'")]
    UnknownOption { question: &'static str, label: char },
    #[error("text evaluation failed: {0}")]
    Evaluator(#[from] EvaluatorError),
}

/// Where the free-text portion of a breakdown came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Evaluator,
    Heuristics,
    Skipped,
}

impl TextSource {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Evaluator => "evaluator",
            Self::Heuristics => "heuristics",
            Self::Skipped => "skipped",
        }
    }
}

/// Full scoring result for one trial, kept apart so callers can log or
/// persist the unmerged parts.
#[derive(Debug, Clone, Copy)]
pub struct ScoreBreakdown {
    pub choice: PersonalityProfile,
    pub text: PersonalityProfile,
    pub merged: PersonalityProfile,
    pub text_source: TextSource,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    /// Fall back to keyword heuristics when the evaluator errors instead of
    /// failing the trial.
    pub fallback_on_error: bool,
    pub text_bounds: ScoreBounds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            fallback_on_error: true,
            text_bounds: ScoreBounds::default(),
        }
    }
}

pub struct PersonalityScorer {
    evaluator: Option<Arc<dyn TextEvaluator>>,
    config: ScoringConfig,
}

impl PersonalityScorer {
    /// Scorer with no model in the loop; free text scores heuristically.
    pub fn heuristic(config: ScoringConfig) -> Self {
        Self {
            evaluator: None,
            config,
        }
    }

    pub fn with_evaluator(config: ScoringConfig, evaluator: Arc<dyn TextEvaluator>) -> Self {
        Self {
            evaluator: Some(evaluator),
            config,
        }
    }

    /// Scores a completed trial. `answers` must line up one-to-one with the
    /// package's questions, already validated by the session layer.
    pub async fn score(
        &self,
        package: &TrialPackage,
        answers: &[String],
    ) -> Result<ScoreBreakdown, ScoringError> {
        if answers.len() != package.questions.len() {
            return Err(ScoringError::AnswerCountMismatch {
                expected: package.questions.len(),
                found: answers.len(),
            });
        }

        let mut choice = PersonalityProfile::zero();
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        for (question, answer) in package.questions.iter().zip(answers) {
            match &question.kind {
                QuestionKind::Choice { options } => {
                    let label = answer.chars().next().unwrap_or('?');
                    let option = options
                        .iter()
                        .find(|option| answer.chars().count() == 1 && option.label == label)
                        .ok_or(ScoringError::UnknownOption {
                            question: question.id,
                            label,
                        })?;
                    choice.accumulate(&option.contribution);
                }
                QuestionKind::FreeText => pairs.push((question.prompt, answer.as_str())),
            }
        }

        let (text, text_source) = if pairs.is_empty() {
            (PersonalityProfile::zero(), TextSource::Skipped)
        } else {
            self.score_text(package, &pairs).await?
        };

        let merged = match &package.kind {
            PackageKind::Induction => merge_additive(&choice, &text),
            PackageKind::Challenge { .. } => {
                merge_weighted(&choice, &text, package.scoring.weights)
            }
        };

        Ok(ScoreBreakdown {
            choice,
            text,
            merged,
            text_source,
        })
    }

    async fn score_text(
        &self,
        package: &TrialPackage,
        pairs: &[(&str, &str)],
    ) -> Result<(PersonalityProfile, TextSource), ScoringError> {
        if package.scoring.ai_enabled {
            if let Some(evaluator) = &self.evaluator {
                let prompt = build_score_prompt(package.name, pairs, self.config.text_bounds);
                let outcome = evaluator
                    .evaluate(&prompt)
                    .await
                    .and_then(|reply| parse_score_reply(&reply));
                match outcome {
                    Ok(raw) => {
                        let bounded = self.config.text_bounds.clamp_profile(&raw);
                        return Ok((bounded, TextSource::Evaluator));
                    }
                    Err(error) if self.config.fallback_on_error => {
                        warn!(
                            trial = package.key,
                            %error,
                            "text evaluator failed, falling back to heuristics"
                        );
                    }
                    Err(error) => return Err(error.into()),
                }
            }
        }

        let mut delta = PersonalityProfile::zero();
        for (_, answer) in pairs {
            delta.accumulate(&heuristics::score_free_text(answer));
        }
        let bounded = self.config.text_bounds.clamp_profile(&delta);
        Ok((bounded, TextSource::Heuristics))
    }
}
