use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::trials::allocation::{
    AllocationError, FateAllocator, PopulationLedger, PopulationReport, RandomSource,
};
use crate::trials::catalog::{
    PackageKind, QuestionKind, TrialCatalog, TrialPackage, UserState,
};
use crate::trials::matching::{band_for_rate, match_rate, MatchBand};
use crate::trials::scoring::{PersonalityScorer, ScoringError, TextEvaluator};
use crate::trials::store::{TrialRecord, TrialStore};

use super::clock::Clock;
use super::domain::{
    AbuseNotice, QuestionView, Session, SubmitOutcome, TrialOutcome, TrialResult, TrialStarted,
    UserId,
};
use super::screening::{AbuseScreen, ScreeningConfig, ScreeningReason, ScreeningSeverity,
    ScreeningVerdict};

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// How long a session may sit on one question before it expires.
    pub answer_timeout: Duration,
    /// Cadence of the background sweep that reclaims abandoned sessions.
    pub sweep_interval: std::time::Duration,
    pub screening: ScreeningConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            answer_timeout: Duration::seconds(300),
            sweep_interval: std::time::Duration::from_secs(300),
            screening: ScreeningConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TrialError {
    #[error("a trial is already underway for this player")]
    SessionExists,
    #[error("no trial underway for this player")]
    NoSession,
    #[error("unknown or disabled trial package '{0}'")]
    UnknownPackage(String),
    #[error("no enabled package tagged '{0}' admits this player")]
    NoEligiblePackage(String),
    #[error("trigger conditions do not admit this player")]
    ConditionsNotMet,
    #[error("answer must be a single letter from A to {last}")]
    MalformedChoice { last: char },
    #[error("answer rejected by the abuse screen: {}", reason.label())]
    AbuseDetected {
        reason: ScreeningReason,
        severity: ScreeningSeverity,
    },
    #[error("evaluation already in progress")]
    CompletionInProgress,
    #[error("trial timed out waiting for an answer")]
    SessionExpired,
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

impl TrialError {
    /// Stable machine-readable code; the surrounding layer owns any
    /// player-facing wording.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionExists => "session_exists",
            Self::NoSession => "no_session",
            Self::UnknownPackage(_) => "unknown_package",
            Self::NoEligiblePackage(_) => "no_eligible_package",
            Self::ConditionsNotMet => "conditions_not_met",
            Self::MalformedChoice { .. } => "malformed_choice",
            Self::AbuseDetected { .. } => "abuse_detected",
            Self::CompletionInProgress => "completion_in_progress",
            Self::SessionExpired => "session_expired",
            Self::Scoring(_) => "scoring_failed",
            Self::Allocation(_) => "allocation_failed",
        }
    }
}

/// Owns the one-live-session-per-player table and drives each trial from
/// first question to final outcome.
pub struct TrialSessionManager<S, L> {
    catalog: Arc<TrialCatalog>,
    scorer: Arc<PersonalityScorer>,
    allocator: Arc<FateAllocator<L>>,
    store: Arc<S>,
    screen: AbuseScreen,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    flavor: Option<Arc<dyn TextEvaluator>>,
    config: SessionConfig,
    sessions: Mutex<HashMap<UserId, Session>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

/// What the locked intake phase decided; completion work happens after the
/// lock is released.
enum Accepted {
    Next(QuestionView),
    Terminated(AbuseNotice),
    Finished(CompletionContext),
}

struct CompletionContext {
    user_id: UserId,
    package: Arc<TrialPackage>,
    answers: Vec<String>,
    started_at: DateTime<Utc>,
}

impl<S, L> TrialSessionManager<S, L>
where
    S: TrialStore + 'static,
    L: PopulationLedger + 'static,
{
    pub fn new(
        catalog: Arc<TrialCatalog>,
        scorer: Arc<PersonalityScorer>,
        allocator: Arc<FateAllocator<L>>,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        config: SessionConfig,
    ) -> Self {
        let names = allocator.table().known_names();
        let screen = AbuseScreen::new(config.screening, &names);
        Self {
            catalog,
            scorer,
            allocator,
            store,
            screen,
            clock,
            random,
            flavor: None,
            config,
            sessions: Mutex::new(HashMap::new()),
            sweeper: Mutex::new(None),
        }
    }

    /// Attaches a text backend used to dress final outcomes in a line or
    /// two of narration. Entirely best-effort.
    pub fn with_flavor_writer(mut self, writer: Arc<dyn TextEvaluator>) -> Self {
        self.flavor = Some(writer);
        self
    }

    /// Starts the named package for a player. The caller supplies the
    /// player state; the engine checks the package's trigger conditions
    /// against it but never verifies the state itself.
    pub fn start(
        &self,
        user_id: UserId,
        package_key: &str,
        state: &UserState,
    ) -> Result<TrialStarted, TrialError> {
        let package = self
            .catalog
            .get_enabled(package_key)
            .ok_or_else(|| TrialError::UnknownPackage(package_key.to_string()))?;
        if !package.conditions.matches(state) {
            return Err(TrialError::ConditionsNotMet);
        }
        self.open_session(user_id, package)
    }

    /// Starts a randomly drawn package carrying `tag`, weighted by each
    /// candidate's trigger chance.
    pub fn start_by_tag(
        &self,
        user_id: UserId,
        tag: &str,
        state: &UserState,
    ) -> Result<TrialStarted, TrialError> {
        let candidates: Vec<_> = self
            .catalog
            .tagged(tag)
            .into_iter()
            .filter(|package| package.conditions.matches(state))
            .collect();
        let package = pick_by_trigger_chance(&candidates, self.random.as_ref())
            .ok_or_else(|| TrialError::NoEligiblePackage(tag.to_string()))?;
        self.open_session(user_id, package)
    }

    fn open_session(
        &self,
        user_id: UserId,
        package: Arc<TrialPackage>,
    ) -> Result<TrialStarted, TrialError> {
        let now = self.clock.now();
        let mut sessions = self.lock_sessions();
        if sessions.contains_key(&user_id) {
            return Err(TrialError::SessionExists);
        }
        let session = Session::new(Arc::clone(&package), now);
        let question = self.question_view(&session)?;
        sessions.insert(user_id.clone(), session);
        drop(sessions);

        debug!(user = %user_id, package = package.key, "trial session opened");
        Ok(TrialStarted {
            package: package.key,
            name: package.name,
            description: package.description,
            question,
        })
    }

    /// Feeds one raw answer into the player's live session.
    pub async fn submit_answer(
        &self,
        user_id: &UserId,
        raw: &str,
    ) -> Result<SubmitOutcome, TrialError> {
        match self.accept_answer(user_id, raw)? {
            Accepted::Next(question) => Ok(SubmitOutcome::Next { question }),
            Accepted::Terminated(notice) => Ok(SubmitOutcome::Terminated { notice }),
            Accepted::Finished(context) => {
                // The session stays in the table with completing=true while
                // the scorer and allocator run, and is removed afterwards no
                // matter how completion went.
                let outcome = self.complete(context).await;
                self.remove_session(user_id);
                outcome.map(|result| SubmitOutcome::Completed { result })
            }
        }
    }

    /// Validation and bookkeeping phase, fully synchronous under the
    /// session lock. No awaits happen while the lock is held.
    fn accept_answer(&self, user_id: &UserId, raw: &str) -> Result<Accepted, TrialError> {
        let now = self.clock.now();
        let mut sessions = self.lock_sessions();
        let Some(session) = sessions.get_mut(user_id) else {
            return Err(TrialError::NoSession);
        };
        if session.completing {
            return Err(TrialError::CompletionInProgress);
        }
        if session.expired(now, self.config.answer_timeout) {
            sessions.remove(user_id);
            return Err(TrialError::SessionExpired);
        }

        let step = session.step();
        let induction = session.package.is_induction();
        let Some(question) = session.package.question(step) else {
            sessions.remove(user_id);
            return Err(TrialError::NoSession);
        };

        let answer = match &question.kind {
            QuestionKind::Choice { options } => {
                // Strict shape: exactly one letter, within the option range.
                // Anything else re-prompts without consuming the step.
                let last = question.last_label().unwrap_or('A');
                let mut glyphs = raw.chars();
                match (glyphs.next(), glyphs.next()) {
                    (Some(label), None) if options.iter().any(|o| o.label == label) => {
                        label.to_string()
                    }
                    _ => return Err(TrialError::MalformedChoice { last }),
                }
            }
            QuestionKind::FreeText => match self.screen.inspect(raw) {
                ScreeningVerdict::Clean => raw.to_string(),
                ScreeningVerdict::Exploit { reason, severity } => {
                    sessions.remove(user_id);
                    warn!(
                        user = %user_id,
                        reason = reason.label(),
                        severity = severity.label(),
                        "trial answer tripped the abuse screen"
                    );
                    if induction {
                        return Err(TrialError::AbuseDetected { reason, severity });
                    }
                    return Ok(Accepted::Terminated(AbuseNotice { reason, severity }));
                }
            },
        };

        session.answers.push(answer);
        session.last_answer_at = now;

        if session.answers.len() < session.package.questions.len() {
            let question = self.question_view(session)?;
            Ok(Accepted::Next(question))
        } else {
            session.completing = true;
            Ok(Accepted::Finished(CompletionContext {
                user_id: user_id.clone(),
                package: Arc::clone(&session.package),
                answers: session.answers.clone(),
                started_at: session.started_at,
            }))
        }
    }

    async fn complete(&self, context: CompletionContext) -> Result<TrialResult, TrialError> {
        let breakdown = self
            .scorer
            .score(&context.package, &context.answers)
            .await?;

        let outcome = match &context.package.kind {
            PackageKind::Induction => {
                let attribute = self.allocator.allocate(&breakdown.merged).await?;
                info!(
                    user = %context.user_id,
                    attribute = attribute.name,
                    tier = attribute.tier.label(),
                    text_source = breakdown.text_source.label(),
                    "induction trial sealed an attribute"
                );
                TrialOutcome::Fate { attribute }
            }
            PackageKind::Challenge { ideal, rewards } => {
                let rate = match_rate(&breakdown.merged, ideal);
                let band = band_for_rate(rate);
                let reward = match band {
                    MatchBand::Perfect => rewards.perfect,
                    MatchBand::Good => rewards.good,
                    MatchBand::Normal => rewards.normal,
                };
                info!(
                    user = %context.user_id,
                    package = context.package.key,
                    band = band.label(),
                    rate,
                    "challenge trial graded"
                );
                TrialOutcome::Reward {
                    band,
                    reward,
                    match_rate: rate,
                }
            }
        };

        let flavor = self.write_flavor(&context, &outcome).await;

        let record = TrialRecord {
            user_id: context.user_id.clone(),
            package: context.package.key,
            profile: breakdown.merged,
            outcome: outcome.clone(),
            started_at: context.started_at,
            completed_at: self.clock.now(),
        };
        if let Err(error) = self.store.record(record).await {
            warn!(user = %context.user_id, %error, "completed trial was not recorded");
        }

        Ok(TrialResult {
            package: context.package.key,
            profile: breakdown.merged,
            outcome,
            flavor,
        })
    }

    async fn write_flavor(
        &self,
        context: &CompletionContext,
        outcome: &TrialOutcome,
    ) -> Option<String> {
        let writer = self.flavor.as_ref()?;
        let prompt = match outcome {
            TrialOutcome::Fate { attribute } => format!(
                "In two short sentences, proclaim that a newcomer who passed \"{}\" has awakened \
                 the {} essence ({} rarity). No preamble.",
                context.package.name,
                attribute.name,
                attribute.tier.label()
            ),
            TrialOutcome::Reward { band, reward, .. } => format!(
                "In two short sentences, announce that a player finished \"{}\" with a {} showing \
                 and earned {}. No preamble.",
                context.package.name,
                band.label(),
                reward
            ),
        };
        match writer.evaluate(&prompt).await {
            Ok(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(error) => {
                debug!(%error, "flavor narration skipped");
                None
            }
        }
    }

    /// Drops the player's live session. Rejected while completion is in
    /// flight; that path always removes the session itself.
    pub fn cancel(&self, user_id: &UserId) -> Result<(), TrialError> {
        let mut sessions = self.lock_sessions();
        match sessions.get(user_id) {
            None => Err(TrialError::NoSession),
            Some(session) if session.completing => Err(TrialError::CompletionInProgress),
            Some(_) => {
                sessions.remove(user_id);
                Ok(())
            }
        }
    }

    /// Removes every expired session, returning how many were dropped.
    /// Sessions mid-completion are left alone.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let timeout = self.config.answer_timeout;
        let mut sessions = self.lock_sessions();
        let before = sessions.len();
        sessions.retain(|_, session| session.completing || !session.expired(now, timeout));
        before - sessions.len()
    }

    /// Spawns the periodic sweep. Replaces any earlier sweeper.
    pub fn spawn_sweeper(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        let period = self.config.sweep_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let swept = manager.sweep_expired();
                if swept > 0 {
                    info!(swept, "expired trial sessions removed");
                }
            }
        });
        let mut sweeper = self.sweeper.lock().expect("sweeper mutex poisoned");
        if let Some(previous) = sweeper.replace(handle) {
            previous.abort();
        }
    }

    /// Stops the sweeper and clears every live session. Used at shutdown.
    pub fn dispose(&self) {
        if let Some(handle) = self.sweeper.lock().expect("sweeper mutex poisoned").take() {
            handle.abort();
        }
        self.lock_sessions().clear();
    }

    pub fn active_sessions(&self) -> usize {
        self.lock_sessions().len()
    }

    /// Enabled packages whose trigger conditions admit the given player.
    pub fn available_trials(&self, state: &UserState) -> Vec<Arc<TrialPackage>> {
        self.catalog.available_for(state)
    }

    pub fn catalog(&self) -> &TrialCatalog {
        &self.catalog
    }

    /// Allocation drift against the tier table's targets, for operators.
    pub async fn population_report(&self) -> Result<PopulationReport, TrialError> {
        Ok(self.allocator.population_report().await?)
    }

    fn question_view(&self, session: &Session) -> Result<QuestionView, TrialError> {
        let step = session.step();
        let question = session.package.question(step).ok_or(TrialError::NoSession)?;
        Ok(QuestionView::render(
            question,
            step,
            session.package.questions.len() as u8,
            self.config.answer_timeout,
        ))
    }

    fn remove_session(&self, user_id: &UserId) {
        self.lock_sessions().remove(user_id);
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<UserId, Session>> {
        self.sessions.lock().expect("session mutex poisoned")
    }
}

fn pick_by_trigger_chance(
    candidates: &[Arc<TrialPackage>],
    random: &dyn RandomSource,
) -> Option<Arc<TrialPackage>> {
    if candidates.is_empty() {
        return None;
    }
    let total: f64 = candidates.iter().map(|p| p.trigger_chance).sum();
    if total <= 0.0 {
        return None;
    }
    let roll = random.next_unit() * total;
    let mut cumulative = 0.0;
    for package in candidates {
        cumulative += package.trigger_chance;
        if roll < cumulative {
            return Some(Arc::clone(package));
        }
    }
    candidates.last().map(Arc::clone)
}
