//! Trial session lifecycle.
//!
//! One live session per player, strict answer validation, abuse screening
//! on free text, and a completion handoff that always removes the session
//! before the outcome leaves the engine. The [`router`] module exposes the
//! lifecycle over HTTP for the host service.

mod clock;
mod domain;
mod manager;
pub mod router;
mod screening;

#[cfg(test)]
mod tests;

pub use clock::{Clock, SystemClock};
pub use domain::{
    AbuseNotice, OptionView, QuestionView, SubmitOutcome, TrialOutcome, TrialResult, TrialStarted,
    UserId,
};
pub use manager::{SessionConfig, TrialError, TrialSessionManager};
pub use router::trial_router;
pub use screening::{
    AbuseScreen, ScreeningConfig, ScreeningReason, ScreeningSeverity, ScreeningVerdict,
};
