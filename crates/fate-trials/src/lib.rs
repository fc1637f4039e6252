//! Trial session and fate allocation engine.
//!
//! Players complete themed three-question trials; answers are scored into a
//! nine-dimension personality profile which either seals a rarity-tiered
//! fate attribute (the induction rite) or grades the player against a
//! package ideal (challenge trials). See [`trials`] for the engine itself;
//! [`config`], [`telemetry`], and [`error`] carry the service plumbing.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod trials;
