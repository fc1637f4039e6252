//! The trial engine: catalog, sessions, scoring, matching, and allocation.

pub mod allocation;
pub mod catalog;
pub mod matching;
pub mod profile;
pub mod scoring;
pub mod session;
pub mod store;
