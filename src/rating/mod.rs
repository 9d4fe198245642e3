//! Scoring and ranking of normalized forecast records.
//!
//! The rate stage reduces each city's persisted per-day metrics into a
//! single favorability score; the rank stage orders cities by score,
//! resolves ties, and builds the final report rows.

pub mod rank;
pub mod rate;
pub mod types;
pub mod utility;
