//! Pure scoring functions.
//!
//! Nothing in here touches I/O or the clock; callers pass `now` in.

pub mod baseline;
pub mod composite;
pub mod ordering;
pub mod surge;

pub use baseline::CategoryBaselines;
pub use composite::{ScoringEngine, SubScores, comment_score, like_score, velocity_score, view_score};
pub use ordering::{compare_ranked, rank_stable};
pub use surge::{SurgeBreakdown, SurgeInput, candidate_rate, freshness, is_surge_candidate, rank_by_surge};
