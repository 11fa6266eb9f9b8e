//! Identity reconciliation
//!
//! Maps a free-text name from one system to the identifier of the matching
//! record in another, when the two share no identifier space.

pub mod matcher;
pub mod similarity;

pub use matcher::{
    find_best_match, find_best_match_with_threshold, find_exact_match, Candidate, CandidatePool,
    MatchResult, MatchTier, Reconciler, ReconcilerError, MATCH_THRESHOLD,
};
pub use similarity::{similarity_ratio, SequenceMatcher};
