//! Two-tier identity matching against a candidate pool
//!
//! Tier 1 is an exact, case-insensitive comparison of the whole name. Tier 2
//! scores every candidate with the gestalt similarity ratio and keeps the best
//! one at or above the threshold. Callers go through [`Reconciler::resolve`]
//! so an exact hit is never displaced by a near-tie from the fuzzy tier.

use crate::reconciler::similarity::SequenceMatcher;
use ptm_common::config::MatchingConfig;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Minimum similarity ratio for a fuzzy match
pub const MATCH_THRESHOLD: f64 = 0.6;

/// Reconciler construction errors
#[derive(Debug, Error, PartialEq)]
pub enum ReconcilerError {
    #[error("Similarity threshold must be within 0.0-1.0, got {0}")]
    InvalidThreshold(f64),
}

// ============================================================================
// Candidate pool
// ============================================================================

/// One entry of a candidate pool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: String,
    /// Display name; candidates without one are never matched
    pub name: Option<String>,
}

/// Ordered `(id, name)` entries to search
///
/// Order matters: on equal scores the earlier candidate wins.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: impl Into<String>, name: Option<String>) {
        self.candidates.push(Candidate {
            id: id.into(),
            name,
        });
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    /// Candidates that actually carry a name
    fn named(&self) -> impl Iterator<Item = (&Candidate, &str)> {
        self.candidates.iter().filter_map(|c| match c.name.as_deref() {
            Some(name) if !name.is_empty() => Some((c, name)),
            _ => None,
        })
    }
}

impl FromIterator<Candidate> for CandidatePool {
    fn from_iter<T: IntoIterator<Item = Candidate>>(iter: T) -> Self {
        Self {
            candidates: iter.into_iter().collect(),
        }
    }
}

impl<I: Into<String>, N: Into<String>> FromIterator<(I, N)> for CandidatePool {
    fn from_iter<T: IntoIterator<Item = (I, N)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(id, name)| Candidate {
                id: id.into(),
                name: Some(name.into()),
            })
            .collect()
    }
}

// ============================================================================
// Match result
// ============================================================================

/// Which tier produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Fuzzy,
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

/// Best candidate for a target name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub id: String,
    /// Candidate name as stored in the pool
    pub name: String,
    /// Similarity ratio in `[0.0, 1.0]`; always `1.0` for exact matches
    pub score: f64,
    pub tier: MatchTier,
}

// ============================================================================
// Matching
// ============================================================================

/// Exact tier: trimmed, case-insensitive whole-name equality
///
/// The first equal candidate wins. An empty target never matches.
pub fn find_exact_match(target_name: &str, candidates: &CandidatePool) -> Option<MatchResult> {
    let target = target_name.trim().to_lowercase();
    if target.is_empty() {
        return None;
    }

    candidates
        .named()
        .find(|(_, name)| name.trim().to_lowercase() == target)
        .map(|(candidate, name)| MatchResult {
            id: candidate.id.clone(),
            name: name.to_string(),
            score: 1.0,
            tier: MatchTier::Exact,
        })
}

/// Fuzzy tier with the default threshold
pub fn find_best_match(target_name: &str, candidates: &CandidatePool) -> Option<MatchResult> {
    find_best_match_with_threshold(target_name, candidates, MATCH_THRESHOLD)
}

/// Fuzzy tier: highest similarity ratio at or above `threshold`
///
/// A candidate replaces the current best only with a strictly greater score,
/// so ties go to the earlier candidate.
pub fn find_best_match_with_threshold(
    target_name: &str,
    candidates: &CandidatePool,
    threshold: f64,
) -> Option<MatchResult> {
    let target = target_name.trim();
    if target.is_empty() {
        return None;
    }
    let target = target.to_lowercase();

    let mut best: Option<(&Candidate, &str)> = None;
    let mut best_score = 0.0;

    for (candidate, name) in candidates.named() {
        let matcher = SequenceMatcher::new(&target, &name.to_lowercase());

        // Upper bounds first: skip what can neither reach the threshold
        // nor beat the current best.
        let cannot_win = |bound: f64| bound < threshold || bound <= best_score;
        if cannot_win(matcher.real_quick_ratio()) || cannot_win(matcher.quick_ratio()) {
            continue;
        }

        let score = matcher.ratio();
        if score > best_score && score >= threshold {
            best_score = score;
            best = Some((candidate, name));
        }
    }

    best.map(|(candidate, name)| MatchResult {
        id: candidate.id.clone(),
        name: name.to_string(),
        score: best_score,
        tier: MatchTier::Fuzzy,
    })
}

/// Identity reconciler with a configurable fuzzy threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciler {
    threshold: f64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self {
            threshold: MATCH_THRESHOLD,
        }
    }
}

impl Reconciler {
    pub fn new(threshold: f64) -> Result<Self, ReconcilerError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ReconcilerError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn from_config(config: &MatchingConfig) -> Result<Self, ReconcilerError> {
        Self::new(config.threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn find_exact_match(
        &self,
        target_name: &str,
        candidates: &CandidatePool,
    ) -> Option<MatchResult> {
        find_exact_match(target_name, candidates)
    }

    pub fn find_best_match(
        &self,
        target_name: &str,
        candidates: &CandidatePool,
    ) -> Option<MatchResult> {
        find_best_match_with_threshold(target_name, candidates, self.threshold)
    }

    /// Exact tier first, fuzzy tier only when no exact match exists
    pub fn resolve(&self, target_name: &str, candidates: &CandidatePool) -> Option<MatchResult> {
        let result = self
            .find_exact_match(target_name, candidates)
            .or_else(|| self.find_best_match(target_name, candidates));

        match &result {
            Some(m) => debug!(
                target = %target_name,
                id = %m.id,
                name = %m.name,
                score = m.score,
                tier = %m.tier,
                "Resolved identity"
            ),
            None => debug!(
                target = %target_name,
                pool_size = candidates.len(),
                threshold = self.threshold,
                "No candidate reached the threshold"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> CandidatePool {
        [("c1", "Société ABC Inc"), ("c2", "Entreprise XYZ")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_empty_target_rejected() {
        let pool: CandidatePool = [("a", "Foo")].into_iter().collect();
        assert!(find_best_match("", &pool).is_none());
        assert!(find_best_match("   ", &pool).is_none());
        assert!(find_exact_match("", &pool).is_none());
    }

    #[test]
    fn test_fuzzy_finds_punctuation_variant() {
        let m = find_best_match("société abc inc.", &pool()).unwrap();
        assert_eq!(m.id, "c1");
        assert_eq!(m.name, "Société ABC Inc");
        assert_eq!(m.tier, MatchTier::Fuzzy);
        assert!(m.score >= MATCH_THRESHOLD);
    }

    #[test]
    fn test_case_only_difference_scores_one() {
        let pool: CandidatePool = [("first", "Marie Tremblay"), ("second", "MARIE TREMBLAY")]
            .into_iter()
            .collect();
        let m = find_best_match("marie tremblay", &pool).unwrap();
        assert_eq!(m.score, 1.0);
        assert_eq!(m.id, "first");
    }

    #[test]
    fn test_perfect_score_beats_near_tie() {
        let pool: CandidatePool = [("near", "Marie Tremblay."), ("same", "marie tremblay")]
            .into_iter()
            .collect();
        let m = find_best_match("Marie Tremblay", &pool).unwrap();
        assert_eq!(m.id, "same");
        assert_eq!(m.score, 1.0);
    }

    #[test]
    fn test_first_candidate_wins_ties() {
        let pool: CandidatePool = [("first", "Jean Roy"), ("second", "Jean Roy")]
            .into_iter()
            .collect();
        assert_eq!(find_best_match("jean roi", &pool).unwrap().id, "first");
    }

    #[test]
    fn test_below_threshold_is_no_match() {
        let pool: CandidatePool = [("a", "Orchestre Métropolitain")].into_iter().collect();
        assert!(find_best_match("Jean Roy", &pool).is_none());
    }

    #[test]
    fn test_nameless_candidates_skipped() {
        let mut pool = CandidatePool::new();
        pool.push("blank", Some(String::new()));
        pool.push("none", None);
        pool.push("named", Some("Luc Gagnon".to_string()));
        assert_eq!(find_best_match("luc gagnon", &pool).unwrap().id, "named");
        assert_eq!(find_exact_match("LUC GAGNON", &pool).unwrap().id, "named");
    }

    #[test]
    fn test_exact_tier_ignores_case_and_outer_whitespace() {
        let m = find_exact_match("  entreprise xyz ", &pool()).unwrap();
        assert_eq!(m.id, "c2");
        assert_eq!(m.score, 1.0);
        assert_eq!(m.tier, MatchTier::Exact);
        assert!(find_exact_match("entreprise xy", &pool()).is_none());
    }

    #[test]
    fn test_resolve_prefers_exact_tier() {
        // Padded name: exact after trimming, but scores below its neighbour
        let pool: CandidatePool = [("plural", "Salle Bourgies"), ("padded", " Salle Bourgie ")]
            .into_iter()
            .collect();
        let reconciler = Reconciler::default();
        assert_eq!(reconciler.find_best_match("Salle Bourgie", &pool).unwrap().id, "plural");

        let m = reconciler.resolve("Salle Bourgie", &pool).unwrap();
        assert_eq!(m.id, "padded");
        assert_eq!(m.tier, MatchTier::Exact);

        let m = reconciler.resolve("salle bourgie!", &pool).unwrap();
        assert_eq!(m.tier, MatchTier::Fuzzy);
    }

    #[test]
    fn test_custom_threshold() {
        let strict = Reconciler::new(0.99).unwrap();
        assert!(strict.find_best_match("société abc inc.", &pool()).is_none());
        assert_eq!(strict.threshold(), 0.99);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        assert_eq!(Reconciler::new(1.5), Err(ReconcilerError::InvalidThreshold(1.5)));
        assert!(Reconciler::new(-0.1).is_err());
        assert!(Reconciler::new(f64::NAN).is_err());
    }
}
