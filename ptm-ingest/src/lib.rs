//! ptm-ingest library interface
//!
//! - `normalizer`: canonical values from noisy import fields
//! - `reconciler`: free-text names to identifiers across systems
//! - `import`: batch drivers over delimited files

pub mod import;
pub mod normalizer;
pub mod reconciler;

pub use normalizer::{
    clean_client_name, clean_price, clean_price_str, normalize_technician_name,
    parse_flexible_date, parse_flexible_naive_date, RawValue,
};
pub use reconciler::{
    find_best_match, find_exact_match, CandidatePool, MatchResult, MatchTier, Reconciler,
    MATCH_THRESHOLD,
};
