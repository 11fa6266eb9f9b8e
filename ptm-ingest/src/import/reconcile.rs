//! Resolving imported names to authoritative identifiers

use crate::import::column_index;
use crate::normalizer::{clean_client_name, normalize_technician_name};
use crate::reconciler::{CandidatePool, MatchResult, Reconciler};
use ptm_common::{Result, Technician, TechnicianRoster};
use serde::Serialize;
use std::io::Read;
use tracing::{info, warn};

/// Outcome of reconciling one target name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationOutcome {
    /// 1-based position in the target list
    pub row: usize,
    pub target: String,
    /// Target after client-name cleanup; this is what was matched
    pub cleaned: Option<String>,
    #[serde(rename = "match")]
    pub result: Option<MatchResult>,
}

/// Build a candidate pool from a delimited file, keeping file order
///
/// Blank names are kept as nameless candidates (never matched).
pub fn load_candidate_pool<R: Read>(
    reader: R,
    id_column: &str,
    name_column: &str,
    delimiter: u8,
) -> Result<CandidatePool> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let id_idx = column_index(&headers, id_column)?;
    let name_idx = column_index(&headers, name_column)?;

    let mut pool = CandidatePool::new();
    for result in rdr.records() {
        let record = result?;
        let Some(id) = record.get(id_idx).map(str::trim).filter(|id| !id.is_empty()) else {
            warn!("Skipping candidate row without an id");
            continue;
        };
        let name = record
            .get(name_idx)
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string);
        pool.push(id, name);
    }

    info!("Loaded {} candidates", pool.len());
    Ok(pool)
}

/// Read one column of a delimited file, in file order
pub fn load_column<R: Read>(reader: R, column: &str, delimiter: u8) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let idx = column_index(&headers, column)?;

    let mut values = Vec::new();
    for result in rdr.records() {
        let record = result?;
        values.push(record.get(idx).unwrap_or_default().to_string());
    }
    Ok(values)
}

/// Resolve each target against the pool: cleanup, then exact, then fuzzy
pub fn reconcile_names<'a, I>(
    targets: I,
    pool: &CandidatePool,
    reconciler: &Reconciler,
) -> Vec<ReconciliationOutcome>
where
    I: IntoIterator<Item = &'a str>,
{
    let outcomes: Vec<ReconciliationOutcome> = targets
        .into_iter()
        .enumerate()
        .map(|(index, target)| {
            let cleaned = clean_client_name(Some(target)).filter(|name| !name.trim().is_empty());
            let result = cleaned
                .as_deref()
                .and_then(|name| reconciler.resolve(name, pool));
            if result.is_none() {
                warn!(row = index + 1, target = %target, "No matching candidate");
            }
            ReconciliationOutcome {
                row: index + 1,
                target: target.to_string(),
                cleaned,
                result,
            }
        })
        .collect();

    let matched = outcomes.iter().filter(|o| o.result.is_some()).count();
    info!(
        targets = outcomes.len(),
        matched,
        unmatched = outcomes.len() - matched,
        "Reconciliation finished"
    );
    outcomes
}

/// Roster entry for a free-text technician token, compared against usernames
pub fn resolve_technician<'r>(roster: &'r TechnicianRoster, token: &str) -> Option<&'r Technician> {
    let normalized = normalize_technician_name(Some(token.trim()))?;
    roster.find_by_username(&normalized)
}
