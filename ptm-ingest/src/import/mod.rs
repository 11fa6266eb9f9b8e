//! Batch import of legacy export files
//!
//! Caller layer around the normalizer and reconciler: reads delimited files,
//! runs every row through the pure functions, and tallies what could not be
//! normalized so an operator can review it. Unusable values are counted and
//! logged, never fatal; only I/O and malformed files return errors.

pub mod join;
pub mod reconcile;
pub mod records;

pub use join::{join_by_row_index, join_csv, JoinSummary, RowJoin};
pub use reconcile::{
    load_candidate_pool, load_column, reconcile_names, resolve_technician, ReconciliationOutcome,
};
pub use records::{
    normalize_csv, normalize_record, write_import_report, write_normalized_csv, Field, ImportBatch,
    ImportOptions, ImportReport, NormalizedRecord,
};

use ptm_common::{Error, Result};

/// Position of a named column in a header row
pub(crate) fn column_index(headers: &csv::StringRecord, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| Error::InvalidInput(format!("missing column '{}'", column)))
}
