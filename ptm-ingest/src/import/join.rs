//! Positional join of two export files
//!
//! Some legacy exports were produced as separate files describing the same
//! records in the same order, with no shared key. Row `i` of one file belongs
//! with row `i` of the other. Nothing is re-ordered or matched by content.

use ptm_common::Result;
use serde::Serialize;
use std::io::{Read, Write};
use tracing::{info, warn};

/// Result of pairing two row lists by position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowJoin<L, R> {
    pub pairs: Vec<(L, R)>,
    /// Rows past the end of the right-hand list
    pub left_unpaired: Vec<L>,
    /// Rows past the end of the left-hand list
    pub right_unpaired: Vec<R>,
}

impl<L, R> RowJoin<L, R> {
    pub fn is_complete(&self) -> bool {
        self.left_unpaired.is_empty() && self.right_unpaired.is_empty()
    }
}

/// Pair `left[i]` with `right[i]`; leftovers from the longer list are kept
pub fn join_by_row_index<L, R>(left: Vec<L>, right: Vec<R>) -> RowJoin<L, R> {
    let (left_len, right_len) = (left.len(), right.len());
    if left_len != right_len {
        warn!(
            left_rows = left_len,
            right_rows = right_len,
            "Row counts differ; extra rows stay unpaired"
        );
    }

    // Bounded on both sides so zip never pulls and drops an extra element
    let paired = left_len.min(right_len);
    let mut left = left.into_iter();
    let mut right = right.into_iter();
    let pairs: Vec<(L, R)> = left
        .by_ref()
        .take(paired)
        .zip(right.by_ref().take(paired))
        .collect();

    RowJoin {
        pairs,
        left_unpaired: left.collect(),
        right_unpaired: right.collect(),
    }
}

/// Row counts of a file-level positional join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoinSummary {
    pub paired: usize,
    pub left_unpaired: usize,
    pub right_unpaired: usize,
}

/// Join two delimited files by row position into one
///
/// The output header is the left header followed by the right header.
/// Unpaired rows are written with the missing side left blank.
pub fn join_csv<L: Read, R: Read, W: Write>(
    left: L,
    right: R,
    writer: W,
    delimiter: u8,
) -> Result<JoinSummary> {
    let (left_header, left_rows) = read_rows(left, delimiter)?;
    let (right_header, right_rows) = read_rows(right, delimiter)?;
    let join = join_by_row_index(left_rows, right_rows);

    let left_blank = vec![String::new(); left_header.len()];
    let right_blank = vec![String::new(); right_header.len()];

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(writer);
    wtr.write_record(left_header.iter().chain(right_header.iter()))?;
    for (l, r) in &join.pairs {
        wtr.write_record(l.iter().chain(r.iter()))?;
    }
    for l in &join.left_unpaired {
        wtr.write_record(l.iter().chain(right_blank.iter()))?;
    }
    for r in &join.right_unpaired {
        wtr.write_record(left_blank.iter().chain(r.iter()))?;
    }
    wtr.flush()?;

    let summary = JoinSummary {
        paired: join.pairs.len(),
        left_unpaired: join.left_unpaired.len(),
        right_unpaired: join.right_unpaired.len(),
    };
    info!(
        paired = summary.paired,
        left_unpaired = summary.left_unpaired,
        right_unpaired = summary.right_unpaired,
        "Positional join written"
    );
    Ok(summary)
}

fn read_rows<R: Read>(reader: R, delimiter: u8) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);
    let header = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        rows.push(result?.iter().map(str::to_string).collect());
    }
    Ok((header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_lengths_pair_everything() {
        let join = join_by_row_index(vec!["a", "b"], vec![1, 2]);
        assert_eq!(join.pairs, vec![("a", 1), ("b", 2)]);
        assert!(join.is_complete());
    }

    #[test]
    fn test_longer_left_keeps_leftovers() {
        let join = join_by_row_index(vec!["a", "b", "c"], vec![1]);
        assert_eq!(join.pairs, vec![("a", 1)]);
        assert_eq!(join.left_unpaired, vec!["b", "c"]);
        assert!(join.right_unpaired.is_empty());
    }

    #[test]
    fn test_longer_right_keeps_leftovers() {
        let join = join_by_row_index(Vec::<&str>::new(), vec![1, 2]);
        assert!(join.pairs.is_empty());
        assert_eq!(join.right_unpaired, vec![1, 2]);
        assert!(!join.is_complete());
    }

    #[test]
    fn test_join_csv_pads_unpaired_rows() {
        let left = "client\nA\nB\nC\n";
        let right = "montant\n10\n20\n";
        let mut out = Vec::new();
        let summary = join_csv(left.as_bytes(), right.as_bytes(), &mut out, b',').unwrap();

        assert_eq!(
            summary,
            JoinSummary {
                paired: 2,
                left_unpaired: 1,
                right_unpaired: 0
            }
        );
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "client,montant\nA,10\nB,20\nC,\n");
    }
}
