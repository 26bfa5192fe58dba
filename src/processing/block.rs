//! Marker-delimited block extraction.
//!
//! A *block* is a run of consecutive rows whose first cell is non-empty. Blocks are located by a
//! *marker*: a case-insensitive substring of a row's first cell.
//!
//! The two operations locate blocks differently:
//!
//! - [`filter_first_block`] uses the **last** matching row, includes it in the block, and falls
//!   back to row 0 when nothing matches.
//! - [`filter_all_blocks`] uses **every** matching row, excludes the matching rows themselves,
//!   and returns nothing when nothing matches.

use crate::types::{Row, Table, TableBuilder};

/// Return the block that starts at the last row whose first cell contains `marker`.
///
/// The matching row is part of the result. When no row matches, the block starts at row 0.
/// The block ends before the first row whose first cell is `""` or that has no cells at all.
///
/// ```rust
/// use rust_table_extract::processing::filter_first_block;
/// use rust_table_extract::types::Table;
///
/// let t: Table = [["X", "1"], ["HEADER", "2"], ["a", "3"], ["", "4"], ["b", "5"]]
///     .iter()
///     .map(|r| r.iter().map(|c| c.to_string()).collect::<Vec<_>>())
///     .collect();
/// let block = filter_first_block("header", &t);
/// assert_eq!(block.row_count(), 2);
/// assert_eq!(block.leading_cell(1), Some("a"));
/// ```
pub fn filter_first_block(marker: &str, table: &Table) -> Table {
    let needle = marker.to_lowercase();
    let rows = table.rows();

    let start = rows
        .iter()
        .rposition(|row| leading_cell_contains(row, &needle))
        .unwrap_or(0);

    let mut out = TableBuilder::new();
    copy_block(rows, start, &mut out);
    tracing::debug!(marker, start, rows = out.len(), "filtered first block");
    out.build()
}

/// Return the blocks that follow every row whose first cell contains `marker`, flattened into
/// one table in scan order.
///
/// Matching rows are not part of the result. Each block ends before the first row whose first
/// cell is `""` or that has no cells at all.
pub fn filter_all_blocks(marker: &str, table: &Table) -> Table {
    let needle = marker.to_lowercase();
    let rows = table.rows();

    let mut out = TableBuilder::new();
    let mut matches = 0usize;
    for (idx, _) in rows
        .iter()
        .enumerate()
        .filter(|(_, row)| leading_cell_contains(row, &needle))
    {
        matches += 1;
        copy_block(rows, idx + 1, &mut out);
    }

    tracing::debug!(marker, matches, rows = out.len(), "filtered all blocks");
    out.build()
}

fn leading_cell_contains(row: &Row, needle_lower: &str) -> bool {
    row.first()
        .is_some_and(|cell| cell.to_lowercase().contains(needle_lower))
}

fn copy_block(rows: &[Row], start: usize, out: &mut TableBuilder) {
    for row in rows.iter().skip(start) {
        match row.first() {
            Some(cell) if !cell.is_empty() => {
                out.push_row(row.clone());
            }
            _ => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> Table {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect::<Vec<_>>())
            .collect()
    }

    fn sample() -> Table {
        table(&[
            &["X", "1"],
            &["HEADER", "2"],
            &["a", "3"],
            &["b", "4"],
            &["", "5"],
            &["c", "6"],
        ])
    }

    #[test]
    fn first_block_includes_match_and_stops_at_gap() {
        let out = filter_first_block("header", &sample());
        assert_eq!(out, table(&[&["HEADER", "2"], &["a", "3"], &["b", "4"]]));
    }

    #[test]
    fn first_block_without_match_starts_at_top() {
        let out = filter_first_block("missing", &sample());
        assert_eq!(
            out,
            table(&[&["X", "1"], &["HEADER", "2"], &["a", "3"], &["b", "4"]])
        );
    }

    #[test]
    fn first_block_uses_last_match() {
        let t = table(&[
            &["Totals 2023"],
            &["x"],
            &[""],
            &["totals 2024"],
            &["y"],
            &["z"],
        ]);
        let out = filter_first_block("TOTALS", &t);
        assert_eq!(out, table(&[&["totals 2024"], &["y"], &["z"]]));
    }

    #[test]
    fn first_block_matches_substring() {
        let t = table(&[&["noise"], &["== Section A =="], &["row"]]);
        let out = filter_first_block("section a", &t);
        assert_eq!(out, table(&[&["== Section A =="], &["row"]]));
    }

    #[test]
    fn empty_row_terminates_block() {
        let t = table(&[&["HEADER"], &["a"], &[], &["b"]]);
        assert_eq!(filter_first_block("header", &t), table(&[&["HEADER"], &["a"]]));
        assert_eq!(filter_all_blocks("header", &t), table(&[&["a"]]));
    }

    #[test]
    fn whitespace_cell_is_not_empty() {
        let t = table(&[&["HEADER"], &[" "], &["a"], &[""], &["b"]]);
        assert_eq!(
            filter_first_block("header", &t),
            table(&[&["HEADER"], &[" "], &["a"]])
        );
    }

    #[test]
    fn all_blocks_exclude_match_rows_and_concatenate_in_order() {
        let t = table(&[
            &["Trades", "qty"],
            &["AAA", "1"],
            &["BBB", "2"],
            &[""],
            &["junk"],
            &["trades", "qty"],
            &["CCC", "3"],
        ]);
        let out = filter_all_blocks("TRADES", &t);
        assert_eq!(out, table(&[&["AAA", "1"], &["BBB", "2"], &["CCC", "3"]]));
    }

    #[test]
    fn adjacent_matches_overlap() {
        // The second marker row is also part of the first marker's block.
        let t = table(&[&["hdr"], &["hdr"], &["a"], &[""]]);
        let out = filter_all_blocks("hdr", &t);
        assert_eq!(out, table(&[&["hdr"], &["a"], &["a"]]));
    }

    #[test]
    fn all_blocks_without_match_is_empty() {
        assert!(filter_all_blocks("missing", &sample()).is_empty());
    }

    #[test]
    fn match_on_last_row_yields_empty_block() {
        let t = table(&[&["a"], &["", "x"], &["HEADER"]]);
        assert!(filter_all_blocks("header", &t).is_empty());
        assert_eq!(filter_first_block("header", &t), table(&[&["HEADER"]]));
    }

    #[test]
    fn empty_table() {
        let t = Table::default();
        assert!(filter_first_block("x", &t).is_empty());
        assert!(filter_all_blocks("x", &t).is_empty());
    }

    #[test]
    fn input_is_unchanged() {
        let t = sample();
        let before = t.clone();
        let _ = filter_first_block("header", &t);
        let _ = filter_all_blocks("header", &t);
        assert_eq!(t, before);
    }
}
