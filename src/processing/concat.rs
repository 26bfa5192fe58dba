//! Table concatenation.

use crate::types::{Table, TableBuilder};

/// Returns a new [`Table`] holding every row of `a` followed by every row of `b`.
///
/// Rows are copied as-is: no deduplication and no column alignment, so ragged inputs stay
/// ragged. Neither input is modified.
pub fn concat(a: &Table, b: &Table) -> Table {
    let mut out = TableBuilder::with_capacity(a.row_count() + b.row_count());
    out.extend_from_slice(a.rows()).extend_from_slice(b.rows());
    out.build()
}
