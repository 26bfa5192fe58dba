//! Core data model.
//!
//! Every reader produces a [`Table`]: an ordered list of [`Row`]s, each an ordered list of string
//! cells. Rows may have different lengths, and row order is always the physical order of the
//! source.

use serde::{Deserialize, Serialize};

/// A single row of string cells.
pub type Row = Vec<String>;

/// In-memory, possibly ragged, string table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// Create a table from rows.
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Number of rows in the table.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrow the rows in source order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// First cell of row `idx`, or `None` for a missing row or a row with zero cells.
    pub fn leading_cell(&self, idx: usize) -> Option<&str> {
        self.rows.get(idx).and_then(|r| r.first()).map(String::as_str)
    }
}

impl From<Vec<Row>> for Table {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<Row> for Table {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Table {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Accumulates rows and hands out a finished [`Table`].
///
/// Readers push rows as they decode them; once [`TableBuilder::build`] is called the table is
/// never touched again.
#[derive(Debug, Default)]
pub struct TableBuilder {
    rows: Vec<Row>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(rows: usize) -> Self {
        Self {
            rows: Vec::with_capacity(rows),
        }
    }

    /// Append a row.
    pub fn push_row(&mut self, row: Row) -> &mut Self {
        self.rows.push(row);
        self
    }

    /// Append cloned rows, in order.
    pub fn extend_from_slice(&mut self, rows: &[Row]) -> &mut Self {
        self.rows.extend_from_slice(rows);
        self
    }

    /// Number of rows accumulated so far.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn build(self) -> Table {
        Table::new(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_cell_handles_ragged_rows() {
        let t = Table::new(vec![
            vec!["a".to_string(), "b".to_string()],
            vec![],
            vec!["".to_string()],
        ]);
        assert_eq!(t.leading_cell(0), Some("a"));
        assert_eq!(t.leading_cell(1), None);
        assert_eq!(t.leading_cell(2), Some(""));
        assert_eq!(t.leading_cell(3), None);
    }

    #[test]
    fn builder_preserves_push_order() {
        let mut b = TableBuilder::new();
        b.push_row(vec!["2".to_string()]).push_row(vec!["1".to_string()]);
        let t = b.build();
        assert_eq!(t.rows(), &[vec!["2".to_string()], vec!["1".to_string()]]);
    }

    #[test]
    fn serializes_as_nested_arrays() {
        let t = Table::new(vec![vec!["x".to_string(), "".to_string()]]);
        assert_eq!(serde_json::to_string(&t).unwrap(), r#"[["x",""]]"#);
    }
}
