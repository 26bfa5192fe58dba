//! Spreadsheet (`.xlsx`) decoding.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, ExcelDateTime, Reader, Xlsx};
use chrono::NaiveTime;

use crate::error::{ExtractError, ExtractResult};
use crate::types::{Row, Table, TableBuilder};

/// Sheet read from `.xlsx` archive entries and uploads unless configured otherwise.
pub const DEFAULT_SHEET: &str = "Sheet1";

/// Decode the sheet named `sheet_name` from an in-memory `.xlsx` workbook.
///
/// Behavior:
/// - The sheet is located by exact (case-sensitive) name.
/// - Rows are anchored at cell `A1`: empty rows and columns before the first used cell are kept
///   as empty rows/cells, so row and column positions match what a spreadsheet UI shows.
/// - Trailing empty cells of each row are dropped, so rows may be ragged.
/// - Every cell is rendered as a string (see [`cell_to_string`]).
pub fn decode_spreadsheet(bytes: &[u8], sheet_name: &str) -> ExtractResult<Table> {
    decode_spreadsheet_from_reader(Cursor::new(bytes), sheet_name)
}

/// Like [`decode_spreadsheet`], reading the workbook from a local file.
pub fn decode_spreadsheet_from_path(
    path: impl AsRef<Path>,
    sheet_name: &str,
) -> ExtractResult<Table> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ExtractError::local_file("decode_spreadsheet_from_path:001", path, e))?;
    decode_spreadsheet_from_reader(BufReader::new(file), sheet_name)
}

/// Like [`decode_spreadsheet`], reading the workbook from any seekable reader.
pub fn decode_spreadsheet_from_reader<RS: Read + Seek>(
    reader: RS,
    sheet_name: &str,
) -> ExtractResult<Table> {
    let workbook = Xlsx::new(reader).map_err(|source| ExtractError::OpenSpreadsheet {
        stage: "decode_spreadsheet:001",
        source,
    })?;
    read_sheet(workbook, sheet_name)
}

fn read_sheet<RS: Read + Seek>(mut workbook: Xlsx<RS>, sheet_name: &str) -> ExtractResult<Table> {
    let sheets = workbook.sheet_names();
    if !sheets.iter().any(|s| s == sheet_name) {
        return Err(ExtractError::SheetNotFound {
            stage: "decode_spreadsheet:002",
            sheet: sheet_name.to_string(),
            available: sheets,
        });
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|source| ExtractError::OpenSpreadsheet {
            stage: "decode_spreadsheet:003",
            source,
        })?;

    let table = range_to_table(&range);
    tracing::debug!(sheet = sheet_name, rows = table.row_count(), "decoded spreadsheet");
    Ok(table)
}

fn range_to_table(range: &calamine::Range<Data>) -> Table {
    // An empty sheet has no start position.
    let Some((start_row, start_col)) = range.start() else {
        return Table::default();
    };

    let mut table = TableBuilder::with_capacity(start_row as usize + range.height());
    for _ in 0..start_row {
        table.push_row(Vec::new());
    }

    for cells in range.rows() {
        let mut row: Row = Vec::with_capacity(start_col as usize + cells.len());
        row.resize(start_col as usize, String::new());
        row.extend(cells.iter().map(cell_to_string));
        while row.last().is_some_and(|c| c.is_empty()) {
            row.pop();
        }
        table.push_row(row);
    }
    table.build()
}

/// Render a cell the way it reads in the sheet.
///
/// Whole floats lose their fractional part (`3.0` → `"3"`), booleans become `"true"`/`"false"`,
/// and empty cells become `""`. Date cells render as `YYYY-MM-DD`, with ` HH:MM:SS` appended
/// when the time of day is not midnight; durations keep their serial value.
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(d) => datetime_to_string(d),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}

fn datetime_to_string(d: &ExcelDateTime) -> String {
    let parsed = if d.is_duration() { None } else { d.as_datetime() };
    match parsed {
        Some(dt) if dt.time() == NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => d.to_string(),
    }
}
