//! Format classification and single-source dispatch.
//!
//! [`SourceFormat::from_name`] decides how a named byte stream is decoded; [`read_from_bytes`]
//! and [`read_from_path`] apply that decision. Archives and uploads build on these.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ExtractError, ExtractResult};
use crate::types::Table;

use super::delimited::{self, COMMA, PIPE};
use super::excel::{self, DEFAULT_SHEET};
use super::observability::{ExtractContext, ExtractObserver, ExtractSeverity, ExtractStats};

/// Decodable single-table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Comma-separated values (`.csv`).
    Csv,
    /// Pipe-separated values (`.txt`).
    Text,
    /// Office Open XML workbook (`.xlsx`).
    Spreadsheet,
}

impl SourceFormat {
    /// Classify by extension. Matching is exact and case-sensitive: `csv`, `txt` and `xlsx`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "csv" => Some(Self::Csv),
            "txt" => Some(Self::Text),
            "xlsx" => Some(Self::Spreadsheet),
            _ => None,
        }
    }

    /// Classify a file or archive entry name by the text after the last `.` of its final
    /// `/`-separated component.
    ///
    /// `"reports/q1.csv"` and `"reports/.csv"` are [`SourceFormat::Csv`]; `"q1.CSV"`,
    /// `"q1.csv.bak"`, `"q1"` and `"q1.csv/"` are unrecognized.
    pub fn from_name(name: &str) -> Option<Self> {
        let base = name.rsplit('/').next()?;
        let (_, ext) = base.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// Field separator for delimited formats.
    pub fn delimiter(self) -> Option<u8> {
        match self {
            Self::Csv => Some(COMMA),
            Self::Text => Some(PIPE),
            Self::Spreadsheet => None,
        }
    }
}

/// What to do when one entry of an archive fails to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryErrorPolicy {
    /// Abort the whole archive read with [`ExtractError::Entry`] (default).
    #[default]
    FailFast,
    /// Record the failure and keep reading the remaining entries.
    Collect,
}

/// Options shared by the file, archive, upload and fetch readers.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ExtractOptions {
    /// Worksheet read from `.xlsx` sources.
    pub sheet_name: String,
    /// Directory for scratch files (uploaded workbooks, downloaded archives).
    pub scratch_dir: PathBuf,
    /// Archive entry failure handling.
    pub entry_errors: EntryErrorPolicy,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn ExtractObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: ExtractSeverity,
}

impl fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("sheet_name", &self.sheet_name)
            .field("scratch_dir", &self.scratch_dir)
            .field("entry_errors", &self.entry_errors)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            sheet_name: DEFAULT_SHEET.to_string(),
            scratch_dir: std::env::temp_dir(),
            entry_errors: EntryErrorPolicy::default(),
            observer: None,
            alert_at_or_above: ExtractSeverity::Critical,
        }
    }
}

impl ExtractOptions {
    pub(crate) fn report(&self, ctx: &ExtractContext, result: &ExtractResult<Table>) {
        self.report_with(
            ctx,
            result.as_ref().map(Table::row_count),
            ExtractSeverity::for_error,
        );
    }

    pub(crate) fn report_entry(&self, ctx: &ExtractContext, result: &ExtractResult<Table>) {
        let policy = self.entry_errors;
        self.report_with(ctx, result.as_ref().map(Table::row_count), |e| {
            ExtractSeverity::for_entry(e, policy)
        });
    }

    /// Send one outcome to the observer, if any, alerting when the failure's severity reaches
    /// `alert_at_or_above`.
    pub(crate) fn report_with(
        &self,
        ctx: &ExtractContext,
        outcome: Result<usize, &ExtractError>,
        severity: impl FnOnce(&ExtractError) -> ExtractSeverity,
    ) {
        let Some(observer) = &self.observer else {
            return;
        };
        match outcome {
            Ok(rows) => observer.on_success(ctx, ExtractStats { rows }),
            Err(e) => {
                let severity = severity(e);
                observer.on_failure(ctx, severity, e);
                if severity >= self.alert_at_or_above {
                    observer.on_alert(ctx, severity, e);
                }
            }
        }
    }
}

/// Decode an in-memory source in the given format.
pub fn read_from_bytes(
    bytes: &[u8],
    format: SourceFormat,
    options: &ExtractOptions,
) -> ExtractResult<Table> {
    match format.delimiter() {
        Some(d) => delimited::decode_delimited(bytes, d),
        None => excel::decode_spreadsheet(bytes, &options.sheet_name),
    }
}

/// Read a local `.csv`, `.txt` or `.xlsx` file, choosing the decoder by extension.
///
/// When an observer is configured the outcome is reported to it.
///
/// ```no_run
/// use rust_table_extract::ingestion::{read_from_path, ExtractOptions};
///
/// # fn main() -> Result<(), rust_table_extract::ExtractError> {
/// let opts = ExtractOptions {
///     sheet_name: "Positions".to_string(),
///     ..Default::default()
/// };
/// let table = read_from_path("positions.xlsx", &opts)?;
/// println!("rows={}", table.row_count());
/// # Ok(())
/// # }
/// ```
#[tracing::instrument(level = "debug", skip(path, options), fields(path = %path.as_ref().display()))]
pub fn read_from_path(path: impl AsRef<Path>, options: &ExtractOptions) -> ExtractResult<Table> {
    let path = path.as_ref();
    let format = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(SourceFormat::from_name);

    let ctx = ExtractContext {
        source: path.display().to_string(),
        format,
    };

    let result = match format {
        Some(SourceFormat::Spreadsheet) => File::open(path)
            .map_err(|e| ExtractError::local_file("read_from_path:003", path, e))
            .and_then(|file| {
                excel::decode_spreadsheet_from_reader(BufReader::new(file), &options.sheet_name)
            }),
        Some(fmt) => std::fs::read(path)
            .map_err(|e| ExtractError::local_file("read_from_path:002", path, e))
            .and_then(|bytes| read_from_bytes(&bytes, fmt, options)),
        None => Err(ExtractError::local_file(
            "read_from_path:001",
            path,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "unrecognized extension (expected .csv, .txt or .xlsx)",
            ),
        )),
    };

    options.report(&ctx, &result);
    result
}
