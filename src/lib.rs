//! `rust-table-extract` turns uploaded or downloaded files into plain string tables and cuts
//! marker-delimited sections out of them.
//!
//! Every reader produces a [`types::Table`]: rows of string cells in source order. Rows may be
//! ragged. There is no schema and no typing; cell text is returned as written (spreadsheet cells
//! as displayed).
//!
//! ## What you can read
//!
//! - **CSV** (`.csv`): comma-separated, RFC 4180 quoting
//! - **Pipe-delimited text** (`.txt`): same quoting rules, `|` as separator
//! - **Spreadsheets** (`.xlsx`): one worksheet, selected by exact name (default `Sheet1`)
//! - **ZIP archives**: every `.csv`, `.txt` and `.xlsx` entry, one table per entry
//!
//! Sources can come from memory ([`ingestion::read_from_bytes`]), local disk
//! ([`ingestion::read_from_path`], [`ingestion::read_archive_from_path`]), a multipart upload
//! ([`ingestion::upload`]) or an HTTP GET ([`remote::Fetcher`]).
//!
//! ## Quick example: read an archive and pull out a section
//!
//! ```no_run
//! use rust_table_extract::ingestion::ExtractOptions;
//! use rust_table_extract::processing::filter_first_block;
//! use rust_table_extract::remote::{FetchConfig, Fetcher};
//!
//! # fn main() -> Result<(), rust_table_extract::ExtractError> {
//! let fetcher = Fetcher::new(FetchConfig::default())?;
//! let contents = fetcher.fetch_archive(
//!     "https://example.com/reports/daily.zip",
//!     "daily.zip",
//!     &ExtractOptions::default(),
//! )?;
//!
//! for (entry, table) in &contents.tables {
//!     let summary = filter_first_block("summary", table);
//!     println!("{entry}: {} summary rows", summary.row_count());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: format readers, archive reader, upload readers, shared options
//! - [`remote`]: HTTP download with an explicit client configuration
//! - [`processing`]: table concatenation and block filtering
//! - [`types`]: the table data model
//! - [`error`]: the error type shared by every operation
//!
//! ## Logging
//!
//! Readers emit `tracing` spans and events; install any `tracing` subscriber to see them.
//! Per-source outcomes can additionally be routed to an [`ingestion::ExtractObserver`] via
//! [`ingestion::ExtractOptions::observer`].

pub mod error;
pub mod ingestion;
pub mod processing;
pub mod remote;
pub mod types;

pub use error::{ErrorKind, ExtractError, ExtractResult};
pub use types::{Row, Table, TableBuilder};
