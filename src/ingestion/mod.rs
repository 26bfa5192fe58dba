//! Source readers: byte streams in, [`crate::types::Table`]s out.
//!
//! - [`delimited`]: comma- and pipe-separated text
//! - [`excel`]: one named worksheet of an `.xlsx` workbook
//! - [`archive`]: every recognized entry of a ZIP archive
//! - [`upload`]: files carried by a parsed multipart form
//! - [`unified`]: format classification, shared options and path-based dispatch
//!
//! Outcomes can be reported to an [`ExtractObserver`] configured on [`ExtractOptions`].

pub mod archive;
pub mod delimited;
pub mod excel;
pub mod observability;
pub mod scratch;
pub mod unified;
pub mod upload;

pub use archive::{read_archive, read_archive_from_path, read_archive_from_reader, ArchiveContents};
pub use delimited::{decode_csv, decode_delimited, decode_pipe_text, encode_delimited};
pub use excel::{decode_spreadsheet, DEFAULT_SHEET};
pub use observability::{
    CompositeObserver, ExtractContext, ExtractObserver, ExtractSeverity, ExtractStats, TracingObserver,
};
pub use scratch::ScratchFile;
pub use unified::{read_from_bytes, read_from_path, EntryErrorPolicy, ExtractOptions, SourceFormat};
pub use upload::{read_csv_upload, read_text_upload, read_xlsx_upload, UploadForm, UploadedFile};
