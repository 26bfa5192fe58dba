//! Readers for files uploaded through a multipart form.
//!
//! The HTTP layer parses the request body and hands over an [`UploadForm`]; the readers here look
//! up a field by name and decode the file it carries.

use std::collections::HashMap;

use crate::error::{ExtractError, ExtractResult};
use crate::types::Table;

use super::delimited::{self, COMMA, PIPE};
use super::excel;
use super::observability::ExtractContext;
use super::scratch::ScratchFile;
use super::unified::{ExtractOptions, SourceFormat};

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// File name as sent by the client. Untrusted.
    pub filename: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// File fields of a parsed multipart form, keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the file sent under `field`.
    pub fn insert(&mut self, field: impl Into<String>, file: UploadedFile) -> &mut Self {
        self.files.insert(field.into(), file);
        self
    }

    pub fn with_file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.insert(field, file);
        self
    }

    /// The file sent under `field`.
    pub fn file(&self, field: &str) -> ExtractResult<&UploadedFile> {
        self.files
            .get(field)
            .ok_or_else(|| ExtractError::FormFieldMissing {
                stage: "upload_file:001",
                field: field.to_string(),
            })
    }
}

/// Decode the comma-separated file uploaded under `field`.
pub fn read_csv_upload(
    form: &UploadForm,
    field: &str,
    options: &ExtractOptions,
) -> ExtractResult<Table> {
    read_delimited_upload(form, field, COMMA, SourceFormat::Csv, options)
}

/// Decode the pipe-separated file uploaded under `field`.
pub fn read_text_upload(
    form: &UploadForm,
    field: &str,
    options: &ExtractOptions,
) -> ExtractResult<Table> {
    read_delimited_upload(form, field, PIPE, SourceFormat::Text, options)
}

fn read_delimited_upload(
    form: &UploadForm,
    field: &str,
    delimiter: u8,
    format: SourceFormat,
    options: &ExtractOptions,
) -> ExtractResult<Table> {
    let file = form.file(field)?;
    let ctx = ExtractContext {
        source: file.filename.clone(),
        format: Some(format),
    };
    let result = delimited::decode_delimited(&file.bytes, delimiter);
    options.report(&ctx, &result);
    result
}

/// Decode [`ExtractOptions::sheet_name`] from the workbook uploaded under `field`.
///
/// The upload is written to a scratch file in [`ExtractOptions::scratch_dir`], named after the
/// client's file name (directories stripped), and read back from disk. The scratch file is
/// removed before returning, whether decoding succeeded or not.
#[tracing::instrument(level = "debug", skip(form, options))]
pub fn read_xlsx_upload(
    form: &UploadForm,
    field: &str,
    options: &ExtractOptions,
) -> ExtractResult<Table> {
    let file = form.file(field)?;
    let ctx = ExtractContext {
        source: file.filename.clone(),
        format: Some(SourceFormat::Spreadsheet),
    };

    let result = spool_and_decode(file, options);
    options.report(&ctx, &result);
    result
}

fn spool_and_decode(file: &UploadedFile, options: &ExtractOptions) -> ExtractResult<Table> {
    let scratch = ScratchFile::write(&options.scratch_dir, &file.filename, &file.bytes)?;
    let decoded = excel::decode_spreadsheet_from_path(scratch.path(), &options.sheet_name);
    let closed = scratch.close();

    // A decode failure takes precedence over a cleanup failure.
    let table = decoded?;
    closed?;
    Ok(table)
}
