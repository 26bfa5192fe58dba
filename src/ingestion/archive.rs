//! ZIP archive reader.
//!
//! Every `.csv`, `.txt` and `.xlsx` entry of an archive is decoded into its own [`Table`],
//! keyed by entry name. Any other entry (including directories) is skipped.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{ExtractError, ExtractResult};
use crate::types::Table;

use super::observability::ExtractContext;
use super::unified::{read_from_bytes, EntryErrorPolicy, ExtractOptions, SourceFormat};

/// Decoded contents of an archive.
#[derive(Debug, Default)]
pub struct ArchiveContents {
    /// One table per recognized entry, keyed by the entry's full name.
    pub tables: BTreeMap<String, Table>,
    /// Entries that failed to decode. Only populated under [`EntryErrorPolicy::Collect`].
    pub failures: Vec<(String, ExtractError)>,
    /// Entries skipped because their extension is not recognized.
    pub skipped: Vec<String>,
}

impl ArchiveContents {
    pub fn table(&self, entry: &str) -> Option<&Table> {
        self.tables.get(entry)
    }

    /// Number of entries decoded into tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Read an in-memory ZIP archive.
///
/// Entries are classified with [`SourceFormat::from_name`] (exact, case-sensitive extension
/// match) and decoded as:
///
/// - `.csv` → comma-delimited
/// - `.txt` → pipe-delimited
/// - `.xlsx` → the worksheet named by [`ExtractOptions::sheet_name`]
///
/// An entry fails when its bytes cannot be read back (bad checksum, corrupt compressed data) or
/// when they do not decode. With [`EntryErrorPolicy::FailFast`] the first failing entry aborts
/// the read with [`ExtractError::Entry`]; with [`EntryErrorPolicy::Collect`] failures are
/// recorded in [`ArchiveContents::failures`] and the remaining entries are still read. Only a
/// container that cannot be opened at all fails without an entry name.
pub fn read_archive(bytes: &[u8], options: &ExtractOptions) -> ExtractResult<ArchiveContents> {
    read_archive_from_reader(Cursor::new(bytes), options)
}

/// Like [`read_archive`], reading a ZIP file from local disk.
#[tracing::instrument(level = "info", skip(path, options), fields(path = %path.as_ref().display()))]
pub fn read_archive_from_path(
    path: impl AsRef<Path>,
    options: &ExtractOptions,
) -> ExtractResult<ArchiveContents> {
    let path = path.as_ref();
    let file =
        File::open(path).map_err(|e| ExtractError::local_file("read_archive_from_path:001", path, e))?;
    read_archive_from_reader(file, options)
}

/// Like [`read_archive`], reading from any seekable reader.
pub fn read_archive_from_reader<R: Read + Seek>(
    reader: R,
    options: &ExtractOptions,
) -> ExtractResult<ArchiveContents> {
    let mut archive = ZipArchive::new(reader).map_err(|source| ExtractError::ArchiveOpen {
        stage: "read_archive:001",
        source,
    })?;
    tracing::debug!(entries = archive.len(), "opened archive");

    let mut contents = ArchiveContents::default();
    for i in 0..archive.len() {
        let (name, format, result) = match read_entry(&mut archive, i) {
            Ok(EntryBytes::Skipped(name)) => {
                tracing::trace!(entry = %name, "skipping unrecognized entry");
                contents.skipped.push(name);
                continue;
            }
            Ok(EntryBytes::Data { name, format, bytes }) => {
                let result = read_from_bytes(&bytes, format, options);
                (name, Some(format), result)
            }
            Err(e) => {
                let name = archive
                    .name_for_index(i)
                    .map_or_else(|| format!("#{i}"), str::to_string);
                let format = SourceFormat::from_name(&name);
                (name, format, Err(e))
            }
        };

        let ctx = ExtractContext {
            source: name.clone(),
            format,
        };
        options.report_entry(&ctx, &result);

        match result {
            Ok(table) => {
                tracing::debug!(entry = %name, rows = table.row_count(), "decoded entry");
                contents.tables.insert(name, table);
            }
            Err(e) => match options.entry_errors {
                EntryErrorPolicy::FailFast => {
                    return Err(ExtractError::Entry {
                        stage: "read_archive:004",
                        entry: name,
                        source: Box::new(e),
                    });
                }
                EntryErrorPolicy::Collect => {
                    tracing::warn!(entry = %name, error = %e, "entry failed; continuing");
                    contents.failures.push((name, e));
                }
            },
        }
    }

    Ok(contents)
}

enum EntryBytes {
    Skipped(String),
    Data {
        name: String,
        format: SourceFormat,
        bytes: Vec<u8>,
    },
}

// Declared sizes come from the archive itself, so only part of them is trusted up front.
const MAX_PREALLOC: u64 = 1 << 20;

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, i: usize) -> ExtractResult<EntryBytes> {
    let mut entry = archive.by_index(i).map_err(|source| ExtractError::ArchiveOpen {
        stage: "read_archive:002",
        source,
    })?;
    let name = entry.name().to_string();

    let format = match SourceFormat::from_name(&name) {
        Some(f) if entry.is_file() => f,
        _ => return Ok(EntryBytes::Skipped(name)),
    };

    let mut bytes = Vec::with_capacity(entry.size().min(MAX_PREALLOC) as usize);
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| ExtractError::ArchiveOpen {
            stage: "read_archive:003",
            source: e.into(),
        })?;
    Ok(EntryBytes::Data {
        name,
        format,
        bytes,
    })
}
