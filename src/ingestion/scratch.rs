//! Local scratch files for sources that have to pass through the filesystem.
//!
//! A [`ScratchFile`] is created inside a configured directory, named after a caller-supplied
//! file name, and removed again when it is closed or dropped.

use std::ffi::OsStr;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{ExtractError, ExtractResult};

/// A file on local disk that is deleted when it goes out of scope.
///
/// Prefer [`ScratchFile::close`] over dropping: it reports deletion failures instead of
/// ignoring them.
#[derive(Debug)]
pub struct ScratchFile {
    inner: NamedTempFile,
}

impl ScratchFile {
    /// Write `bytes` to a new file in `dir`.
    ///
    /// Only the final path component of `name` is used, and a random infix is inserted before
    /// the extension, so `"../../etc/report.xlsx"` becomes something like `report.a1B2c3.xlsx`
    /// inside `dir`.
    pub fn write(dir: impl AsRef<Path>, name: &str, bytes: &[u8]) -> ExtractResult<Self> {
        let dir = dir.as_ref();
        let (stem, suffix) = sanitized_parts(name);

        let mut inner = tempfile::Builder::new()
            .prefix(&format!("{stem}."))
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|e| ExtractError::local_file("scratch_file:001", dir, e))?;

        inner
            .write_all(bytes)
            .and_then(|()| inner.flush())
            .map_err(|e| ExtractError::local_file("scratch_file:002", inner.path(), e))?;

        tracing::debug!(path = %inner.path().display(), bytes = bytes.len(), "wrote scratch file");
        Ok(Self { inner })
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Open an independent read handle positioned at the start of the file.
    pub fn reopen(&self) -> ExtractResult<File> {
        self.inner
            .reopen()
            .map_err(|e| ExtractError::local_file("scratch_file:003", self.path(), e))
    }

    /// Delete the file, reporting failure.
    pub fn close(self) -> ExtractResult<()> {
        let path: PathBuf = self.inner.path().to_path_buf();
        self.inner
            .close()
            .map_err(|e| ExtractError::local_file("scratch_file:004", &path, e))?;
        tracing::debug!(path = %path.display(), "removed scratch file");
        Ok(())
    }
}

fn sanitized_parts(name: &str) -> (String, String) {
    // Treat both separators as path separators regardless of platform.
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let base = Path::new(base);

    let stem = base
        .file_stem()
        .and_then(OsStr::to_str)
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("upload");
    let suffix = base
        .extension()
        .and_then(OsStr::to_str)
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    (stem.to_string(), suffix)
}
