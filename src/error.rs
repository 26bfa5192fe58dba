use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Error type returned by every reader, the fetcher and the upload helpers.
///
/// Each variant carries a `stage` tag of the form `"<function>:<NNN>"` so a failure can be traced
/// to the exact step that produced it. The underlying cause is rendered verbatim after the tag.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The requested multipart form field was not part of the upload.
    #[error("{stage}: form field '{field}' not found")]
    FormFieldMissing { stage: &'static str, field: String },

    /// The HTTP request could not be built (malformed URL, invalid header, client setup).
    #[error("{stage}: {message}")]
    RequestBuild { stage: &'static str, message: String },

    /// Network failure while sending the request or reading the response body.
    #[error("{stage}: {source}")]
    Transport {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status code.
    #[error("{stage}: unexpected HTTP status {status} from {url}")]
    UnexpectedStatus {
        stage: &'static str,
        url: String,
        status: u16,
    },

    /// Creating, writing, reading or deleting a local file failed.
    #[error("{stage}: {}: {source}", .path.display())]
    LocalFile {
        stage: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The byte stream is not a readable ZIP container, or an entry's data could not be read.
    #[error("{stage}: {}", zip_cause(.source))]
    ArchiveOpen {
        stage: &'static str,
        #[source]
        source: zip::result::ZipError,
    },

    /// A delimited record could not be decoded.
    #[error("{stage}: {source}")]
    Decode {
        stage: &'static str,
        #[source]
        source: csv::Error,
    },

    /// The workbook has no sheet with the requested name.
    #[error("{stage}: sheet '{sheet}' not found. sheets={available:?}")]
    SheetNotFound {
        stage: &'static str,
        sheet: String,
        available: Vec<String>,
    },

    /// The byte stream is not a valid spreadsheet container, or the sheet data is corrupt.
    #[error("{stage}: {source}")]
    OpenSpreadsheet {
        stage: &'static str,
        #[source]
        source: calamine::XlsxError,
    },

    /// An archive entry failed to decode.
    #[error("{stage}: entry '{entry}': {source}")]
    Entry {
        stage: &'static str,
        entry: String,
        #[source]
        source: Box<ExtractError>,
    },
}

// `ZipError::Io` displays as a bare "i/o error"; the io error is what says what went wrong.
fn zip_cause(e: &zip::result::ZipError) -> String {
    match e {
        zip::result::ZipError::Io(io) => format!("i/o error: {io}"),
        other => other.to_string(),
    }
}

/// Fieldless classification of an [`ExtractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FormFieldMissing,
    RequestBuild,
    Transport,
    UnexpectedStatus,
    LocalFile,
    ArchiveOpen,
    Decode,
    SheetNotFound,
    OpenSpreadsheet,
    Entry,
}

impl ExtractError {
    /// Classify the error without matching on its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FormFieldMissing { .. } => ErrorKind::FormFieldMissing,
            Self::RequestBuild { .. } => ErrorKind::RequestBuild,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::UnexpectedStatus { .. } => ErrorKind::UnexpectedStatus,
            Self::LocalFile { .. } => ErrorKind::LocalFile,
            Self::ArchiveOpen { .. } => ErrorKind::ArchiveOpen,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::SheetNotFound { .. } => ErrorKind::SheetNotFound,
            Self::OpenSpreadsheet { .. } => ErrorKind::OpenSpreadsheet,
            Self::Entry { .. } => ErrorKind::Entry,
        }
    }

    /// The stage tag (`"<function>:<NNN>"`) of the step that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::FormFieldMissing { stage, .. }
            | Self::RequestBuild { stage, .. }
            | Self::Transport { stage, .. }
            | Self::UnexpectedStatus { stage, .. }
            | Self::LocalFile { stage, .. }
            | Self::ArchiveOpen { stage, .. }
            | Self::Decode { stage, .. }
            | Self::SheetNotFound { stage, .. }
            | Self::OpenSpreadsheet { stage, .. }
            | Self::Entry { stage, .. } => *stage,
        }
    }

    /// For [`ExtractError::Entry`], the innermost entry-level error; otherwise `self`.
    pub fn root(&self) -> &ExtractError {
        match self {
            Self::Entry { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn local_file(
        stage: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::LocalFile {
            stage,
            path: path.into(),
            source,
        }
    }
}
