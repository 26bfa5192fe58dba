//! Delimited text (CSV and pipe-separated) decoding.

use std::io::{self, Read};

use crate::error::{ExtractError, ExtractResult};
use crate::types::{Table, TableBuilder};

/// Field separator for `.csv` sources.
pub const COMMA: u8 = b',';
/// Field separator for `.txt` sources.
pub const PIPE: u8 = b'|';

/// Decode a delimited byte buffer into a [`Table`].
///
/// See [`decode_delimited_from_reader`] for the rules.
pub fn decode_delimited(bytes: &[u8], delimiter: u8) -> ExtractResult<Table> {
    decode_delimited_from_reader(bytes, delimiter)
}

/// Decode a comma-separated byte buffer.
pub fn decode_csv(bytes: &[u8]) -> ExtractResult<Table> {
    decode_delimited(bytes, COMMA)
}

/// Decode a pipe-separated byte buffer.
pub fn decode_pipe_text(bytes: &[u8]) -> ExtractResult<Table> {
    decode_delimited(bytes, PIPE)
}

/// Decode delimited records from any reader into a [`Table`].
///
/// Rules:
///
/// - Every physical record becomes one row; there is no header row.
/// - Fields wrapped in double quotes may contain the delimiter, line breaks and doubled quotes.
/// - Records may have different field counts.
/// - Cell text is kept as-is (no trimming).
/// - Lines that contain nothing but a line terminator produce no row.
///
/// Quoting is strict. A quote inside an unquoted field, text after a closing quote, or a quoted
/// field still open at end of input is a [`ExtractError::Decode`] (`decode_delimited:002`).
/// Invalid UTF-8 fails with `decode_delimited:001`. Either way no rows are returned.
pub fn decode_delimited_from_reader<R: Read>(reader: R, delimiter: u8) -> ExtractResult<Table> {
    let mut checked = QuoteChecked::new(reader, delimiter);

    let mut table = TableBuilder::new();
    {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(&mut checked);

        for result in rdr.records() {
            let record = result.map_err(|source| ExtractError::Decode {
                stage: "decode_delimited:001",
                source,
            })?;
            table.push_row(record.iter().map(str::to_owned).collect());
        }
    }

    checked.finish().map_err(|e| ExtractError::Decode {
        stage: "decode_delimited:002",
        source: csv::Error::from(e),
    })?;

    tracing::trace!(rows = table.len(), delimiter = %char::from(delimiter), "decoded delimited source");
    Ok(table.build())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Start,
    Unquoted,
    Quoted { opened_on: u64 },
    // Saw a quote inside a quoted field: either an escaped quote or the closing one.
    QuoteInQuoted { opened_on: u64 },
}

/// Validates quoting of the bytes passing through it.
///
/// The csv reader accepts stray quotes; this rejects them the way RFC 4180 does. The first
/// violation is kept and returned by [`QuoteChecked::finish`].
struct QuoteChecked<R> {
    inner: R,
    delimiter: u8,
    field: Field,
    line: u64,
    violation: Option<String>,
}

impl<R> QuoteChecked<R> {
    fn new(inner: R, delimiter: u8) -> Self {
        Self {
            inner,
            delimiter,
            field: Field::Start,
            line: 1,
            violation: None,
        }
    }

    fn is_boundary(&self, b: u8) -> bool {
        b == self.delimiter || b == b'\n' || b == b'\r'
    }

    fn feed(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.violation.is_some() {
                return;
            }
            let boundary = self.is_boundary(b);
            self.field = match self.field {
                Field::Start if b == b'"' => Field::Quoted { opened_on: self.line },
                Field::Start | Field::Unquoted if boundary => Field::Start,
                Field::Start | Field::Unquoted if b == b'"' => {
                    self.violation = Some(format!("line {}: bare \" in non-quoted field", self.line));
                    Field::Unquoted
                }
                Field::Start | Field::Unquoted => Field::Unquoted,
                Field::Quoted { opened_on } if b == b'"' => Field::QuoteInQuoted { opened_on },
                Field::Quoted { opened_on } => Field::Quoted { opened_on },
                Field::QuoteInQuoted { opened_on } if b == b'"' => Field::Quoted { opened_on },
                Field::QuoteInQuoted { .. } if boundary => Field::Start,
                Field::QuoteInQuoted { opened_on } => {
                    self.violation = Some(format!(
                        "line {}: extraneous \" in quoted field opened on line {opened_on}",
                        self.line
                    ));
                    Field::Unquoted
                }
            };
            if b == b'\n' {
                self.line += 1;
            }
        }
    }

    fn finish(self) -> io::Result<()> {
        let violation = match (self.violation, self.field) {
            (Some(v), _) => v,
            (None, Field::Quoted { opened_on }) => {
                format!("line {opened_on}: quoted field is not terminated")
            }
            (None, _) => return Ok(()),
        };
        Err(io::Error::new(io::ErrorKind::InvalidData, violation))
    }
}

impl<R: Read> Read for QuoteChecked<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.feed(&buf[..n]);
        Ok(n)
    }
}

/// Encode a [`Table`] back into delimited bytes.
///
/// Fields are quoted only when they need to be (they contain the delimiter, a quote or a line
/// break). Decoding the output with the same delimiter yields the same rows, except for rows with
/// no cells at all, which have no delimited representation.
pub fn encode_delimited(table: &Table, delimiter: u8) -> ExtractResult<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_writer(Vec::new());

    for row in table {
        wtr.write_record(row).map_err(|source| ExtractError::Decode {
            stage: "encode_delimited:001",
            source,
        })?;
    }

    wtr.into_inner().map_err(|e| ExtractError::Decode {
        stage: "encode_delimited:002",
        source: csv::Error::from(e.into_error()),
    })
}
