//! Record sources
//!
//! A source is a finite, forward-only sequence of normalized records. The
//! generator pulls from it exactly once; an `Err` item is terminal and aborts
//! the generation.

use flowspec_model::NormalizedRecord;
use std::io::BufRead;

use crate::error::SourceError;

/// A single-pass stream of normalized records
pub trait RecordSource {
    /// Pull the next record; `None` means the source is exhausted
    fn next_record(&mut self) -> Option<Result<NormalizedRecord, SourceError>>;
}

impl<I> RecordSource for I
where
    I: Iterator<Item = Result<NormalizedRecord, SourceError>>,
{
    fn next_record(&mut self) -> Option<Result<NormalizedRecord, SourceError>> {
        self.next()
    }
}

/// Wrap records that cannot fail into a source
pub fn records<I>(records: I) -> impl Iterator<Item = Result<NormalizedRecord, SourceError>>
where
    I: IntoIterator<Item = NormalizedRecord>,
{
    records.into_iter().map(Ok)
}

/// Reads one JSON-encoded record per line
///
/// Blank lines are ignored. A read or decode failure is yielded once and the
/// source then reports exhaustion.
pub struct JsonLinesSource<R> {
    reader: R,
    line: usize,
    failed: bool,
    buf: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            failed: false,
            buf: String::new(),
        }
    }

    /// Number of lines read so far
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for JsonLinesSource<R> {
    type Item = Result<NormalizedRecord, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let text = self.buf.trim();
                    if text.is_empty() {
                        continue;
                    }
                    return match serde_json::from_str::<NormalizedRecord>(text) {
                        Ok(record) => Some(Ok(record)),
                        Err(e) => {
                            self.failed = true;
                            Some(Err(SourceError::Decode {
                                line: self.line,
                                message: e.to_string(),
                            }))
                        }
                    };
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(SourceError::Io(e)));
                }
            }
        }
    }
}
