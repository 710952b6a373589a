//! Generic release row parser.
//!
//! Provides a streaming parser for SNOMED CT tab-delimited tables.

use std::fs::File;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};

use crate::types::{Rf2Error, Rf2Result};

/// Trait for rows that can be parsed from a tab-delimited release table.
pub trait ReleaseRow: Sized {
    /// Column names of the table, in order.
    ///
    /// The first name doubles as the header sentinel: a row whose first
    /// field equals it is the header and is skipped.
    const COLUMNS: &'static [&'static str];

    /// Parse a row from a record that has exactly `COLUMNS.len()` fields.
    fn from_record(record: &StringRecord, line: u64) -> Rf2Result<Self>;
}

/// A streaming parser for tab-delimited release tables.
///
/// Rows are read one at a time so that entire files are never held in
/// memory. A row with the wrong number of columns is an error, not a skip.
pub struct Rf2Parser<R: Read, T: ReleaseRow> {
    reader: Reader<R>,
    line: u64,
    _marker: PhantomData<T>,
}

impl<T: ReleaseRow> Rf2Parser<BufReader<File>, T> {
    /// Creates a new parser from a file path.
    ///
    /// # Errors
    /// Returns an error if the file does not exist or cannot be opened.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Rf2Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Rf2Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: Read, T: ReleaseRow> Rf2Parser<R, T> {
    /// Creates a new parser from a reader.
    pub fn from_reader(reader: R) -> Self {
        // Terms may contain bare quotes, so quoting must stay off.
        let reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(csv::Trim::None)
            .from_reader(reader);

        Self {
            reader,
            line: 0,
            _marker: PhantomData,
        }
    }

    /// Returns the line number of the last row read.
    pub fn line(&self) -> u64 {
        self.line
    }

    fn is_header(record: &StringRecord) -> bool {
        record
            .get(0)
            .map(|first| first.trim_start_matches('\u{feff}') == T::COLUMNS[0])
            .unwrap_or(false)
    }
}

impl<R: Read, T: ReleaseRow> Iterator for Rf2Parser<R, T> {
    type Item = Rf2Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut record = StringRecord::new();
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    self.line = record
                        .position()
                        .map(|p| p.line())
                        .unwrap_or(self.line + 1);

                    if record.iter().all(|f| f.trim().is_empty()) {
                        continue;
                    }
                    if Self::is_header(&record) {
                        continue;
                    }
                    if record.len() != T::COLUMNS.len() {
                        return Some(Err(Rf2Error::ColumnCount {
                            line: self.line,
                            expected: T::COLUMNS.len(),
                            found: record.len(),
                        }));
                    }

                    return Some(T::from_record(&record, self.line));
                }
                Ok(false) => return None,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Helper functions for parsing release field values.
pub mod parse {
    use super::{Rf2Error, Rf2Result};

    /// Parses a non-empty code identifier.
    pub fn identifier(value: &str, line: u64) -> Rf2Result<String> {
        let value = value.trim_start_matches('\u{feff}').trim();
        if value.is_empty() {
            return Err(Rf2Error::EmptyIdentifier { line });
        }
        Ok(value.to_string())
    }

    /// Parses a boolean from "0" or "1".
    pub fn boolean(value: &str) -> Rf2Result<bool> {
        match value {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(Rf2Error::InvalidBoolean {
                value: value.to_string(),
            }),
        }
    }

    /// Escapes commas so terms survive comma-delimited serialization downstream.
    pub fn sanitize(text: &str) -> String {
        text.replace(',', "\\,")
    }
}
