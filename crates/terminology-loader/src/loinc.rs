//! LOINC table parser.
//!
//! Parses LoincTable/Loinc.csv and the linguistic variant files.
//! Columns are located by header name, not position.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;

use csv::{ReaderBuilder, StringRecord};
use terminology_types::{well_known, CodeKey, CodeUpdate, CodeUpdateMap};

use crate::cancel::CancellationCheck;
use crate::parser::parse;
use crate::tokenizer::Tokenize;
use crate::types::{LinguisticVariant, LoincReleaseFiles, ParseStats, Rf2Error, Rf2Result};

/// Columns of the primary table read by the parser.
pub const TABLE_COLUMNS: &[&str] = &[
    "LOINC_NUM",
    "COMPONENT",
    "PROPERTY",
    "TIME_ASPCT",
    "SYSTEM",
    "SCALE_TYP",
    "METHOD_TYP",
    "STATUS",
    "VersionLastChanged",
    "CONSUMER_NAME",
    "LONG_COMMON_NAME",
    "DisplayName",
    "SHORTNAME",
];

/// Columns of a linguistic variant file read by the parser.
pub const VARIANT_COLUMNS: &[&str] = &[
    "LOINC_NUM",
    "COMPONENT",
    "PROPERTY",
    "TIME_ASPCT",
    "SYSTEM",
    "SCALE_TYP",
    "METHOD_TYP",
    "LONG_COMMON_NAME",
    "LinguisticVariantDisplayName",
    "SHORTNAME",
];

/// Header name to column index.
#[derive(Debug, Clone)]
struct ColumnMap {
    columns: HashMap<String, usize>,
    width: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord, required: &[&str]) -> Rf2Result<Self> {
        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_start_matches('\u{feff}').to_string(), i))
            .collect();

        if let Some(missing) = required.iter().find(|c| !columns.contains_key(**c)) {
            return Err(Rf2Error::MissingColumn {
                column: missing.to_string(),
            });
        }

        Ok(Self {
            columns,
            width: headers.len(),
        })
    }

    fn get<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.columns
            .get(column)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }

    /// Builds `COMPONENT:PROPERTY:TIME_ASPCT:SYSTEM:SCALE_TYP[:METHOD_TYP]`.
    fn fully_qualified_name(&self, record: &StringRecord) -> String {
        let mut fqn = ["COMPONENT", "PROPERTY", "TIME_ASPCT", "SYSTEM", "SCALE_TYP"]
            .iter()
            .map(|c| self.get(record, c))
            .collect::<Vec<_>>()
            .join(":");
        let method = self.get(record, "METHOD_TYP");
        if !method.is_empty() {
            fqn.push(':');
            fqn.push_str(method);
        }
        fqn
    }

    /// Sanitized names of the given columns followed by the FQN, blanks removed.
    fn names(&self, record: &StringRecord, columns: &[&str], fqn: &str) -> Vec<String> {
        columns
            .iter()
            .map(|c| parse::sanitize(self.get(record, c)))
            .chain(std::iter::once(fqn.to_string()))
            .filter(|name| !name.trim().is_empty())
            .collect()
    }
}

/// Folds the LOINC table and its linguistic variants into a [`CodeUpdateMap`].
pub struct LoincReleaseParser<'a> {
    tokenizer: &'a dyn Tokenize,
    cancel: &'a dyn CancellationCheck,
    codes: CodeUpdateMap,
    stats: ParseStats,
    started: Instant,
}

impl<'a> LoincReleaseParser<'a> {
    /// Creates a parser.
    pub fn new(tokenizer: &'a dyn Tokenize, cancel: &'a dyn CancellationCheck) -> Self {
        Self {
            tokenizer,
            cancel,
            codes: CodeUpdateMap::new(),
            stats: ParseStats::default(),
            started: Instant::now(),
        }
    }

    /// Parses a discovered release: the primary table, then each variant.
    pub fn parse_files(mut self, files: &LoincReleaseFiles) -> Rf2Result<(CodeUpdateMap, ParseStats)> {
        self.read_table(open(&files.table_file)?)?;
        for (variant, path) in &files.variant_files {
            self.read_variant(variant, open(path)?)?;
        }
        Ok(self.finish())
    }

    /// Reads the primary table.
    pub fn read_table<R: Read>(&mut self, reader: R) -> Rf2Result<()> {
        let mut reader = csv_reader(reader);
        let columns = ColumnMap::from_headers(reader.headers()?, TABLE_COLUMNS)?;

        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            self.cancel.checkpoint()?;
            if !check_row(&record, &columns)? {
                continue;
            }
            self.stats.rows_read += 1;

            let code = parse::identifier(columns.get(&record, "LOINC_NUM"), line_of(&record))?;
            let fqn = columns.fully_qualified_name(&record);
            let names = columns.names(
                &record,
                &["CONSUMER_NAME", "LONG_COMMON_NAME", "DisplayName", "SHORTNAME"],
                &fqn,
            );
            let language = well_known::LOINC_PRIMARY_LANGUAGE;

            let mut update = CodeUpdate::versioned(
                code.as_str(),
                well_known::INTERNATIONAL_REGION,
                columns.get(&record, "VersionLastChanged"),
                columns.get(&record, "STATUS") != well_known::LOINC_ACTIVE_STATUS,
            );
            if let Some(first) = names.first() {
                update.add_search_terms(language, self.tokenizer.tokenize(language, first));
            }
            update.description.insert(language.to_string(), fqn);
            update.synonyms.insert(language.to_string(), names);

            if self.codes.insert(CodeKey::new(code), update).is_none() {
                self.stats.codes_created += 1;
            }
        }
        Ok(())
    }

    /// Reads one linguistic variant file.
    ///
    /// Rows for codes absent from the primary table are ignored.
    pub fn read_variant<R: Read>(&mut self, variant: &LinguisticVariant, reader: R) -> Rf2Result<()> {
        let mut reader = csv_reader(reader);
        let columns = ColumnMap::from_headers(reader.headers()?, VARIANT_COLUMNS)?;
        let language = variant.language.as_str();

        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            self.cancel.checkpoint()?;
            if !check_row(&record, &columns)? {
                continue;
            }
            self.stats.rows_read += 1;

            let key = CodeKey::new(columns.get(&record, "LOINC_NUM").trim());
            let Some(update) = self.codes.get_mut(&key) else {
                self.stats.variants_ignored += 1;
                continue;
            };

            let fqn = columns.fully_qualified_name(&record);
            let names = columns.names(
                &record,
                &["LONG_COMMON_NAME", "LinguisticVariantDisplayName", "SHORTNAME"],
                &fqn,
            );

            update.regions.insert(variant.region.clone());
            update.description.insert(language.to_string(), fqn);
            if let Some(first) = names.first() {
                update.add_search_terms(language, self.tokenizer.tokenize(language, first));
            }
            update
                .synonyms
                .entry(language.to_string())
                .or_default()
                .extend(names);
        }
        Ok(())
    }

    /// Returns the folded updates and parse statistics.
    pub fn finish(mut self) -> (CodeUpdateMap, ParseStats) {
        self.stats.parse_time_ms = self.started.elapsed().as_millis() as u64;
        (self.codes, self.stats)
    }
}

fn open(path: &Path) -> Rf2Result<BufReader<File>> {
    if !path.exists() {
        return Err(Rf2Error::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(BufReader::new(File::open(path)?))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Returns false for blank rows; errors on rows of the wrong width.
fn check_row(record: &StringRecord, columns: &ColumnMap) -> Rf2Result<bool> {
    if record.iter().all(|f| f.trim().is_empty()) {
        return Ok(false);
    }
    if record.len() != columns.width {
        return Err(Rf2Error::ColumnCount {
            line: line_of(record),
            expected: columns.width,
            found: record.len(),
        });
    }
    Ok(true)
}
