//! Parser-specific types for release file processing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading release files.
#[derive(Error, Debug)]
pub enum Rf2Error {
    /// I/O error reading a release file.
    #[error("IO error reading release file: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Directory traversal error.
    #[error("Error walking release directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Directory not found.
    #[error("Directory not found: {path}")]
    DirectoryNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Required file missing from a release directory.
    #[error("Required release file not found: {file_type} in {directory}")]
    RequiredFileMissing {
        /// The type of file that was missing.
        file_type: String,
        /// The directory that was searched.
        directory: String,
    },

    /// A row does not have the number of columns its table requires.
    #[error("Malformed row at line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        /// One-based line number of the row.
        line: u64,
        /// Expected column count.
        expected: usize,
        /// Found column count.
        found: usize,
    },

    /// Missing required column in a table header.
    #[error("Missing required column: {column}")]
    MissingColumn {
        /// The name of the missing column.
        column: String,
    },

    /// A row carries an empty code identifier.
    #[error("Empty identifier at line {line}")]
    EmptyIdentifier {
        /// One-based line number of the row.
        line: u64,
    },

    /// Invalid boolean value.
    #[error("Invalid boolean value: {value} (expected 0 or 1)")]
    InvalidBoolean {
        /// The invalid boolean value.
        value: String,
    },

    /// The region could not be inferred from a file name.
    #[error("Cannot infer region code from file name: {file_name}")]
    InvalidRegion {
        /// The file name that was inspected.
        file_name: String,
    },

    /// The job requested cancellation while parsing.
    #[error("Parsing canceled")]
    Cancelled,
}

/// Result type for release parsing operations.
pub type Rf2Result<T> = Result<T, Rf2Error>;

/// Statistics from folding a release into code updates.
#[derive(Debug, Clone, Default)]
pub struct ParseStats {
    /// Data rows read across all files.
    pub rows_read: usize,
    /// Code updates created.
    pub codes_created: usize,
    /// Code updates created without a version.
    pub bare_codes: usize,
    /// Rows skipped because they were inactive.
    pub inactive_skipped: usize,
    /// Variant rows ignored because their code was never seen.
    pub variants_ignored: usize,
    /// Time taken to parse in milliseconds.
    pub parse_time_ms: u64,
}

/// Which slice of a SNOMED CT release to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseType {
    /// Changes since the previous release.
    Delta,
    /// Full current state.
    Snapshot,
}

impl ReleaseType {
    /// Parses `delta` or `snapshot`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "delta" => Some(Self::Delta),
            "snapshot" => Some(Self::Snapshot),
            _ => None,
        }
    }

    /// Name of the release folder holding this slice.
    pub fn folder_name(self) -> &'static str {
        match self {
            Self::Delta => "Delta",
            Self::Snapshot => "Snapshot",
        }
    }
}

/// Discovered SNOMED CT files of one release slice.
#[derive(Debug, Clone)]
pub struct SnomedReleaseFiles {
    /// Path to the concept file.
    pub concept_file: PathBuf,
    /// Paths to the description files, one or more per release.
    pub description_files: Vec<PathBuf>,
    /// Path to the relationship file.
    pub relationship_file: PathBuf,
    /// Region tag inferred from the concept file name.
    pub region: String,
    /// Release date extracted from the concept file name (YYYYMMDD).
    pub release_date: Option<String>,
}

/// A LOINC linguistic variant, identified by language and region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinguisticVariant {
    /// Language tag of the localized names (e.g. `fr`).
    pub language: String,
    /// Region tag added to codes covered by the variant (e.g. `be`).
    pub region: String,
}

impl LinguisticVariant {
    /// Creates a variant descriptor.
    pub fn new(language: &str, region: &str) -> Self {
        Self {
            language: language.to_string(),
            region: region.to_string(),
        }
    }

    /// The variants imported alongside the primary LOINC table.
    pub fn supported() -> Vec<Self> {
        vec![
            Self::new("fr", "be"),
            Self::new("fr", "fr"),
            Self::new("nl", "nl"),
        ]
    }
}

/// Discovered LOINC files.
#[derive(Debug, Clone)]
pub struct LoincReleaseFiles {
    /// Path to the primary LOINC table.
    pub table_file: PathBuf,
    /// Linguistic variant files that were found.
    pub variant_files: Vec<(LinguisticVariant, PathBuf)>,
}
