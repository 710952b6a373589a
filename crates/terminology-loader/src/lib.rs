//! # terminology-loader
//!
//! Streaming parsers for SNOMED CT and LOINC release files.
//!
//! A release is folded into an ordered [`CodeUpdateMap`], one
//! [`CodeUpdate`](terminology_types::CodeUpdate) per code. Parsers poll a
//! [`CancellationCheck`] before every row.
//!
//! ## Usage
//!
//! ```no_run
//! use terminology_loader::{
//!     discover_snomed_release, MultiLanguageTokenizer, NeverCancelled, ReleaseType,
//!     SnomedReleaseParser,
//! };
//!
//! let files = discover_snomed_release("releases/snomed/int", ReleaseType::Snapshot)?;
//! let tokenizer = MultiLanguageTokenizer::new();
//! let parser = SnomedReleaseParser::new(files.region.clone(), &tokenizer, &NeverCancelled);
//! let (codes, stats) = parser.parse_files(&files)?;
//!
//! println!("{} codes from {} rows", codes.len(), stats.rows_read);
//! # Ok::<(), terminology_loader::Rf2Error>(())
//! ```

#![warn(missing_docs)]

pub mod cancel;
pub mod concept;
pub mod description;
pub mod loader;
pub mod loinc;
pub mod parser;
pub mod relationship;
pub mod snomed;
pub mod tokenizer;
pub mod types;

pub use cancel::{CancellationCheck, NeverCancelled};
pub use loader::{discover_loinc_release, discover_snomed_release};
pub use loinc::LoincReleaseParser;
pub use parser::{ReleaseRow, Rf2Parser};
pub use snomed::SnomedReleaseParser;
pub use tokenizer::{MultiLanguageTokenizer, SentenceTokenizer, Tokenize};
pub use types::{
    LinguisticVariant, LoincReleaseFiles, ParseStats, ReleaseType, Rf2Error, Rf2Result,
    SnomedReleaseFiles,
};

// Re-export terminology-types for convenience
pub use terminology_types;
pub use terminology_types::CodeUpdateMap;
