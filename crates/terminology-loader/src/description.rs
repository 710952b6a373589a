//! SNOMED CT description table rows.
//!
//! Parses sct2_Description_*.txt release files.

use csv::StringRecord;
use terminology_types::well_known;

use crate::parser::{parse, ReleaseRow};
use crate::types::Rf2Result;

/// Expected columns in a description file.
const DESCRIPTION_COLUMNS: &[&str] = &[
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "conceptId",
    "languageCode",
    "typeId",
    "term",
    "caseSignificanceId",
];

/// A row of a description table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionRow {
    /// Description identifier.
    pub id: String,
    /// Effective time.
    pub effective_time: String,
    /// Whether this description is active.
    pub active: bool,
    /// The module containing this description.
    pub module_id: String,
    /// The concept this description belongs to.
    pub concept_id: String,
    /// Language tag (e.g., "en").
    pub language_code: String,
    /// Description type (FSN, synonym, ...).
    pub type_id: String,
    /// The description text.
    pub term: String,
    /// Case significance rules for this term.
    pub case_significance_id: String,
}

impl DescriptionRow {
    /// Returns true if this is a Fully Specified Name.
    pub fn is_fsn(&self) -> bool {
        self.type_id == well_known::FULLY_SPECIFIED_NAME
    }
}

impl ReleaseRow for DescriptionRow {
    const COLUMNS: &'static [&'static str] = DESCRIPTION_COLUMNS;

    fn from_record(record: &StringRecord, line: u64) -> Rf2Result<Self> {
        Ok(DescriptionRow {
            id: record[0].to_string(),
            effective_time: record[1].to_string(),
            active: parse::boolean(&record[2])?,
            module_id: record[3].to_string(),
            concept_id: parse::identifier(&record[4], line)?,
            language_code: record[5].to_string(),
            type_id: record[6].to_string(),
            term: record[7].to_string(),
            case_significance_id: record[8].to_string(),
        })
    }
}
