//! SNOMED CT concept table rows.
//!
//! Parses sct2_Concept_*.txt release files.

use csv::StringRecord;

use crate::parser::{parse, ReleaseRow};
use crate::types::Rf2Result;

/// Expected columns in a concept file.
const CONCEPT_COLUMNS: &[&str] = &[
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "definitionStatusId",
];

/// A row of the concept table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptRow {
    /// Concept identifier.
    pub id: String,
    /// Effective time, used as the code version.
    pub effective_time: String,
    /// Whether the concept is active.
    pub active: bool,
    /// The module containing this concept.
    pub module_id: String,
    /// Primitive or fully defined.
    pub definition_status_id: String,
}

impl ReleaseRow for ConceptRow {
    const COLUMNS: &'static [&'static str] = CONCEPT_COLUMNS;

    fn from_record(record: &StringRecord, line: u64) -> Rf2Result<Self> {
        Ok(ConceptRow {
            id: parse::identifier(&record[0], line)?,
            effective_time: record[1].to_string(),
            active: parse::boolean(&record[2])?,
            module_id: record[3].to_string(),
            definition_status_id: record[4].to_string(),
        })
    }
}
