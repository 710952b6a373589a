//! SNOMED CT relationship table rows.
//!
//! Parses sct2_Relationship_*.txt release files.

use csv::StringRecord;

use crate::parser::{parse, ReleaseRow};
use crate::types::Rf2Result;

/// Expected columns in a relationship file.
const RELATIONSHIP_COLUMNS: &[&str] = &[
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "sourceId",
    "destinationId",
    "relationshipGroup",
    "typeId",
    "characteristicTypeId",
    "modifierId",
];

/// A row of the relationship table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRow {
    /// Relationship identifier.
    pub id: String,
    /// Effective time.
    pub effective_time: String,
    /// Whether the relationship is active.
    pub active: bool,
    /// The module containing this relationship.
    pub module_id: String,
    /// Concept the relationship starts from.
    pub source_id: String,
    /// Concept the relationship points to.
    pub destination_id: String,
    /// Role group.
    pub relationship_group: String,
    /// Relationship type (e.g. IS_A).
    pub type_id: String,
    /// Stated or inferred.
    pub characteristic_type_id: String,
    /// Existential or universal.
    pub modifier_id: String,
}

impl ReleaseRow for RelationshipRow {
    const COLUMNS: &'static [&'static str] = RELATIONSHIP_COLUMNS;

    fn from_record(record: &StringRecord, line: u64) -> Rf2Result<Self> {
        Ok(RelationshipRow {
            id: record[0].to_string(),
            effective_time: record[1].to_string(),
            active: parse::boolean(&record[2])?,
            module_id: record[3].to_string(),
            source_id: parse::identifier(&record[4], line)?,
            destination_id: parse::identifier(&record[5], line)?,
            relationship_group: record[6].to_string(),
            type_id: record[7].to_string(),
            characteristic_type_id: record[8].to_string(),
            modifier_id: record[9].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terminology_types::well_known;

    fn make_record(fields: &[&str]) -> StringRecord {
        let mut record = StringRecord::new();
        for field in fields {
            record.push_field(field);
        }
        record
    }

    #[test]
    fn test_parse_relationship_record() {
        let record = make_record(&[
            "100000028",
            "20020131",
            "1",
            "900000000000207008",
            "73211009",
            "362969004",
            "0",
            "116680003",
            "900000000000011006",
            "900000000000451002",
        ]);

        let rel = RelationshipRow::from_record(&record, 2).unwrap();
        assert_eq!(rel.source_id, "73211009");
        assert_eq!(rel.destination_id, "362969004");
        assert_eq!(rel.type_id, well_known::IS_A);
        assert!(rel.active);
    }

    #[test]
    fn test_missing_destination() {
        let record = make_record(&[
            "100000028", "20020131", "1", "0000", "73211009", "", "0", "116680003", "0000", "0000",
        ]);
        assert!(RelationshipRow::from_record(&record, 7).is_err());
    }
}
