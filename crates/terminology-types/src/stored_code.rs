//! Durable code record held by the remote code store.

use std::collections::{BTreeMap, BTreeSet};

/// A versioned code record as held by the code store.
///
/// The identity is `type|code|version`. Only the fields below are read or
/// written by the importer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct StoredCode {
    /// Composite identifier `type|code|version`.
    pub id: String,
    /// Store revision, echoed back on modification.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub rev: Option<String>,
    /// Code type tag (e.g. `SNOMED`, `LOINC`).
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub code_type: String,
    /// Code identifier.
    pub code: String,
    /// Version stamp.
    pub version: Option<String>,
    /// Label per language.
    pub label: BTreeMap<String, String>,
    /// Region tags.
    pub regions: BTreeSet<String>,
    /// Relation targets per relation type.
    pub qualified_links: BTreeMap<String, BTreeSet<String>>,
    /// Search tokens per language.
    pub search_terms: BTreeMap<String, BTreeSet<String>>,
    /// Whether the code is disabled.
    pub disabled: bool,
}

impl StoredCode {
    /// Creates an empty record with its composite identifier.
    pub fn new(code_type: &str, code: &str, version: Option<String>) -> Self {
        Self {
            id: Self::compose_id(code_type, code, version.as_deref()),
            code_type: code_type.to_string(),
            code: code.to_string(),
            version,
            ..Default::default()
        }
    }

    /// Builds the `type|code|version` identifier.
    ///
    /// ```
    /// use terminology_types::StoredCode;
    ///
    /// assert_eq!(StoredCode::compose_id("SNOMED", "1001", Some("20210101")), "SNOMED|1001|20210101");
    /// ```
    pub fn compose_id(code_type: &str, code: &str, version: Option<&str>) -> String {
        format!("{}|{}|{}", code_type, code, version.unwrap_or_default())
    }
}

/// Identifier of a record written by a create or modify batch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WrittenCode {
    /// Identifier of the written record.
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_composes_id() {
        let code = StoredCode::new("LOINC", "1234-5", Some("2.72".to_string()));
        assert_eq!(code.id, "LOINC|1234-5|2.72");
        assert!(!code.disabled);
    }

    #[test]
    fn test_unversioned_id() {
        assert_eq!(StoredCode::compose_id("SNOMED", "1001", None), "SNOMED|1001|");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_wire_field_names() {
        let mut code = StoredCode::new("SNOMED", "1001", Some("20210101".to_string()));
        code.qualified_links
            .entry("116680003".to_string())
            .or_default()
            .insert("1000".to_string());

        let json = serde_json::to_value(&code).unwrap();
        assert_eq!(json["type"], "SNOMED");
        assert_eq!(json["qualifiedLinks"]["116680003"][0], "1000");
        assert!(json.get("rev").is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_missing_fields_default() {
        let parsed: StoredCode =
            serde_json::from_str(r#"{"id":"SNOMED|1|2","type":"SNOMED","code":"1","version":"2"}"#)
                .unwrap();
        assert!(parsed.label.is_empty());
        assert!(!parsed.disabled);
    }
}
