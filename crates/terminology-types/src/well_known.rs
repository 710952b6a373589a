//! Well-known identifiers used while folding terminology releases.
//!
//! # Examples
//!
//! ```
//! use terminology_types::well_known;
//!
//! assert_eq!(well_known::FULLY_SPECIFIED_NAME, "900000000000003001");
//! assert_eq!(well_known::INTERNATIONAL_REGION, "xx");
//! ```

// =============================================================================
// Code types
// =============================================================================

/// Code type tag for SNOMED CT records in the code store.
pub const SNOMED_CODE_TYPE: &str = "SNOMED";

/// Code type tag for LOINC records in the code store.
pub const LOINC_CODE_TYPE: &str = "LOINC";

// =============================================================================
// Regions
// =============================================================================

/// Region tag for the international edition.
pub const INTERNATIONAL_REGION: &str = "xx";

// =============================================================================
// SNOMED CT
// =============================================================================

/// Fully specified name (900000000000003001).
///
/// Descriptions of this type become the label of a code; every other active
/// description type is kept as a synonym.
pub const FULLY_SPECIFIED_NAME: &str = "900000000000003001";

/// Synonym description type (900000000000013009).
pub const SYNONYM: &str = "900000000000013009";

/// IS_A relationship type (116680003).
pub const IS_A: &str = "116680003";

// =============================================================================
// LOINC
// =============================================================================

/// LOINC status value of a code that is in use.
pub const LOINC_ACTIVE_STATUS: &str = "ACTIVE";

/// Language of the LOINC primary table.
pub const LOINC_PRIMARY_LANGUAGE: &str = "en";
