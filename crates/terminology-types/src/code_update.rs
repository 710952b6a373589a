//! Pending change to one terminology concept.
//!
//! A [`CodeUpdate`] is created the first time any release row mentions a code
//! and is then mutated in place while later rows (descriptions, relationships,
//! regional variants) are folded in.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Ordered map of code identifier to pending update.
///
/// Keys compare case-insensitively, so iteration order is the order used to
/// build range queries against the code store.
pub type CodeUpdateMap = BTreeMap<CodeKey, CodeUpdate>;

/// A code identifier that orders and compares case-insensitively.
///
/// # Examples
///
/// ```
/// use terminology_types::CodeKey;
///
/// assert_eq!(CodeKey::new("LP1234-5"), CodeKey::new("lp1234-5"));
/// assert!(CodeKey::new("a") < CodeKey::new("B"));
/// ```
#[derive(Debug, Clone)]
pub struct CodeKey(String);

impl CodeKey {
    /// Creates a key from a code identifier.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the identifier as it was first seen.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares two identifiers the way keys are ordered.
    pub fn compare(a: &str, b: &str) -> Ordering {
        a.chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase))
    }
}

impl PartialEq for CodeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CodeKey {}

impl PartialOrd for CodeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CodeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        Self::compare(&self.0, &other.0)
    }
}

impl fmt::Display for CodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CodeKey {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Pending change to one terminology concept.
///
/// # Examples
///
/// ```
/// use terminology_types::CodeUpdate;
///
/// let mut update = CodeUpdate::versioned("1002", "xx", "20210101", true);
/// update.add_synonym("en", "Heart attack");
/// update.add_relation("116680003", "22298006", true);
///
/// assert_eq!(update.disabled, Some(true));
/// assert!(!update.is_bare());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CodeUpdate {
    /// Identifier, stable across versions.
    pub code: String,
    /// Region tags this code belongs to.
    pub regions: BTreeSet<String>,
    /// Version stamp; `None` amends whichever version the store holds.
    pub version: Option<String>,
    /// Disabled flag; `None` leaves the stored flag unchanged.
    pub disabled: Option<bool>,
    /// Fully specified / preferred name per language.
    pub description: BTreeMap<String, String>,
    /// Alternate names per language, in release order.
    pub synonyms: BTreeMap<String, Vec<String>>,
    /// Relation targets to add, per relation type.
    pub relations_add: BTreeMap<String, Vec<String>>,
    /// Relation targets to remove, per relation type.
    pub relations_remove: BTreeMap<String, Vec<String>>,
    /// Normalized search tokens per language.
    pub search_terms: BTreeMap<String, BTreeSet<String>>,
}

impl CodeUpdate {
    /// Creates an update carrying only the code and its region.
    ///
    /// Bare updates model rows that reference a code absent from the concept
    /// slice of a delta release.
    pub fn bare(code: impl Into<String>, region: impl Into<String>) -> Self {
        let mut regions = BTreeSet::new();
        regions.insert(region.into());
        Self {
            code: code.into(),
            regions,
            ..Default::default()
        }
    }

    /// Creates an update seeded with a version and a disabled flag.
    pub fn versioned(
        code: impl Into<String>,
        region: impl Into<String>,
        version: impl Into<String>,
        disabled: bool,
    ) -> Self {
        Self {
            version: Some(version.into()),
            disabled: Some(disabled),
            ..Self::bare(code, region)
        }
    }

    /// Returns true if this update carries no version.
    pub fn is_bare(&self) -> bool {
        self.version.is_none()
    }

    /// Appends a synonym for the given language.
    pub fn add_synonym(&mut self, language: &str, term: impl Into<String>) {
        self.synonyms
            .entry(language.to_string())
            .or_default()
            .push(term.into());
    }

    /// Unions tokens into the search terms of the given language.
    pub fn add_search_terms<I>(&mut self, language: &str, tokens: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.search_terms
            .entry(language.to_string())
            .or_default()
            .extend(tokens);
    }

    /// Records a relation target as added (`active`) or removed.
    pub fn add_relation(&mut self, type_id: &str, destination: impl Into<String>, active: bool) {
        let relations = if active {
            &mut self.relations_add
        } else {
            &mut self.relations_remove
        };
        relations
            .entry(type_id.to_string())
            .or_default()
            .push(destination.into());
    }
}
