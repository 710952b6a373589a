//! Three-pass fold of a SNOMED CT release into code updates.
//!
//! Concepts are read first, then every description table, then the
//! relationship table. Each pass looks up the update of a code and creates a
//! bare one when an earlier pass did not.

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use terminology_types::{CodeKey, CodeUpdate, CodeUpdateMap};

use crate::cancel::CancellationCheck;
use crate::concept::ConceptRow;
use crate::description::DescriptionRow;
use crate::parser::{parse, Rf2Parser};
use crate::relationship::RelationshipRow;
use crate::tokenizer::Tokenize;
use crate::types::{ParseStats, Rf2Result, SnomedReleaseFiles};

/// Folds SNOMED CT release tables into a [`CodeUpdateMap`].
///
/// # Example
///
/// ```
/// use terminology_loader::{MultiLanguageTokenizer, NeverCancelled, SnomedReleaseParser};
///
/// let tokenizer = MultiLanguageTokenizer::new();
/// let mut parser = SnomedReleaseParser::new("xx", &tokenizer, &NeverCancelled);
/// parser
///     .read_concepts("id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n1001\t20210101\t1\t0\t0\n".as_bytes())
///     .unwrap();
///
/// let (codes, stats) = parser.finish();
/// assert_eq!(codes.len(), 1);
/// assert_eq!(stats.codes_created, 1);
/// ```
pub struct SnomedReleaseParser<'a> {
    region: String,
    tokenizer: &'a dyn Tokenize,
    cancel: &'a dyn CancellationCheck,
    codes: CodeUpdateMap,
    stats: ParseStats,
    started: Instant,
}

impl<'a> SnomedReleaseParser<'a> {
    /// Creates a parser tagging every code with `region`.
    pub fn new(
        region: impl Into<String>,
        tokenizer: &'a dyn Tokenize,
        cancel: &'a dyn CancellationCheck,
    ) -> Self {
        Self {
            region: region.into(),
            tokenizer,
            cancel,
            codes: CodeUpdateMap::new(),
            stats: ParseStats::default(),
            started: Instant::now(),
        }
    }

    /// Parses a discovered release: concepts, descriptions, then relationships.
    pub fn parse_files(mut self, files: &SnomedReleaseFiles) -> Rf2Result<(CodeUpdateMap, ParseStats)> {
        self.read_concepts_from(&files.concept_file)?;
        for description_file in &files.description_files {
            self.read_descriptions_from(description_file)?;
        }
        self.read_relationships_from(&files.relationship_file)?;
        Ok(self.finish())
    }

    /// Reads a concept table file.
    pub fn read_concepts_from<P: AsRef<Path>>(&mut self, path: P) -> Rf2Result<()> {
        for row in Rf2Parser::<_, ConceptRow>::from_path(path)? {
            self.cancel.checkpoint()?;
            self.apply_concept(row?);
        }
        Ok(())
    }

    /// Reads a description table file.
    pub fn read_descriptions_from<P: AsRef<Path>>(&mut self, path: P) -> Rf2Result<()> {
        for row in Rf2Parser::<_, DescriptionRow>::from_path(path)? {
            self.cancel.checkpoint()?;
            self.apply_description(row?);
        }
        Ok(())
    }

    /// Reads a relationship table file.
    pub fn read_relationships_from<P: AsRef<Path>>(&mut self, path: P) -> Rf2Result<()> {
        for row in Rf2Parser::<_, RelationshipRow>::from_path(path)? {
            self.cancel.checkpoint()?;
            self.apply_relationship(row?);
        }
        Ok(())
    }

    /// Reads a concept table.
    pub fn read_concepts<R: Read>(&mut self, reader: R) -> Rf2Result<()> {
        for row in Rf2Parser::<_, ConceptRow>::from_reader(reader) {
            self.cancel.checkpoint()?;
            self.apply_concept(row?);
        }
        Ok(())
    }

    /// Reads a description table.
    pub fn read_descriptions<R: Read>(&mut self, reader: R) -> Rf2Result<()> {
        for row in Rf2Parser::<_, DescriptionRow>::from_reader(reader) {
            self.cancel.checkpoint()?;
            self.apply_description(row?);
        }
        Ok(())
    }

    /// Reads a relationship table.
    pub fn read_relationships<R: Read>(&mut self, reader: R) -> Rf2Result<()> {
        for row in Rf2Parser::<_, RelationshipRow>::from_reader(reader) {
            self.cancel.checkpoint()?;
            self.apply_relationship(row?);
        }
        Ok(())
    }

    /// Returns the folded updates and parse statistics.
    pub fn finish(mut self) -> (CodeUpdateMap, ParseStats) {
        self.stats.parse_time_ms = self.started.elapsed().as_millis() as u64;
        (self.codes, self.stats)
    }

    fn apply_concept(&mut self, row: ConceptRow) {
        self.stats.rows_read += 1;
        let update = CodeUpdate::versioned(&row.id, &self.region, row.effective_time, !row.active);
        if self.codes.insert(CodeKey::new(row.id), update).is_none() {
            self.stats.codes_created += 1;
        }
    }

    fn apply_description(&mut self, row: DescriptionRow) {
        self.stats.rows_read += 1;
        if !row.active {
            self.stats.inactive_skipped += 1;
            return;
        }

        let tokens = self.tokenizer.tokenize(&row.language_code, &row.term);
        let is_fsn = row.is_fsn();
        let update = self.entry(&row.concept_id);
        update.add_search_terms(&row.language_code, tokens);

        let term = parse::sanitize(&row.term);
        if is_fsn {
            update.description.insert(row.language_code, term);
        } else {
            update.add_synonym(&row.language_code, term);
        }
    }

    fn apply_relationship(&mut self, row: RelationshipRow) {
        self.stats.rows_read += 1;
        self.entry(&row.source_id)
            .add_relation(&row.type_id, row.destination_id, row.active);
    }

    /// Returns the update of a code, creating a bare one if none exists.
    fn entry(&mut self, code: &str) -> &mut CodeUpdate {
        let key = CodeKey::new(code);
        if !self.codes.contains_key(&key) {
            self.stats.codes_created += 1;
            self.stats.bare_codes += 1;
        }
        self.codes
            .entry(key)
            .or_insert_with(|| CodeUpdate::bare(code, self.region.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::NeverCancelled;
    use crate::tokenizer::{SentenceTokenizer, StopWordTokenizer};
    use crate::types::Rf2Error;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    const CONCEPT_HEADER: &str = "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId";
    const DESCRIPTION_HEADER: &str =
        "id\teffectiveTime\tactive\tmoduleId\tconceptId\tlanguageCode\ttypeId\tterm\tcaseSignificanceId";
    const RELATIONSHIP_HEADER: &str = "id\teffectiveTime\tactive\tmoduleId\tsourceId\tdestinationId\trelationshipGroup\ttypeId\tcharacteristicTypeId\tmodifierId";

    struct PlainTokenizer;

    impl Tokenize for PlainTokenizer {
        fn tokenize(&self, _language: &str, text: &str) -> BTreeSet<String> {
            StopWordTokenizer::default().tokens(text)
        }
    }

    fn table(header: &str, rows: &[&str]) -> String {
        let mut out = header.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    fn get<'m>(codes: &'m CodeUpdateMap, code: &str) -> &'m CodeUpdate {
        &codes[&CodeKey::new(code)]
    }

    #[test]
    fn test_concepts_and_fsn() {
        let concepts = table(
            CONCEPT_HEADER,
            &["1001\t20210101\t1\t0000\t0000", "1002\t20210101\t0\t0000\t0000"],
        );
        let descriptions = table(
            DESCRIPTION_HEADER,
            &["5001\t20210101\t1\t0000\t1002\ten\t900000000000003001\tMyocardial infarction, acute\t0000"],
        );

        let mut parser = SnomedReleaseParser::new("xx", &PlainTokenizer, &NeverCancelled);
        parser.read_concepts(concepts.as_bytes()).unwrap();
        parser.read_descriptions(descriptions.as_bytes()).unwrap();
        let (codes, stats) = parser.finish();

        assert_eq!(codes.len(), 2);
        let active = get(&codes, "1001");
        assert_eq!(active.version.as_deref(), Some("20210101"));
        assert_eq!(active.disabled, Some(false));
        assert!(active.description.is_empty());

        let inactive = get(&codes, "1002");
        assert_eq!(inactive.version.as_deref(), Some("20210101"));
        assert_eq!(inactive.disabled, Some(true));
        assert_eq!(inactive.description["en"], "Myocardial infarction\\, acute");
        assert!(inactive.search_terms["en"].contains("infarction"));
        assert_eq!(stats.rows_read, 3);
        assert_eq!(stats.bare_codes, 0);
    }

    #[test]
    fn test_synonyms_and_inactive_descriptions() {
        let descriptions = table(
            DESCRIPTION_HEADER,
            &[
                "1\t20210101\t1\t0\t2001\ten\t900000000000013009\tHeart attack\t0",
                "2\t20210101\t1\t0\t2001\ten\t900000000000013009\tMI\t0",
                "3\t20210101\t0\t0\t2001\ten\t900000000000013009\tCardiac infarction\t0",
                "4\t20210101\t1\t0\t2001\tfr\t900000000000013009\tInfarctus\t0",
            ],
        );

        let mut parser = SnomedReleaseParser::new("be", &PlainTokenizer, &NeverCancelled);
        parser.read_descriptions(descriptions.as_bytes()).unwrap();
        let (codes, stats) = parser.finish();

        let update = get(&codes, "2001");
        assert!(update.is_bare());
        assert!(update.regions.contains("be"));
        assert_eq!(update.synonyms["en"], vec!["Heart attack", "MI"]);
        assert_eq!(update.synonyms["fr"], vec!["Infarctus"]);
        assert!(!update.search_terms["en"].contains("cardiac"));
        assert_eq!(stats.inactive_skipped, 1);
        assert_eq!(stats.bare_codes, 1);
    }

    #[test]
    fn test_relationships() {
        let concepts = table(CONCEPT_HEADER, &["3001\t20210101\t1\t0\t0"]);
        let relationships = table(
            RELATIONSHIP_HEADER,
            &[
                "1\t20210101\t1\t0\t3001\tA\t0\t116680003\t0\t0",
                "2\t20210101\t0\t0\t3001\tB\t0\t116680003\t0\t0",
                "3\t20210101\t1\t0\t3002\tC\t0\t363698007\t0\t0",
            ],
        );

        let mut parser = SnomedReleaseParser::new("xx", &PlainTokenizer, &NeverCancelled);
        parser.read_concepts(concepts.as_bytes()).unwrap();
        parser.read_relationships(relationships.as_bytes()).unwrap();
        let (codes, _) = parser.finish();

        let source = get(&codes, "3001");
        assert_eq!(source.relations_add["116680003"], vec!["A"]);
        assert_eq!(source.relations_remove["116680003"], vec!["B"]);

        let bare = get(&codes, "3002");
        assert!(bare.is_bare());
        assert_eq!(bare.relations_add["363698007"], vec!["C"]);
    }

    #[test]
    fn test_ordering_is_case_insensitive() {
        let concepts = table(
            CONCEPT_HEADER,
            &["b2\t1\t1\t0\t0", "A1\t1\t1\t0\t0", "a3\t1\t1\t0\t0"],
        );
        let mut parser = SnomedReleaseParser::new("xx", &PlainTokenizer, &NeverCancelled);
        parser.read_concepts(concepts.as_bytes()).unwrap();
        let (codes, _) = parser.finish();

        let order: Vec<&str> = codes.keys().map(CodeKey::as_str).collect();
        assert_eq!(order, vec!["A1", "a3", "b2"]);
    }

    #[test]
    fn test_malformed_row_is_fatal() {
        let concepts = table(CONCEPT_HEADER, &["1001\t20210101\t1\t0000"]);
        let mut parser = SnomedReleaseParser::new("xx", &PlainTokenizer, &NeverCancelled);
        let err = parser.read_concepts(concepts.as_bytes()).unwrap_err();
        assert!(matches!(err, Rf2Error::ColumnCount { line: 2, .. }));
    }

    #[test]
    fn test_cancellation_aborts() {
        let canceled = AtomicBool::new(false);
        let concepts = table(CONCEPT_HEADER, &["1001\t20210101\t1\t0\t0"]);

        let mut parser = SnomedReleaseParser::new("xx", &PlainTokenizer, &canceled);
        parser.read_concepts(concepts.as_bytes()).unwrap();
        canceled.store(true, Ordering::Relaxed);
        let err = parser.read_concepts(concepts.as_bytes()).unwrap_err();
        assert!(matches!(err, Rf2Error::Cancelled));
    }

    #[test]
    fn test_parse_files() {
        let dir = tempfile::tempdir().unwrap();
        let concept_file = dir.path().join("concepts.txt");
        let description_file = dir.path().join("descriptions.txt");
        let relationship_file = dir.path().join("relationships.txt");
        std::fs::write(&concept_file, table(CONCEPT_HEADER, &["1001\t20210101\t1\t0\t0"])).unwrap();
        std::fs::write(
            &description_file,
            table(
                DESCRIPTION_HEADER,
                &["1\t20210101\t1\t0\t1001\ten\t900000000000003001\tChest pain\t0"],
            ),
        )
        .unwrap();
        std::fs::write(&relationship_file, RELATIONSHIP_HEADER).unwrap();

        let files = SnomedReleaseFiles {
            concept_file,
            description_files: vec![description_file],
            relationship_file,
            region: "xx".to_string(),
            release_date: None,
        };

        let parser = SnomedReleaseParser::new("xx", &PlainTokenizer, &NeverCancelled);
        let (codes, stats) = parser.parse_files(&files).unwrap();
        assert_eq!(get(&codes, "1001").description["en"], "Chest pain");
        assert_eq!(stats.rows_read, 2);
    }
}
