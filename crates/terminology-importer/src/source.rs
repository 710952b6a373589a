//! Release acquisition.
//!
//! A [`ReleaseSource`] hands the import tasks the files of a release. The
//! DOWNLOADING phase of a job is the call to its source.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use terminology_loader::{
    discover_loinc_release, discover_snomed_release, LoincReleaseFiles, ReleaseType,
    SnomedReleaseFiles,
};

use crate::error::{ImportError, ImportResult};

/// A SNOMED CT edition the importer knows how to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnomedEdition {
    /// International edition.
    International,
    /// Belgian national extension.
    Belgium,
}

impl SnomedEdition {
    /// Parses `int` or `be`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "int" => Some(Self::International),
            "be" => Some(Self::Belgium),
            _ => None,
        }
    }

    /// Short name, also the release folder name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::International => "int",
            Self::Belgium => "be",
        }
    }

    /// Release center code of the edition.
    pub fn release_code(self) -> u32 {
        match self {
            Self::International => 167,
            Self::Belgium => 190440,
        }
    }
}

impl fmt::Display for SnomedEdition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supplies release files to import tasks.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Returns the files of a SNOMED CT release slice.
    async fn snomed_release(
        &self,
        edition: SnomedEdition,
        release_type: ReleaseType,
    ) -> ImportResult<SnomedReleaseFiles>;

    /// Returns the files of the LOINC release.
    async fn loinc_release(&self) -> ImportResult<LoincReleaseFiles>;
}

/// Reads releases already unpacked below a base folder.
///
/// SNOMED CT releases live in `snomed/<edition>/` and the LOINC release in
/// `loinc/`.
#[derive(Debug, Clone)]
pub struct LocalReleaseSource {
    base_folder: PathBuf,
}

impl LocalReleaseSource {
    /// Creates a source rooted at `base_folder`.
    pub fn new(base_folder: impl Into<PathBuf>) -> Self {
        Self {
            base_folder: base_folder.into(),
        }
    }

    /// The base folder.
    pub fn base_folder(&self) -> &Path {
        &self.base_folder
    }

    fn release_dir(&self, parts: &[&str]) -> ImportResult<PathBuf> {
        let dir = parts.iter().fold(self.base_folder.clone(), |dir, part| dir.join(part));
        if !dir.is_dir() {
            return Err(ImportError::Release(format!(
                "No release found in {}",
                dir.display()
            )));
        }
        Ok(dir)
    }
}

#[async_trait]
impl ReleaseSource for LocalReleaseSource {
    async fn snomed_release(
        &self,
        edition: SnomedEdition,
        release_type: ReleaseType,
    ) -> ImportResult<SnomedReleaseFiles> {
        let dir = self.release_dir(&["snomed", edition.as_str()])?;
        tracing::info!("Looking up {} SNOMED CT release in {}", edition, dir.display());
        let files = tokio::task::spawn_blocking(move || discover_snomed_release(dir, release_type)).await??;
        Ok(files)
    }

    async fn loinc_release(&self) -> ImportResult<LoincReleaseFiles> {
        let dir = self.release_dir(&["loinc"])?;
        tracing::info!("Looking up LOINC release in {}", dir.display());
        let files = tokio::task::spawn_blocking(move || discover_loinc_release(dir)).await??;
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_edition() {
        assert_eq!(SnomedEdition::parse("int"), Some(SnomedEdition::International));
        assert_eq!(SnomedEdition::parse("be"), Some(SnomedEdition::Belgium));
        assert_eq!(SnomedEdition::parse("fr"), None);
        assert_eq!(SnomedEdition::International.release_code(), 167);
        assert_eq!(SnomedEdition::Belgium.release_code(), 190440);
    }

    #[tokio::test]
    async fn test_local_snomed_release() {
        let dir = tempfile::tempdir().unwrap();
        let terminology = dir.path().join("snomed/int/Snapshot/Terminology");
        touch(&terminology.join("sct2_Concept_Snapshot_INT_20210131.txt"));
        touch(&terminology.join("sct2_Description_Snapshot-en_INT_20210131.txt"));
        touch(&terminology.join("sct2_Relationship_Snapshot_INT_20210131.txt"));

        let source = LocalReleaseSource::new(dir.path());
        let files = source
            .snomed_release(SnomedEdition::International, ReleaseType::Snapshot)
            .await
            .unwrap();
        assert_eq!(files.region, "xx");

        let missing = source
            .snomed_release(SnomedEdition::Belgium, ReleaseType::Snapshot)
            .await
            .unwrap_err();
        assert!(matches!(missing, ImportError::Release(_)));
    }

    #[tokio::test]
    async fn test_local_loinc_release_requires_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("loinc")).unwrap();

        let source = LocalReleaseSource::new(dir.path());
        let err = source.loinc_release().await.unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
    }
}
