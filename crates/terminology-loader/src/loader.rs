//! Release file discovery.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use terminology_types::well_known;
use walkdir::WalkDir;

use crate::types::{
    LinguisticVariant, LoincReleaseFiles, ReleaseType, Rf2Error, Rf2Result, SnomedReleaseFiles,
};

static CONCEPT_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sct2_Concept_[\da-zA-Z_\-]+\.txt$").expect("valid regex"));
static DESCRIPTION_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sct2_Description_[\da-zA-Z_\-]+\.txt$").expect("valid regex"));
static RELATIONSHIP_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sct2_Relationship_[\da-zA-Z_\-]+\.txt$").expect("valid regex"));
static REGION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"sct2_Concept_.+_([A-Z]{2,3})").expect("valid regex"));

/// Discovers the SNOMED CT files of one release slice.
///
/// The first directory named `Snapshot` or `Delta` below `path` is searched
/// recursively for the concept, description and relationship tables. The
/// region is inferred from the concept file name.
pub fn discover_snomed_release<P: AsRef<Path>>(
    path: P,
    release_type: ReleaseType,
) -> Rf2Result<SnomedReleaseFiles> {
    let path = path.as_ref();
    ensure_dir(path)?;

    let folder = find_release_folder(path, release_type)?;
    let files = files_below(&folder)?;

    let concept_file = files
        .iter()
        .find(|p| matches_name(p, &CONCEPT_FILE))
        .cloned()
        .ok_or_else(|| missing("concept table", &folder))?;
    let description_files: Vec<PathBuf> = files
        .iter()
        .filter(|p| matches_name(p, &DESCRIPTION_FILE))
        .cloned()
        .collect();
    if description_files.is_empty() {
        return Err(missing("description table", &folder));
    }
    let relationship_file = files
        .iter()
        .find(|p| matches_name(p, &RELATIONSHIP_FILE))
        .cloned()
        .ok_or_else(|| missing("relationship table", &folder))?;

    let concept_name = file_name(&concept_file);
    let region = infer_region(&concept_name)?;
    let release_date = extract_release_date(&concept_name);

    tracing::info!(
        "Found {} release in {} (region {}, release date {})",
        release_type.folder_name(),
        folder.display(),
        region,
        release_date.as_deref().unwrap_or("unknown")
    );

    Ok(SnomedReleaseFiles {
        concept_file,
        description_files,
        relationship_file,
        region,
        release_date,
    })
}

/// Discovers the LOINC table and the supported linguistic variants.
///
/// `LoincTable/Loinc.csv` is required. Variant files that cannot be found
/// are skipped with a warning.
pub fn discover_loinc_release<P: AsRef<Path>>(path: P) -> Rf2Result<LoincReleaseFiles> {
    let path = path.as_ref();
    ensure_dir(path)?;

    let table_file = path.join("LoincTable").join("Loinc.csv");
    if !table_file.is_file() {
        return Err(missing("LoincTable/Loinc.csv", path));
    }

    let variants_dir = path.join("AccessoryFiles").join("LinguisticVariants");
    let candidates = if variants_dir.is_dir() {
        files_below(&variants_dir)?
    } else {
        Vec::new()
    };

    let mut variant_files = Vec::new();
    for variant in LinguisticVariant::supported() {
        match candidates.iter().find(|p| is_variant_file(p, &variant)) {
            Some(found) => variant_files.push((variant, found.clone())),
            None => tracing::warn!(
                "No linguistic variant file for {}_{} in {}",
                variant.language,
                variant.region,
                variants_dir.display()
            ),
        }
    }

    Ok(LoincReleaseFiles {
        table_file,
        variant_files,
    })
}

/// Infers the region tag from a concept file name.
///
/// `sct2_Concept_Snapshot_INT_20210131.txt` yields the international tag.
pub fn infer_region(file_name: &str) -> Rf2Result<String> {
    let region = REGION
        .captures(file_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .ok_or_else(|| Rf2Error::InvalidRegion {
            file_name: file_name.to_string(),
        })?;

    if region == "int" {
        Ok(well_known::INTERNATIONAL_REGION.to_string())
    } else {
        Ok(region)
    }
}

/// Extracts the release date from a release file name.
///
/// Release files have names like `sct2_Concept_Snapshot_INT_20251201.txt`
pub fn extract_release_date(filename: &str) -> Option<String> {
    let without_ext = filename.trim_end_matches(".txt");
    let parts: Vec<&str> = without_ext.split('_').collect();

    if let Some(&last) = parts.last() {
        if last.len() == 8 && last.chars().all(|c| c.is_ascii_digit()) {
            return Some(last.to_string());
        }
    }

    None
}

fn ensure_dir(path: &Path) -> Rf2Result<()> {
    if !path.is_dir() {
        return Err(Rf2Error::DirectoryNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

fn missing(file_type: &str, directory: &Path) -> Rf2Error {
    Rf2Error::RequiredFileMissing {
        file_type: file_type.to_string(),
        directory: directory.display().to_string(),
    }
}

fn find_release_folder(base: &Path, release_type: ReleaseType) -> Rf2Result<PathBuf> {
    let name = release_type.folder_name();
    if base.file_name().map(|n| n == name).unwrap_or(false) {
        return Ok(base.to_path_buf());
    }

    for entry in WalkDir::new(base).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() && entry.file_name() == name {
            return Ok(entry.into_path());
        }
    }

    Err(Rf2Error::DirectoryNotFound {
        path: format!("{} directory not found in {}", name, base.display()),
    })
}

fn files_below(dir: &Path) -> Rf2Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn matches_name(path: &Path, pattern: &Regex) -> bool {
    pattern.is_match(&file_name(path))
}

/// Matches `<lang><REGION><digits>LinguisticVariant.csv`, e.g. `frBE18LinguisticVariant.csv`.
fn is_variant_file(path: &Path, variant: &LinguisticVariant) -> bool {
    let name = file_name(path);
    let prefix = format!("{}{}", variant.language, variant.region.to_uppercase());
    name.strip_prefix(&prefix)
        .and_then(|rest| rest.strip_suffix("LinguisticVariant.csv"))
        .map(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
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
    fn test_extract_release_date() {
        assert_eq!(
            extract_release_date("sct2_Concept_Snapshot_INT_20251201.txt"),
            Some("20251201".to_string())
        );
        assert_eq!(
            extract_release_date("sct2_Description_Snapshot-en_INT_20251201.txt"),
            Some("20251201".to_string())
        );
        assert_eq!(extract_release_date("invalid_filename.txt"), None);
    }

    #[test]
    fn test_infer_region() {
        assert_eq!(infer_region("sct2_Concept_Snapshot_INT_20210131.txt").unwrap(), "xx");
        assert_eq!(
            infer_region("sct2_Concept_Delta_BE1000172_20210315.txt").unwrap(),
            "be"
        );
        assert!(matches!(
            infer_region("sct2_Concept_Snapshot_20210131.txt"),
            Err(Rf2Error::InvalidRegion { .. })
        ));
    }

    #[test]
    fn test_discover_snomed_release() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("SnomedCT_BelgiumExtension");
        let terminology = root.join("Delta").join("Terminology");
        touch(&terminology.join("sct2_Concept_Delta_BE1000172_20210315.txt"));
        touch(&terminology.join("sct2_Description_Delta-en_BE1000172_20210315.txt"));
        touch(&terminology.join("sct2_Description_Delta-fr_BE1000172_20210315.txt"));
        touch(&terminology.join("sct2_Relationship_Delta_BE1000172_20210315.txt"));
        touch(&root.join("Snapshot").join("Terminology").join("sct2_Concept_Snapshot_BE1000172_20210315.txt"));

        let files = discover_snomed_release(dir.path(), ReleaseType::Delta).unwrap();
        assert_eq!(files.region, "be");
        assert_eq!(files.release_date.as_deref(), Some("20210315"));
        assert_eq!(files.description_files.len(), 2);
        assert!(files.concept_file.ends_with("sct2_Concept_Delta_BE1000172_20210315.txt"));
    }

    #[test]
    fn test_missing_relationship_table() {
        let dir = tempfile::tempdir().unwrap();
        let terminology = dir.path().join("Snapshot").join("Terminology");
        touch(&terminology.join("sct2_Concept_Snapshot_INT_20210131.txt"));
        touch(&terminology.join("sct2_Description_Snapshot-en_INT_20210131.txt"));

        let err = discover_snomed_release(dir.path(), ReleaseType::Snapshot).unwrap_err();
        assert!(matches!(err, Rf2Error::RequiredFileMissing { file_type, .. } if file_type == "relationship table"));
    }

    #[test]
    fn test_missing_release_folder() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Snapshot")).unwrap();
        assert!(matches!(
            discover_snomed_release(dir.path(), ReleaseType::Delta),
            Err(Rf2Error::DirectoryNotFound { .. })
        ));
        assert!(matches!(
            discover_snomed_release(dir.path().join("absent"), ReleaseType::Delta),
            Err(Rf2Error::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_discover_loinc_release() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("LoincTable").join("Loinc.csv"));
        let variants = dir.path().join("AccessoryFiles").join("LinguisticVariants");
        touch(&variants.join("frBE18LinguisticVariant.csv"));
        touch(&variants.join("nlNL22LinguisticVariant.csv"));
        touch(&variants.join("deDE15LinguisticVariant.csv"));

        let files = discover_loinc_release(dir.path()).unwrap();
        let found: Vec<_> = files.variant_files.iter().map(|(v, _)| v.clone()).collect();
        assert_eq!(
            found,
            vec![LinguisticVariant::new("fr", "be"), LinguisticVariant::new("nl", "nl")]
        );
    }

    #[test]
    fn test_loinc_table_required() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_loinc_release(dir.path()),
            Err(Rf2Error::RequiredFileMissing { .. })
        ));
    }
}
